//! Error responses
//!
//! Every failure becomes a JSON body with an `error` field. Consistency failures also carry
//! the snapshots that disagreed.

use crate::error::PasselError;
use crate::wire::{ConsistencyEnvelope, ErrorEnvelope};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

impl PasselError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PasselError::NoApplicationUris
            | PasselError::EmptyPassel
            | PasselError::NoMatchingPossum => StatusCode::GONE,
            PasselError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PasselError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %message, "Request failed");
        } else {
            debug!(status = %status, error = %message, "Request refused");
        }

        match self {
            PasselError::Inconsistent { passel_states, .. } => (
                status,
                Json(ConsistencyEnvelope {
                    consistent: false,
                    error: Some(message),
                    passel_states: Some(passel_states),
                }),
            )
                .into_response(),
            PasselError::Unauthorized => (
                status,
                [(WWW_AUTHENTICATE, r#"Basic realm="possum""#)],
                Json(ErrorEnvelope { error: message }),
            )
                .into_response(),
            _ => (status, Json(ErrorEnvelope { error: message })).into_response(),
        }
    }
}
