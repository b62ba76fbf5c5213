//! HTTP Basic authentication for the write endpoints

use crate::directory::Credentials;
use crate::error::PasselError;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

/// Username and password carried by a `Basic` Authorization header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

pub fn authorize(headers: &HeaderMap, expected: &Credentials) -> Result<(), PasselError> {
    match basic_credentials(headers) {
        Some((username, password)) if expected.matches(&username, &password) => Ok(()),
        Some((username, _)) => {
            warn!(username = %username, "Rejected credentials");
            Err(PasselError::Unauthorized)
        }
        None => {
            warn!("Missing or malformed Authorization header");
            Err(PasselError::Unauthorized)
        }
    }
}
