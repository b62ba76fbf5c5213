use super::auth::authorize;
use super::AppState;
use crate::error::PasselError;
use crate::types::PasselState;
use crate::wire::{ConsistencyEnvelope, PossumStatesEnvelope, SetPasselStateRequest, StateResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, PasselError> {
    serde_json::from_slice(body)
        .map_err(|e| PasselError::Validation(format!("Invalid request body: {}", e)))
}

fn consistent(passel_states: Vec<PasselState>) -> ConsistencyEnvelope {
    ConsistencyEnvelope {
        consistent: true,
        error: None,
        passel_states: Some(passel_states),
    }
}

pub async fn get_state(State(state): State<AppState>) -> Result<Json<StateResponse>, PasselError> {
    let ctx = state.directory.context()?;
    let possum_state = state.coordinator.get_state(&ctx)?;
    Ok(Json(StateResponse {
        state: possum_state,
    }))
}

pub async fn get_passel_state(
    State(state): State<AppState>,
) -> Result<Json<PossumStatesEnvelope>, PasselError> {
    let ctx = state.directory.context()?;
    let possum_states = state.coordinator.get_passel_state(&ctx)?;
    Ok(Json(PossumStatesEnvelope::states(possum_states)))
}

pub async fn get_passel_state_consistency(
    State(state): State<AppState>,
) -> Result<Json<ConsistencyEnvelope>, PasselError> {
    let ctx = state.directory.context()?;
    let report = state.coordinator.get_passel_state_consistency(&ctx).await?;
    Ok(Json(consistent(report.passel_states)))
}

pub async fn set_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PossumStatesEnvelope>), PasselError> {
    authorize(&headers, &state.directory.credentials()?)?;
    let ctx = state.directory.context()?;
    state.coordinator.resolve_identity(&ctx)?;
    let desired: PasselState = parse_body(&body)?;
    debug!(changes = desired.len(), "Received state change");

    let possum_states = state.coordinator.set_state(&ctx, &desired).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(PossumStatesEnvelope::states(possum_states)),
    ))
}

pub async fn set_passel_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ConsistencyEnvelope>), PasselError> {
    let credentials = state.directory.credentials()?;
    authorize(&headers, &credentials)?;
    let ctx = state.directory.context()?;
    state.coordinator.resolve_passel(&ctx)?;
    let request: SetPasselStateRequest = parse_body(&body)?;
    debug!(
        changes = request.possum_states.len(),
        force = request.force,
        "Received passel state change"
    );

    let report = state
        .coordinator
        .set_passel_state(&ctx, &request.possum_states, request.force, &credentials)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(consistent(report.passel_states))))
}
