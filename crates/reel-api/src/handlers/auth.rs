//! Access-key handlers.

use axum::extract::State;
use axum::Json;
use reel_pipeline::AuthStatus;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn auth_status(State(state): State<AppState>) -> Json<AuthStatus> {
    Json(state.orchestrator.auth_status().await)
}

/// Open the host's key-selection flow.
pub async fn select_key(State(state): State<AppState>) -> ApiResult<Json<AuthStatus>> {
    let status = state.orchestrator.select_key().await?;
    Ok(Json(status))
}
