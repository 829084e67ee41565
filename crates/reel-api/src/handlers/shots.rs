//! Per-shot handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reel_models::{SceneId, Shot, ShotId};
use reel_pipeline::{CancelToken, ShotAdjacency, ShotEdit};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{spawn_action, AcceptedResponse};
use crate::state::AppState;

fn ids((scene_id, shot_id): (String, String)) -> (SceneId, ShotId) {
    (SceneId::from_string(scene_id), ShotId::from_string(shot_id))
}

/// Edit a shot's prompts, duration or end-frame flag.
pub async fn update_shot(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
    Json(edit): Json<ShotEdit>,
) -> ApiResult<Json<Shot>> {
    let (scene_id, shot_id) = ids(path);
    let shot = state
        .orchestrator
        .update_shot(&scene_id, &shot_id, edit)
        .await?;
    Ok(Json(shot))
}

/// Previous and next shots in playback order.
pub async fn adjacency(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> ApiResult<Json<ShotAdjacency>> {
    let (scene_id, shot_id) = ids(path);
    let adjacency = state.orchestrator.adjacency(&scene_id, &shot_id).await?;
    Ok(Json(adjacency))
}

/// Start generating a shot's still frame.
pub async fn generate_image(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<AcceptedResponse>)> {
    let (scene_id, shot_id) = ids(path);
    let store = state.orchestrator.store();
    if store.analysis().await.is_none() {
        return Err(ApiError::conflict("audio analysis is required first"));
    }
    store.shot(&scene_id, &shot_id).await?;

    let orchestrator = state.orchestrator.clone();
    Ok(spawn_action("shot_image", async move {
        orchestrator.generate_shot_image(&scene_id, &shot_id).await
    }))
}

/// Start generating a shot's video. The shot needs a finished image.
pub async fn generate_video(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<AcceptedResponse>)> {
    let (scene_id, shot_id) = ids(path);
    state
        .orchestrator
        .check_video_ready(&scene_id, &shot_id)
        .await?;

    let orchestrator = state.orchestrator.clone();
    Ok(spawn_action("shot_video", async move {
        orchestrator
            .generate_shot_video(&scene_id, &shot_id, CancelToken::new())
            .await
    }))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Stop polling an in-flight video.
pub async fn cancel_video(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> ApiResult<Json<CancelResponse>> {
    let (scene_id, shot_id) = ids(path);
    state.orchestrator.store().shot(&scene_id, &shot_id).await?;
    let cancelled = state.orchestrator.cancel_video(&shot_id).await;
    Ok(Json(CancelResponse { cancelled }))
}
