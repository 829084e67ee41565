//! Project-level handlers: analysis, hero look, visual identity and planning.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reel_genai::InlineData;
use reel_models::{PipelineStage, Project, VideoMode, VisualIdentity};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{spawn_action, AcceptedResponse};
use crate::state::AppState;

type Accepted = (StatusCode, Json<AcceptedResponse>);

/// Get the current project snapshot.
pub async fn get_project(State(state): State<AppState>) -> Json<Project> {
    Json(state.orchestrator.store().snapshot().await)
}

/// Discard the project and cancel in-flight video polling.
pub async fn delete_project(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.reset().await;
    info!("Project discarded");
    StatusCode::NO_CONTENT
}

pub async fn dismiss_error(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.dismiss_error().await;
    StatusCode::NO_CONTENT
}

// =========================================================================
// Analysis
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub audio_base64: String,
    pub mime_type: String,
}

/// Upload a track and start analysis.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Accepted> {
    let mime_type = request.mime_type.trim().to_lowercase();
    if !mime_type.starts_with("audio/") {
        return Err(ApiError::bad_request(format!(
            "expected an audio file, got {}",
            request.mime_type
        )));
    }
    let audio = InlineData::from_base64(mime_type, request.audio_base64.trim())
        .map_err(|e| ApiError::bad_request(format!("audio_base64: {}", e)))?;
    if audio.data.is_empty() {
        return Err(ApiError::bad_request("audio file is empty"));
    }

    let orchestrator = state.orchestrator.clone();
    orchestrator.store().set_stage(PipelineStage::Analyzing).await;
    Ok(spawn_action("analysis", async move {
        orchestrator.analyze_audio(audio).await
    }))
}

// =========================================================================
// Hero look
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HeroOptionsRequest {
    pub count: Option<usize>,
}

/// Generate hero image options.
pub async fn hero_options(
    State(state): State<AppState>,
    request: Option<Json<HeroOptionsRequest>>,
) -> ApiResult<Accepted> {
    require_analysis(&state).await?;
    let count = request.and_then(|Json(r)| r.count);
    if count == Some(0) {
        return Err(ApiError::bad_request("count must be at least 1"));
    }

    let orchestrator = state.orchestrator.clone();
    Ok(spawn_action("hero_options", async move {
        orchestrator.generate_hero_options(count).await
    }))
}

#[derive(Debug, Deserialize)]
pub struct SelectHeroRequest {
    pub index: usize,
}

pub async fn select_hero(
    State(state): State<AppState>,
    Json(request): Json<SelectHeroRequest>,
) -> ApiResult<Json<VisualIdentity>> {
    let identity = state.orchestrator.select_hero(request.index).await?;
    Ok(Json(identity))
}

#[derive(Debug, Deserialize)]
pub struct SetHeroRequest {
    pub image_data_url: String,
}

/// Use an uploaded image as the hero.
pub async fn set_hero(
    State(state): State<AppState>,
    Json(request): Json<SetHeroRequest>,
) -> ApiResult<Json<VisualIdentity>> {
    let identity = state
        .orchestrator
        .set_hero_image(&request.image_data_url)
        .await?;
    Ok(Json(identity))
}

#[derive(Debug, Default, Deserialize)]
pub struct VisualIdentityUpdate {
    pub video_mode: Option<String>,
    pub style_description: Option<String>,
}

/// Update the video mode and/or style description.
pub async fn update_visual_identity(
    State(state): State<AppState>,
    Json(update): Json<VisualIdentityUpdate>,
) -> ApiResult<Json<VisualIdentity>> {
    let mut identity = require_analysis(&state).await?.visual_identity;

    if let Some(mode) = update.video_mode.as_deref() {
        let mode = parse_video_mode(mode)?;
        identity = state.orchestrator.set_video_mode(mode).await?;
    }
    if let Some(text) = update.style_description.as_deref() {
        identity = state.orchestrator.set_style_description(text).await?;
    }

    Ok(Json(identity))
}

fn parse_video_mode(value: &str) -> ApiResult<VideoMode> {
    match value.trim().to_lowercase().as_str() {
        "montage" | "cinematic" => Ok(VideoMode::parse(value)),
        other => Err(ApiError::bad_request(format!("unknown video mode: {}", other))),
    }
}

// =========================================================================
// Planning
// =========================================================================

/// Plan scenes and shots. Replaces any existing storyboard.
pub async fn generate_plan(State(state): State<AppState>) -> ApiResult<Accepted> {
    require_analysis(&state).await?;

    let orchestrator = state.orchestrator.clone();
    orchestrator.store().set_stage(PipelineStage::Planning).await;
    Ok(spawn_action("plan", async move {
        orchestrator.generate_plan().await
    }))
}

async fn require_analysis(state: &AppState) -> ApiResult<reel_models::ProjectAnalysis> {
    state
        .orchestrator
        .store()
        .analysis()
        .await
        .ok_or_else(|| ApiError::conflict("audio analysis is required first"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_mode() {
        assert_eq!(parse_video_mode("Cinematic").unwrap(), VideoMode::Cinematic);
        assert_eq!(parse_video_mode(" montage ").unwrap(), VideoMode::Montage);
        assert!(parse_video_mode("slideshow").is_err());
    }
}
