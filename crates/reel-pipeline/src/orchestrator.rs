//! Generation orchestrator.
//!
//! Assembles requests for the generative service from the current project
//! snapshot, dispatches them, and commits results back into the store.
//! Per-shot failures become shot state plus a dismissible project error;
//! they are returned as [`GenerationOutcome::Failed`], not as `Err`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use reel_genai::{
    GenAiError, GenerativeClient, ImageRequest, InlineData, KeySelector, OperationStatus,
    StructuredRequest, VideoRequest,
};
use reel_models::{
    AnalysisResponse, AudioTrack, GenerationStage, PipelineStage, PlanResponse, ProjectAnalysis,
    SceneId, Shot, ShotId, Timeline, VideoMode, VisualIdentity,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use crate::config::PipelineConfig;
use crate::continuity::ContinuityResolver;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::ShotLogger;
use crate::media::MediaStore;
use crate::metrics;
use crate::planner::build_timeline;
use crate::poll::{poll_until_complete, CancelToken, PollState};
use crate::prompts;
use crate::store::{CommitOutcome, ProjectStore, RequestToken};

/// Upper bound on hero options per request.
pub const MAX_HERO_OPTIONS: usize = 8;

const CREDENTIAL_MESSAGE: &str =
    "The selected API key was rejected or is no longer valid. Select a key and try again.";

/// Result of one shot generation as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// Committed as the shot's media.
    Succeeded { url: String },
    /// Committed as a shot error.
    Failed { message: String },
    /// A newer request or a new plan replaced this one; nothing was written.
    Discarded,
}

/// User edits to a shot. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShotEdit {
    pub visual_prompt: Option<String>,
    pub motion_prompt: Option<String>,
    pub duration: Option<f64>,
    pub use_next_as_end_frame: Option<bool>,
}

/// Owned neighbours of a shot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShotAdjacency {
    pub previous: Option<Shot>,
    pub next: Option<Shot>,
}

/// Credential state reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub has_selected_key: bool,
    pub auth_required: bool,
}

pub struct Orchestrator {
    client: Arc<dyn GenerativeClient>,
    keys: Arc<dyn KeySelector>,
    store: Arc<ProjectStore>,
    config: PipelineConfig,
    resolver: ContinuityResolver,
    media: MediaStore,
    /// Cancellation of in-flight video polling, keyed by shot
    video_jobs: Mutex<HashMap<ShotId, (u64, CancelToken)>>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn GenerativeClient>,
        keys: Arc<dyn KeySelector>,
        store: Arc<ProjectStore>,
        config: PipelineConfig,
    ) -> Self {
        let resolver = ContinuityResolver::new(config.empty_scene_policy);
        let media = MediaStore::new(config.media_dir.clone(), config.media_url_prefix.clone());
        Self {
            client,
            keys,
            store,
            config,
            resolver,
            media,
            video_jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn require_analysis(&self) -> PipelineResult<ProjectAnalysis> {
        self.store
            .analysis()
            .await
            .ok_or_else(|| PipelineError::precondition("audio analysis is required first"))
    }

    // =========================================================================
    // Project-level stages
    // =========================================================================

    /// Analyze an uploaded track. Starts a fresh project.
    pub async fn analyze_audio(&self, audio: InlineData) -> PipelineResult<ProjectAnalysis> {
        self.store
            .begin_analysis(AudioTrack {
                mime_type: audio.mime_type.clone(),
                data: audio.data.clone(),
            })
            .await;
        info!(mime_type = %audio.mime_type, size = audio.data.len(), "Analyzing audio");

        let request = StructuredRequest {
            prompt: prompts::analysis_prompt(),
            attachments: vec![audio],
            schema: prompts::analysis_schema(),
        };
        let result = async {
            let value = self.client.generate_structured(request).await?;
            let response: AnalysisResponse = serde_json::from_value(value).map_err(|e| {
                PipelineError::invalid_response(format!("malformed analysis: {}", e))
            })?;
            Ok::<_, PipelineError>(response.into_analysis(self.config.default_video_mode))
        }
        .await;

        metrics::record_structured_request("analysis", result.is_ok());
        match result {
            Ok(analysis) => {
                info!(title = %analysis.title, segments = analysis.segments.len(), "Analysis complete");
                self.store.set_analysis(analysis.clone()).await;
                self.store.set_stage(PipelineStage::HeroSelection).await;
                Ok(analysis)
            }
            Err(e) => {
                warn!("Audio analysis failed: {}", e);
                self.store.set_error(format!("Audio analysis failed: {}", e)).await;
                self.store.set_stage(PipelineStage::Upload).await;
                Err(e)
            }
        }
    }

    /// Generate hero image options concurrently.
    ///
    /// Succeeds when at least one option was produced.
    pub async fn generate_hero_options(&self, count: Option<usize>) -> PipelineResult<Vec<String>> {
        let analysis = self.require_analysis().await?;
        let count = count
            .unwrap_or(self.config.hero_option_count)
            .clamp(1, MAX_HERO_OPTIONS);
        info!(count, "Generating hero options");

        let requests = (0..count).map(|variant| {
            self.client.generate_image(ImageRequest {
                prompt: prompts::hero_prompt(&analysis, variant),
                references: vec![],
                aspect_ratio: self.config.aspect_ratio.clone(),
            })
        });
        let results = join_all(requests).await;

        let mut candidates = Vec::with_capacity(count);
        let mut last_error = None;
        for result in results {
            match result {
                Ok(image) => candidates.push(image.to_data_url()),
                Err(e) => {
                    warn!("Hero option failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if candidates.is_empty() {
            let err = last_error
                .map(PipelineError::from)
                .unwrap_or_else(|| PipelineError::invalid_response("no hero options returned"));
            self.store
                .set_error(format!("Hero image generation failed: {}", err))
                .await;
            return Err(err);
        }

        info!(produced = candidates.len(), requested = count, "Hero options ready");
        self.store.set_hero_candidates(candidates.clone()).await;
        Ok(candidates)
    }

    /// Adopt one of the generated hero options.
    pub async fn select_hero(&self, index: usize) -> PipelineResult<VisualIdentity> {
        let candidate = self
            .store
            .read(|p| p.hero_candidates.get(index).cloned())
            .await
            .ok_or_else(|| PipelineError::invalid_input(format!("no hero option at index {}", index)))?;
        self.store
            .update_visual_identity(|identity| identity.hero_image = Some(candidate))
            .await
    }

    /// Use a user-supplied image as the hero.
    pub async fn set_hero_image(&self, data_url: &str) -> PipelineResult<VisualIdentity> {
        let image = InlineData::from_data_url(data_url)
            .map_err(|e| PipelineError::invalid_input(e.to_string()))?;
        if !image.mime_type.starts_with("image/") {
            return Err(PipelineError::invalid_input(format!(
                "hero must be an image, got {}",
                image.mime_type
            )));
        }
        let data_url = image.to_data_url();
        self.store
            .update_visual_identity(|identity| identity.hero_image = Some(data_url))
            .await
    }

    pub async fn set_video_mode(&self, mode: VideoMode) -> PipelineResult<VisualIdentity> {
        self.store
            .update_visual_identity(|identity| identity.video_mode = mode)
            .await
    }

    pub async fn set_style_description(&self, text: &str) -> PipelineResult<VisualIdentity> {
        let text = text.trim().to_string();
        self.store
            .update_visual_identity(|identity| identity.style_description = text)
            .await
    }

    /// Generate the scene/shot plan. Replaces any existing timeline.
    pub async fn generate_plan(&self) -> PipelineResult<Timeline> {
        let analysis = self.require_analysis().await?;
        self.store.set_stage(PipelineStage::Planning).await;

        let attachments = self
            .store
            .audio()
            .await
            .map(|a| InlineData::new(a.mime_type, a.data))
            .into_iter()
            .collect();
        let request = StructuredRequest {
            prompt: prompts::plan_prompt(&analysis),
            attachments,
            schema: prompts::plan_schema(),
        };

        let result = async {
            let value = self.client.generate_structured(request).await?;
            let plan: PlanResponse = serde_json::from_value(value)
                .map_err(|e| PipelineError::invalid_response(format!("malformed plan: {}", e)))?;
            build_timeline(
                plan,
                analysis.visual_identity.video_mode,
                self.config.default_shot_duration,
            )
        }
        .await;

        metrics::record_structured_request("plan", result.is_ok());
        match result {
            Ok(timeline) => {
                info!(
                    scenes = timeline.scenes.len(),
                    shots = timeline.shot_count(),
                    "Storyboard planned"
                );
                self.cancel_all_videos().await;
                self.store.replace_scenes(timeline.clone()).await;
                self.store.set_stage(PipelineStage::Storyboard).await;
                Ok(timeline)
            }
            Err(e) => {
                warn!("Storyboard planning failed: {}", e);
                self.store
                    .set_error(format!("Storyboard planning failed: {}", e))
                    .await;
                self.store.set_stage(PipelineStage::HeroSelection).await;
                Err(e)
            }
        }
    }

    /// Apply user edits to a shot.
    pub async fn update_shot(
        &self,
        scene_id: &SceneId,
        shot_id: &ShotId,
        edit: ShotEdit,
    ) -> PipelineResult<Shot> {
        if let Some(duration) = edit.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(PipelineError::invalid_input("duration must be a positive number"));
            }
        }
        self.store
            .update_shot(scene_id, shot_id, |shot| {
                if let Some(visual) = edit.visual_prompt {
                    shot.visual_prompt = visual;
                }
                if let Some(motion) = edit.motion_prompt {
                    shot.motion_prompt = motion;
                }
                if let Some(duration) = edit.duration {
                    shot.duration = duration;
                }
                if let Some(flag) = edit.use_next_as_end_frame {
                    shot.use_next_as_end_frame = flag;
                }
            })
            .await
    }

    /// Neighbours of a shot in the current timeline.
    pub async fn adjacency(&self, scene_id: &SceneId, shot_id: &ShotId) -> PipelineResult<ShotAdjacency> {
        self.store
            .read(|project| {
                let position = project
                    .timeline
                    .locate(scene_id, shot_id)
                    .ok_or_else(|| shot_not_found(scene_id, shot_id))?;
                let adjacency = self.resolver.resolve(&project.timeline, position);
                Ok(ShotAdjacency {
                    previous: adjacency.previous.cloned(),
                    next: adjacency.next.cloned(),
                })
            })
            .await
    }

    // =========================================================================
    // Per-shot generation
    // =========================================================================

    /// Generate a shot's still frame.
    pub async fn generate_shot_image(
        &self,
        scene_id: &SceneId,
        shot_id: &ShotId,
    ) -> PipelineResult<GenerationOutcome> {
        let project = self.store.snapshot().await;
        let analysis = project
            .analysis
            .as_ref()
            .ok_or_else(|| PipelineError::precondition("audio analysis is required first"))?;
        let position = project
            .timeline
            .locate(scene_id, shot_id)
            .ok_or_else(|| shot_not_found(scene_id, shot_id))?;
        let scene = &project.timeline.scenes[position.scene_index];
        let shot = &scene.shots[position.shot_index];
        let identity = &analysis.visual_identity;

        let mut references = Vec::with_capacity(2);
        if let Some(hero) = &identity.hero_image {
            references.push(
                InlineData::from_data_url(hero)
                    .map_err(|e| PipelineError::invalid_input(format!("hero image: {}", e)))?,
            );
        }

        let mut with_continuity = false;
        if identity.video_mode.is_cinematic() {
            let previous = self.resolver.resolve(&project.timeline, position).previous;
            if let Some(url) = previous.and_then(Shot::successful_image_url) {
                match InlineData::from_data_url(url) {
                    Ok(image) => {
                        references.push(image);
                        with_continuity = true;
                    }
                    Err(e) => warn!(shot_id = %shot_id, "Skipping unreadable predecessor image: {}", e),
                }
            }
        }

        let request = ImageRequest {
            prompt: prompts::shot_image_prompt(analysis, scene, shot, with_continuity),
            references,
            aspect_ratio: self.config.aspect_ratio.clone(),
        };

        let token = self
            .store
            .begin_generation(scene_id, shot_id, GenerationStage::Image)
            .await?;
        let logger = ShotLogger::new(scene_id, shot_id, GenerationStage::Image, token.value);

        let outcome = async {
            logger.log_start(&format!(
                "{} reference image(s), continuity {}",
                request.references.len(),
                with_continuity
            ));
            let started = Instant::now();
            let result = self
                .client
                .generate_image(request)
                .await
                .map(|image| image.to_data_url())
                .map_err(PipelineError::from);
            self.finish(&token, &logger, result, started).await
        }
        .instrument(logger.create_span())
        .await;

        Ok(outcome)
    }

    /// Check that a video may be requested for a shot.
    pub async fn check_video_ready(&self, scene_id: &SceneId, shot_id: &ShotId) -> PipelineResult<Shot> {
        let shot = self.store.shot(scene_id, shot_id).await?;
        if !shot.can_generate_video() {
            return Err(PipelineError::precondition(
                "the shot needs a successful image before a video can be generated",
            ));
        }
        Ok(shot)
    }

    /// Generate a shot's video clip from its image.
    ///
    /// Polling stops when `cancel` fires, when a newer video request for the
    /// same shot starts, or when the configured wait elapses.
    pub async fn generate_shot_video(
        &self,
        scene_id: &SceneId,
        shot_id: &ShotId,
        cancel: CancelToken,
    ) -> PipelineResult<GenerationOutcome> {
        let shot = self.check_video_ready(scene_id, shot_id).await?;
        let start_url = shot
            .successful_image_url()
            .ok_or_else(|| PipelineError::precondition("shot image is not ready"))?;
        let start_frame = InlineData::from_data_url(start_url)
            .map_err(|e| PipelineError::invalid_input(format!("shot image: {}", e)))?;

        let end_frame = if shot.use_next_as_end_frame {
            self.store
                .read(|project| {
                    let next = self.resolver.resolve_shot(&project.timeline, shot_id).next;
                    next.and_then(Shot::successful_image_url)
                        .and_then(|url| InlineData::from_data_url(url).ok())
                })
                .await
        } else {
            None
        };

        if !self.keys.has_selected_key().await {
            info!("No access key selected, opening key selection");
            self.keys.open_select_key().await?;
            if !self.keys.has_selected_key().await {
                self.store.set_auth_required(true).await;
                return Err(PipelineError::precondition("no access key selected"));
            }
            self.store.set_auth_required(false).await;
        }

        let request = VideoRequest {
            prompt: prompts::shot_video_prompt(&shot),
            start_frame,
            end_frame,
            aspect_ratio: self.config.aspect_ratio.clone(),
            resolution: self.config.video_resolution.clone(),
        };

        let token = self
            .store
            .begin_generation(scene_id, shot_id, GenerationStage::Video)
            .await?;
        let logger = ShotLogger::new(scene_id, shot_id, GenerationStage::Video, token.value);
        self.register_video(&token, cancel.clone()).await;

        let outcome = async {
            logger.log_start(&format!("end frame {}", request.end_frame.is_some()));
            let started = Instant::now();

            let result = self.run_video(&token, request, &cancel, &logger).await;
            if let Err(e) = &result {
                if e.is_credential_failure() {
                    self.reauthorize(&logger).await;
                }
            }
            self.finish(&token, &logger, result, started).await
        }
        .instrument(logger.create_span())
        .await;

        self.unregister_video(&token).await;
        Ok(outcome)
    }

    async fn run_video(
        &self,
        token: &RequestToken,
        request: VideoRequest,
        cancel: &CancelToken,
        logger: &ShotLogger,
    ) -> PipelineResult<String> {
        let handle = self.client.start_video(request).await?;
        logger.log_progress(&format!("operation {} started", handle));

        let client = &self.client;
        let handle = &handle;
        let video_uri = poll_until_complete(&self.config.poll, cancel, "video generation", move || async move {
            metrics::record_video_poll();
            Ok::<_, PipelineError>(match client.poll_video(handle).await? {
                OperationStatus::Running => PollState::Pending,
                OperationStatus::Completed { video_uri } => PollState::Ready(video_uri),
            })
        })
        .await?;

        logger.log_progress("operation complete, fetching media");
        let bytes = self.client.fetch_media(&video_uri).await?;
        self.media.store_video(&token.shot_id, token.value, &bytes).await
    }

    /// Commit a result and translate it into an outcome.
    async fn finish(
        &self,
        token: &RequestToken,
        logger: &ShotLogger,
        result: PipelineResult<String>,
        started: Instant,
    ) -> GenerationOutcome {
        let elapsed = started.elapsed().as_secs_f64();
        let stage = token.stage.as_str();
        let committed = result.map_err(|e| failure_message(&e));

        match self.store.commit(token, committed.clone()).await {
            CommitOutcome::Applied => match committed {
                Ok(url) => {
                    logger.log_completion(&format!("in {:.1}s", elapsed));
                    metrics::record_generation(stage, "success", elapsed);
                    GenerationOutcome::Succeeded { url }
                }
                Err(message) => {
                    logger.log_error(&message);
                    metrics::record_generation(stage, "error", elapsed);
                    self.store
                        .set_error(format!("Shot {} generation failed: {}", stage, message))
                        .await;
                    GenerationOutcome::Failed { message }
                }
            },
            outcome => {
                logger.log_warning(&format!("result discarded ({})", outcome.as_str()));
                metrics::record_discarded(stage, outcome.as_str());
                GenerationOutcome::Discarded
            }
        }
    }

    // =========================================================================
    // Credentials and cancellation
    // =========================================================================

    async fn reauthorize(&self, logger: &ShotLogger) {
        logger.log_warning("access key rejected, requesting key selection");
        metrics::record_reauth();
        if let Err(e) = self.keys.open_select_key().await {
            warn!("Key selection failed: {}", e);
        }
        self.store.set_auth_required(true).await;
    }

    pub async fn auth_status(&self) -> AuthStatus {
        AuthStatus {
            has_selected_key: self.keys.has_selected_key().await,
            auth_required: self.store.read(|p| p.auth_required).await,
        }
    }

    /// Open key selection on user request.
    pub async fn select_key(&self) -> PipelineResult<AuthStatus> {
        self.keys.open_select_key().await?;
        if self.keys.has_selected_key().await {
            self.store.set_auth_required(false).await;
        }
        Ok(self.auth_status().await)
    }

    async fn register_video(&self, token: &RequestToken, cancel: CancelToken) {
        let previous = self
            .video_jobs
            .lock()
            .await
            .insert(token.shot_id.clone(), (token.value, cancel));
        if let Some((value, previous)) = previous {
            info!(shot_id = %token.shot_id, superseded = value, "Cancelling superseded video request");
            previous.cancel();
        }
    }

    async fn unregister_video(&self, token: &RequestToken) {
        let mut jobs = self.video_jobs.lock().await;
        if matches!(jobs.get(&token.shot_id), Some((value, _)) if *value == token.value) {
            jobs.remove(&token.shot_id);
        }
    }

    /// Cancel video polling for a shot. Returns false when none is running.
    pub async fn cancel_video(&self, shot_id: &ShotId) -> bool {
        match self.video_jobs.lock().await.remove(shot_id) {
            Some((_, cancel)) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    async fn cancel_all_videos(&self) {
        for (_, (_, cancel)) in self.video_jobs.lock().await.drain() {
            cancel.cancel();
        }
    }

    /// Discard the whole project.
    pub async fn reset(&self) {
        self.cancel_all_videos().await;
        self.store.reset().await;
    }

    pub async fn dismiss_error(&self) {
        self.store.dismiss_error().await;
    }
}

fn shot_not_found(scene_id: &SceneId, shot_id: &ShotId) -> PipelineError {
    PipelineError::not_found(format!("shot {} in scene {}", shot_id, scene_id))
}

/// Human-readable message stored on a failed shot.
fn failure_message(err: &PipelineError) -> String {
    match err {
        PipelineError::Cancelled(_) => "Video generation cancelled".to_string(),
        PipelineError::Timeout(_) => "Video generation timed out".to_string(),
        e if e.is_credential_failure() => CREDENTIAL_MESSAGE.to_string(),
        PipelineError::Generation(GenAiError::EmptyResult(_)) => {
            "The service returned no media for this shot".to_string()
        }
        e => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            failure_message(&PipelineError::Cancelled("video".into())),
            "Video generation cancelled"
        );
        assert_eq!(
            failure_message(&PipelineError::Generation(GenAiError::Unauthorized("bad".into()))),
            CREDENTIAL_MESSAGE
        );
        assert!(failure_message(&PipelineError::Generation(GenAiError::RateLimited(
            "quota".into()
        )))
        .contains("quota"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(GenerationOutcome::Succeeded { url: "/media/a.mp4".into() }).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["url"], "/media/a.mp4");
    }
}
