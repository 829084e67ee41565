//! Structured shot logging utilities.
//!
//! Provides consistent, structured logging for per-shot generation with
//! tracing spans and contextual information.

use reel_models::{GenerationStage, SceneId, ShotId};
use tracing::{error, info, warn, Span};

/// Shot logger for structured logging with consistent formatting.
///
/// Every event carries the scene id, shot id, stage and request token.
#[derive(Debug, Clone)]
pub struct ShotLogger {
    scene_id: String,
    shot_id: String,
    stage: GenerationStage,
    token: u64,
}

impl ShotLogger {
    pub fn new(scene_id: &SceneId, shot_id: &ShotId, stage: GenerationStage, token: u64) -> Self {
        Self {
            scene_id: scene_id.to_string(),
            shot_id: shot_id.to_string(),
            stage,
            token,
        }
    }

    /// Log dispatch of a generation request.
    pub fn log_start(&self, message: &str) {
        info!(
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token,
            "Generation started: {}", message
        );
    }

    /// Log a progress update while the request is in flight.
    pub fn log_progress(&self, message: &str) {
        info!(
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token,
            "Generation progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token,
            "Generation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token,
            "Generation error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token,
            "Generation completed: {}", message
        );
    }

    pub fn shot_id(&self) -> &str {
        &self.shot_id
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    /// Create a tracing span for this generation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generation",
            scene_id = %self.scene_id,
            shot_id = %self.shot_id,
            stage = %self.stage,
            token = self.token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_logger_creation() {
        let scene_id = SceneId::from_string("scene-1");
        let shot_id = ShotId::from_string("shot-1");
        let logger = ShotLogger::new(&scene_id, &shot_id, GenerationStage::Video, 3);

        assert_eq!(logger.shot_id(), "shot-1");
        assert_eq!(logger.stage(), GenerationStage::Video);
    }
}
