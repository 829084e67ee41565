//! Shot model and per-medium generation state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ShotId;

/// Generation status of one medium (image or video) of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// Media generated, URL available
    Success,
    /// Last attempt failed
    Error,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Idle => "idle",
            MediaStatus::Loading => "loading",
            MediaStatus::Success => "success",
            MediaStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which per-shot state machine a generation request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Image,
    Video,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Image => "image",
            GenerationStage::Video => "video",
        }
    }
}

impl std::fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Atomic unit of generated content: one image and optionally one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    pub id: ShotId,

    /// Duration in seconds (always positive)
    pub duration: f64,

    /// Prompt describing the still frame
    pub visual_prompt: String,

    /// Camera/motion instruction for the video clip
    pub motion_prompt: String,

    #[serde(default)]
    pub image_status: MediaStatus,

    #[serde(default)]
    pub video_status: MediaStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Morph the clip into the globally next shot's image.
    #[serde(default)]
    pub use_next_as_end_frame: bool,

    /// Last failure message, cleared when a new attempt starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Shot {
    /// Create an idle shot with no media.
    pub fn new(
        id: ShotId,
        duration: f64,
        visual_prompt: impl Into<String>,
        motion_prompt: impl Into<String>,
        use_next_as_end_frame: bool,
    ) -> Self {
        Self {
            id,
            duration,
            visual_prompt: visual_prompt.into(),
            motion_prompt: motion_prompt.into(),
            image_status: MediaStatus::Idle,
            video_status: MediaStatus::Idle,
            image_url: None,
            video_url: None,
            use_next_as_end_frame,
            error: None,
        }
    }

    pub fn status(&self, stage: GenerationStage) -> MediaStatus {
        match stage {
            GenerationStage::Image => self.image_status,
            GenerationStage::Video => self.video_status,
        }
    }

    pub fn url(&self, stage: GenerationStage) -> Option<&str> {
        match stage {
            GenerationStage::Image => self.image_url.as_deref(),
            GenerationStage::Video => self.video_url.as_deref(),
        }
    }

    /// Start a new attempt. A previous URL stays until it is overwritten.
    pub fn begin(&mut self, stage: GenerationStage) {
        *self.status_mut(stage) = MediaStatus::Loading;
        self.error = None;
    }

    /// Record a successful attempt.
    pub fn succeed(&mut self, stage: GenerationStage, url: impl Into<String>) {
        *self.status_mut(stage) = MediaStatus::Success;
        *self.url_mut(stage) = Some(url.into());
        self.error = None;
    }

    /// Record a failed attempt. The URL keeps its prior value.
    pub fn fail(&mut self, stage: GenerationStage, message: impl Into<String>) {
        *self.status_mut(stage) = MediaStatus::Error;
        self.error = Some(message.into());
    }

    /// Image URL, only when the image stage succeeded.
    pub fn successful_image_url(&self) -> Option<&str> {
        match self.image_status {
            MediaStatus::Success => self.image_url.as_deref(),
            _ => None,
        }
    }

    /// Video generation chains from the shot's own image.
    pub fn can_generate_video(&self) -> bool {
        self.successful_image_url().is_some()
    }

    fn status_mut(&mut self, stage: GenerationStage) -> &mut MediaStatus {
        match stage {
            GenerationStage::Image => &mut self.image_status,
            GenerationStage::Video => &mut self.video_status,
        }
    }

    fn url_mut(&mut self, stage: GenerationStage) -> &mut Option<String> {
        match stage {
            GenerationStage::Image => &mut self.image_url,
            GenerationStage::Video => &mut self.video_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot() -> Shot {
        Shot::new(ShotId::from("s1"), 4.0, "a lighthouse", "", false)
    }

    #[test]
    fn test_new_shot_is_idle() {
        let shot = shot();
        assert_eq!(shot.image_status, MediaStatus::Idle);
        assert_eq!(shot.video_status, MediaStatus::Idle);
        assert!(shot.image_url.is_none());
        assert!(!shot.can_generate_video());
    }

    #[test]
    fn test_image_lifecycle() {
        let mut shot = shot();
        shot.begin(GenerationStage::Image);
        assert_eq!(shot.image_status, MediaStatus::Loading);
        assert_eq!(shot.video_status, MediaStatus::Idle);

        shot.succeed(GenerationStage::Image, "data:image/png;base64,AAAA");
        assert_eq!(shot.image_status, MediaStatus::Success);
        assert_eq!(shot.successful_image_url(), Some("data:image/png;base64,AAAA"));
        assert!(shot.can_generate_video());
    }

    #[test]
    fn test_failure_keeps_previous_url_and_sets_error() {
        let mut shot = shot();
        shot.succeed(GenerationStage::Image, "first");

        shot.begin(GenerationStage::Image);
        assert_eq!(shot.image_url.as_deref(), Some("first"));
        assert!(shot.successful_image_url().is_none());

        shot.fail(GenerationStage::Image, "quota exhausted");
        assert_eq!(shot.image_status, MediaStatus::Error);
        assert_eq!(shot.image_url.as_deref(), Some("first"));
        assert_eq!(shot.error.as_deref(), Some("quota exhausted"));
        assert!(!shot.can_generate_video());
    }

    #[test]
    fn test_begin_clears_error() {
        let mut shot = shot();
        shot.fail(GenerationStage::Video, "boom");
        shot.begin(GenerationStage::Video);
        assert!(shot.error.is_none());
        assert_eq!(shot.video_status, MediaStatus::Loading);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&MediaStatus::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
