//! Project session state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ProjectAnalysis, Timeline};

/// Where the project is in the production pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Waiting for an audio upload
    #[default]
    Upload,
    /// Audio analysis in flight
    Analyzing,
    /// Analysis done, choosing the hero look
    HeroSelection,
    /// Scene/shot plan in flight
    Planning,
    /// Timeline exists, shots are generated individually
    Storyboard,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Upload => "upload",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::HeroSelection => "hero_selection",
            PipelineStage::Planning => "planning",
            PipelineStage::Storyboard => "storyboard",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Uploaded audio kept in memory for the planning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Whole in-memory session. Nothing here is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    #[serde(default)]
    pub stage: PipelineStage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ProjectAnalysis>,

    #[serde(default)]
    pub timeline: Timeline,

    /// Candidate hero images (data URLs) awaiting selection
    #[serde(default)]
    pub hero_candidates: Vec<String>,

    /// Dismissible project-level error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The access credential was rejected and must be re-selected
    #[serde(default)]
    pub auth_required: bool,

    #[serde(skip)]
    #[schemars(skip)]
    pub audio: Option<AudioTrack>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_mode(&self) -> crate::VideoMode {
        self.analysis
            .as_ref()
            .map(|a| a.visual_identity.video_mode)
            .unwrap_or_default()
    }
}
