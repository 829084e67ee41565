//! Shared data models for the Reelboard storyboard pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes, shots and the global timeline order
//! - Per-shot image/video generation state
//! - Audio analysis and the shared visual identity
//! - Upstream plan/analysis response schemas

pub mod analysis;
pub mod ids;
pub mod plan;
pub mod project;
pub mod scene;
pub mod shot;
pub mod timeline;

// Re-export common types
pub use analysis::{
    AnalysisResponse, AudioSegment, EnergyLevel, ProjectAnalysis, SegmentResponse,
    VideoMode, VisualIdentity,
};
pub use ids::{SceneId, ShotId};
pub use plan::{PlanResponse, PlannedScene, PlannedShot};
pub use project::{AudioTrack, PipelineStage, Project};
pub use scene::Scene;
pub use shot::{GenerationStage, MediaStatus, Shot};
pub use timeline::{ShotPosition, Timeline};
