//! Storyboard generation pipeline.
//!
//! This crate provides:
//! - Continuity resolution across scene boundaries
//! - The project state container with per-(shot, stage) request tokens
//! - Plan transformation and prompt templating
//! - Bounded, cancellable polling of long-running video operations
//! - The generation orchestrator

pub mod config;
pub mod continuity;
pub mod error;
pub mod logging;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod planner;
pub mod poll;
pub mod prompts;
pub mod store;

pub use config::PipelineConfig;
pub use continuity::{Adjacency, ContinuityResolver, EmptyScenePolicy};
pub use error::{PipelineError, PipelineResult};
pub use logging::ShotLogger;
pub use media::MediaStore;
pub use orchestrator::{AuthStatus, GenerationOutcome, Orchestrator, ShotAdjacency, ShotEdit};
pub use planner::build_timeline;
pub use poll::{poll_until_complete, CancelToken, PollConfig, PollState};
pub use store::{CommitOutcome, ProjectStore, RequestToken};
