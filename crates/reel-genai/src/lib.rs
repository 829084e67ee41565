//! Generative service client for the storyboard pipeline.
//!
//! This crate provides:
//! - The `GenerativeClient` seam (structured output, images, long-running video)
//! - A Gemini/Veo implementation over reqwest
//! - Error classification into a closed `ErrorKind` set
//! - The access-key selection boundary
//! - Scripted mocks for tests

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod types;

pub use client::GenerativeClient;
pub use config::GenAiConfig;
pub use credentials::{EnvKeySelector, KeySelector};
pub use error::{ErrorKind, GenAiError, GenAiResult};
pub use gemini::GeminiClient;
pub use types::{
    ImageRequest, InlineData, OperationHandle, OperationStatus, StructuredRequest, VideoRequest,
};
