//! Axum HTTP API server.
//!
//! This crate provides:
//! - JSON endpoints for every storyboard action
//! - Background execution of long generations with `202 Accepted`
//! - Static serving of materialized video clips
//! - Security headers, request ids and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
