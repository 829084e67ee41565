//! Request handlers.

pub mod auth;
pub mod health;
pub mod project;
pub mod shots;

pub use auth::*;
pub use health::*;
pub use project::*;
pub use shots::*;

use std::future::Future;

use axum::http::StatusCode;
use axum::Json;
use reel_pipeline::PipelineResult;
use serde::Serialize;
use tracing::{info, warn, Instrument};

use crate::metrics;

/// Body of a `202 Accepted` answer for spawned work.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
    pub action: &'static str,
}

/// Run a long action in the background and answer `202 Accepted`.
///
/// Failures are already reflected in project state by the orchestrator;
/// here they are only logged.
pub(crate) fn spawn_action<T, F>(action: &'static str, work: F) -> (StatusCode, Json<AcceptedResponse>)
where
    T: Send + 'static,
    F: Future<Output = PipelineResult<T>> + Send + 'static,
{
    metrics::record_background_task(action);
    let span = tracing::info_span!("background_action", action);
    tokio::spawn(
        async move {
            match work.await {
                Ok(_) => info!("Background action finished"),
                Err(e) => warn!("Background action failed: {}", e),
            }
        }
        .instrument(span),
    );

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted",
            action,
        }),
    )
}
