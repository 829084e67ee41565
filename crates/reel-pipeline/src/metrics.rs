//! Generation metrics.
//!
//! Recorded through the `metrics` facade. The API binary installs the
//! Prometheus recorder; without one these calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const GENERATIONS_TOTAL: &str = "reel_generations_total";
    pub const GENERATION_DURATION_SECONDS: &str = "reel_generation_duration_seconds";
    pub const GENERATIONS_DISCARDED_TOTAL: &str = "reel_generations_discarded_total";
    pub const VIDEO_POLLS_TOTAL: &str = "reel_video_polls_total";
    pub const REAUTH_TOTAL: &str = "reel_reauth_total";
    pub const STRUCTURED_REQUESTS_TOTAL: &str = "reel_structured_requests_total";
}

/// Record a finished generation for one shot stage.
pub fn record_generation(stage: &str, outcome: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string()), ("outcome", outcome.to_string())];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a result dropped because a newer request or plan replaced it.
pub fn record_discarded(stage: &str, reason: &str) {
    let labels = [("stage", stage.to_string()), ("reason", reason.to_string())];
    counter!(names::GENERATIONS_DISCARDED_TOTAL, &labels).increment(1);
}

pub fn record_video_poll() {
    counter!(names::VIDEO_POLLS_TOTAL).increment(1);
}

/// Record a key re-selection triggered by a credential failure.
pub fn record_reauth() {
    counter!(names::REAUTH_TOTAL).increment(1);
}

/// Record an analysis or planning request.
pub fn record_structured_request(kind: &str, success: bool) {
    let labels = [
        ("kind", kind.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];
    counter!(names::STRUCTURED_REQUESTS_TOTAL, &labels).increment(1);
}
