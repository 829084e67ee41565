//! Generative client configuration.

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Configuration for [`crate::GeminiClient`].
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// Base URL of the API (no trailing slash)
    pub api_base: String,
    /// Model for structured analysis/planning output
    pub text_model: String,
    /// Model for image output
    pub image_model: String,
    /// Model for long-running video generation
    pub video_model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl GenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("GEMINI_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            video_model: std::env::var("GEMINI_VIDEO_MODEL").unwrap_or(defaults.video_model),
            timeout: Duration::from_secs(
                std::env::var("GENAI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(180),
            ),
        }
    }

    /// Point the client at another base URL (used by tests and proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GenAiConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_with_api_base_trims_slash() {
        let config = GenAiConfig::default().with_api_base("http://127.0.0.1:9000/");
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
    }
}
