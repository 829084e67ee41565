//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_models::VideoMode;

use crate::continuity::EmptyScenePolicy;
use crate::poll::PollConfig;

pub const DEFAULT_SHOT_DURATION: f64 = 5.0;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Video operation polling
    pub poll: PollConfig,
    /// Mode seeded into a fresh analysis
    pub default_video_mode: VideoMode,
    /// Hero options requested when the caller gives no count
    pub hero_option_count: usize,
    /// Duration used when the plan gives a missing or invalid one
    pub default_shot_duration: f64,
    /// Directory that receives materialized videos
    pub media_dir: PathBuf,
    /// URL prefix the media directory is served under
    pub media_url_prefix: String,
    /// How adjacency treats empty scenes at a boundary
    pub empty_scene_policy: EmptyScenePolicy,
    /// Aspect ratio for every image and video request
    pub aspect_ratio: String,
    /// Video output resolution
    pub video_resolution: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            default_video_mode: VideoMode::Montage,
            hero_option_count: 4,
            default_shot_duration: DEFAULT_SHOT_DURATION,
            media_dir: PathBuf::from("/tmp/reelboard/media"),
            media_url_prefix: "/media".to_string(),
            empty_scene_policy: EmptyScenePolicy::Stop,
            aspect_ratio: "16:9".to_string(),
            video_resolution: "720p".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll: PollConfig {
                initial_interval: Duration::from_secs(
                    std::env::var("VIDEO_POLL_INITIAL_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(10),
                ),
                max_interval: Duration::from_secs(
                    std::env::var("VIDEO_POLL_MAX_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(60),
                ),
                multiplier: std::env::var("VIDEO_POLL_MULTIPLIER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|m: &u32| *m >= 1)
                    .unwrap_or(2),
                max_wait: Duration::from_secs(
                    std::env::var("VIDEO_POLL_MAX_WAIT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(900),
                ),
            },
            default_video_mode: std::env::var("DEFAULT_VIDEO_MODE")
                .map(|s| VideoMode::parse(&s))
                .unwrap_or(defaults.default_video_mode),
            hero_option_count: std::env::var("HERO_OPTION_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.hero_option_count),
            default_shot_duration: std::env::var("DEFAULT_SHOT_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &f64| d.is_finite() && *d > 0.0)
                .unwrap_or(DEFAULT_SHOT_DURATION),
            media_dir: std::env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            media_url_prefix: std::env::var("MEDIA_URL_PREFIX")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.media_url_prefix),
            empty_scene_policy: std::env::var("EMPTY_SCENE_POLICY")
                .ok()
                .and_then(|s| EmptyScenePolicy::parse(&s))
                .unwrap_or_default(),
            aspect_ratio: std::env::var("ASPECT_RATIO").unwrap_or(defaults.aspect_ratio),
            video_resolution: std::env::var("VIDEO_RESOLUTION")
                .unwrap_or(defaults.video_resolution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.poll.initial_interval, Duration::from_secs(10));
        assert_eq!(config.poll.max_wait, Duration::from_secs(900));
        assert_eq!(config.default_shot_duration, 5.0);
        assert_eq!(config.empty_scene_policy, EmptyScenePolicy::Stop);
        assert_eq!(config.default_video_mode, VideoMode::Montage);
    }
}
