//! Pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Work directory for ephemeral job workspaces
    pub work_dir: String,
    /// Interval between generation status polls
    pub poll_interval: Duration,
    /// Maximum status polls per generation task before it counts as timed out
    pub poll_max_attempts: u32,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Base delay between bad-output retries (scales linearly with attempt)
    pub retry_backoff: Duration,
    /// Duration of the bootstrap clip used to derive the first keyframe
    pub seed_clip_seconds: u32,
    /// Shot length used by the heuristic planning fallback
    pub heuristic_shot_seconds: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: "/tmp/vidforge".to_string(),
            poll_interval: Duration::from_secs(10),
            poll_max_attempts: 180, // 30 minutes at 10s intervals
            http_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(2),
            seed_clip_seconds: 5,
            heuristic_shot_seconds: 10,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("VFORGE_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/vidforge".to_string()),
            poll_interval: Duration::from_secs(
                std::env::var("VFORGE_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            poll_max_attempts: std::env::var("VFORGE_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(180),
            http_timeout: Duration::from_secs(
                std::env::var("VFORGE_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            retry_backoff: Duration::from_secs(
                std::env::var("VFORGE_RETRY_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            seed_clip_seconds: std::env::var("VFORGE_SEED_CLIP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            heuristic_shot_seconds: std::env::var("VFORGE_HEURISTIC_SHOT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}
