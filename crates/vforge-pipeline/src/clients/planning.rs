//! HTTP client for the shot-planning capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vforge_models::{AspectRatio, Shot};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::PlanningBackend;

/// Configuration for the planning client.
#[derive(Debug, Clone)]
pub struct PlanningClientConfig {
    /// Base URL of the planning service
    pub base_url: String,
    /// Bearer token, if the service requires one
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl PlanningClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let base_url = std::env::var("VFORGE_PLANNER_URL")
            .map_err(|_| PipelineError::config("VFORGE_PLANNER_URL not set"))?;
        Ok(Self {
            base_url,
            api_key: std::env::var("VFORGE_PLANNER_API_KEY").ok(),
            timeout: Duration::from_secs(
                std::env::var("VFORGE_PLANNER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct PlanRequest<'a> {
    prompt: &'a str,
    target_seconds: u32,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    shots: Vec<PlannedShot>,
}

#[derive(Debug, Deserialize)]
struct PlannedShot {
    prompt: String,
    duration_seconds: u32,
    #[serde(default)]
    camera_directive: String,
}

/// [`PlanningBackend`] over an HTTP planning service.
///
/// Responses are mapped structurally only; field-level validation (bounds,
/// empty prompts, total recomputation) happens downstream in the planner.
pub struct HttpPlanningClient {
    http: Client,
    config: PlanningClientConfig,
}

impl HttpPlanningClient {
    pub fn new(config: PlanningClientConfig) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PipelineError::from)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> PipelineResult<Self> {
        Self::new(PlanningClientConfig::from_env()?)
    }
}

#[async_trait]
impl PlanningBackend for HttpPlanningClient {
    async fn plan(
        &self,
        prompt: &str,
        target_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<Vec<Shot>> {
        let url = format!("{}/v1/plans", self.config.base_url);
        debug!("Requesting shot plan for {}s", target_seconds);

        let mut request = self.http.post(&url).json(&PlanRequest {
            prompt,
            target_seconds,
            aspect_ratio: aspect_ratio.as_str(),
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::upstream(format!(
                "planning service returned {}",
                response.status()
            )));
        }

        let body: PlanResponse = response.json().await?;
        Ok(body
            .shots
            .into_iter()
            .enumerate()
            .map(|(i, s)| Shot {
                id: (i + 1) as u32,
                prompt: s.prompt,
                duration_seconds: s.duration_seconds,
                camera_directive: s.camera_directive,
            })
            .collect())
    }
}
