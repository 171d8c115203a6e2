//! HTTP client for the submit-then-poll generation capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{GenerationBackend, GenerationSpec, TaskId, TaskSnapshot, TaskState};

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct GenerationClientConfig {
    /// Base URL of the generation service
    pub base_url: String,
    /// Bearer token, if the service requires one
    pub api_key: Option<String>,
    /// Request timeout (per HTTP call, not per generation)
    pub timeout: Duration,
}

impl GenerationClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let base_url = std::env::var("VFORGE_GENERATOR_URL")
            .map_err(|_| PipelineError::config("VFORGE_GENERATOR_URL not set"))?;
        Ok(Self {
            base_url,
            api_key: std::env::var("VFORGE_GENERATOR_API_KEY").ok(),
            timeout: Duration::from_secs(
                std::env::var("VFORGE_GENERATOR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a str,
    /// Seed image inlined as a data URL; absent only for the bootstrap clip.
    #[serde(skip_serializing_if = "Option::is_none")]
    image_data_url: Option<String>,
    duration_seconds: u32,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    output_url: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

/// [`GenerationBackend`] over an HTTP generation service.
pub struct HttpGenerationClient {
    http: Client,
    config: GenerationClientConfig,
}

impl HttpGenerationClient {
    pub fn new(config: GenerationClientConfig) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PipelineError::from)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> PipelineResult<Self> {
        Self::new(GenerationClientConfig::from_env()?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn submit(&self, spec: &GenerationSpec) -> PipelineResult<TaskId> {
        let url = format!("{}/v1/generations", self.config.base_url);
        let body = SubmitRequest {
            prompt: &spec.prompt,
            image_data_url: spec.keyframe.as_ref().map(|k| k.to_data_url()),
            duration_seconds: spec.duration_seconds,
            aspect_ratio: spec.aspect_ratio.as_str(),
        };

        let response = self.authorized(self.http.post(&url).json(&body)).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::upstream(format!(
                "generation submit returned {}",
                response.status()
            )));
        }

        let body: SubmitResponse = response.json().await?;
        debug!(task_id = %body.task_id, "Generation task submitted");
        Ok(TaskId(body.task_id))
    }

    async fn status(&self, task: &TaskId) -> PipelineResult<TaskSnapshot> {
        let url = format!("{}/v1/generations/{}", self.config.base_url, task);

        let response = self.authorized(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::upstream(format!(
                "generation status returned {}",
                response.status()
            )));
        }

        let body: StatusResponse = response.json().await?;
        let state = match body.status.as_str() {
            "queued" | "pending" => TaskState::Queued,
            "running" | "processing" => TaskState::Running,
            "succeeded" | "completed" => TaskState::Succeeded,
            "failed" => TaskState::Failed,
            other => {
                return Err(PipelineError::upstream(format!(
                    "unknown task status {other:?}"
                )))
            }
        };

        Ok(TaskSnapshot {
            state,
            output_url: body.output_url,
            failure_reason: body.failure_reason,
        })
    }
}
