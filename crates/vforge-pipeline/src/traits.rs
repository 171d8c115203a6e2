//! Capability seams for external collaborators.
//!
//! Everything the pipeline depends on across a network boundary (planning,
//! generation, storage, fetching) or an FFmpeg boundary (continuity,
//! stitching) lives behind one of these traits so the orchestrator's
//! sequencing can be exercised without any of them.

use async_trait::async_trait;
use std::fmt;

use vforge_models::{AspectRatio, Job, JobId, Keyframe, Segment, Shot};

use crate::error::PipelineResult;

/// One generation request handed to the upstream capability.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSpec {
    /// Prompt text (possibly degraded by the retry ladder).
    pub prompt: String,
    /// Seed image; `None` only for the bootstrap clip that derives the
    /// first keyframe.
    pub keyframe: Option<Keyframe>,
    /// Requested clip duration in seconds.
    pub duration_seconds: u32,
    /// Requested aspect ratio.
    pub aspect_ratio: AspectRatio,
}

/// Upstream identifier of a submitted generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an upstream generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Point-in-time view of an upstream generation task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub state: TaskState,
    /// Download URL of the produced media, set on success.
    pub output_url: Option<String>,
    /// Upstream failure description, set on failure.
    pub failure_reason: Option<String>,
}

/// The planning capability: decomposes a prompt into shots.
///
/// May fail in any way; the caller is responsible for falling back to the
/// deterministic heuristic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    async fn plan(
        &self,
        prompt: &str,
        target_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<Vec<Shot>>;
}

/// The generation capability: submit-then-poll video generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn submit(&self, spec: &GenerationSpec) -> PipelineResult<TaskId>;
    async fn status(&self, task: &TaskId) -> PipelineResult<TaskSnapshot>;
}

/// Durable object storage for segments and the final artifact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Store bytes under a key; returns the object's URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> PipelineResult<String>;
}

/// Bounded download of remote media.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>>;
}

/// Extracts the last decodable frame of remote media as the next seed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContinuityExtractor: Send + Sync {
    async fn last_frame(&self, media_url: &str) -> PipelineResult<Keyframe>;
}

/// Concatenates persisted segments into the final artifact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentStitcher: Send + Sync {
    /// Returns the durable URL of the stitched output.
    async fn stitch(&self, job_id: &JobId, segments: &[Segment]) -> PipelineResult<String>;
}

/// Observer of job snapshots, invoked after every phase and shot.
///
/// Reporting must never fail a job; implementations swallow and log their
/// own errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, job: &Job);
}
