//! Job records for long-form generation runs.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Segment, ShotPlan};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline phase of a job.
///
/// Transitions are strictly forward; `Failed` is reachable from any phase
/// and no phase is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Obtaining or accepting a shot plan
    #[default]
    Planning,
    /// Producing the initial seed keyframe
    KeyframePrep,
    /// Generating segments shot by shot
    Generating,
    /// Concatenating segments into the final artifact
    Stitching,
    /// Finished successfully
    Done,
    /// Aborted with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Planning => "planning",
            JobStatus::KeyframePrep => "keyframe_prep",
            JobStatus::Generating => "generating",
            JobStatus::Stitching => "stitching",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress snapshot shown to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct JobProgress {
    /// Overall completion, 0-100.
    pub percentage: u8,

    /// Short machine-friendly step name (e.g. "generating_shot_2").
    pub step: String,

    /// Human-readable description of the current step.
    pub message: String,
}

impl JobProgress {
    pub fn new(percentage: u8, step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            percentage: percentage.min(100),
            step: step.into(),
            message: message.into(),
        }
    }
}

/// One long-form generation run.
///
/// Owned exclusively by the orchestrator while it runs. Status updates are
/// written as full snapshots of this record, never partial diffs, so a
/// concurrent poller never observes a torn update.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID.
    pub id: JobId,

    /// Current pipeline phase.
    #[serde(default)]
    pub status: JobStatus,

    /// URL of the final stitched artifact, once done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    /// Current progress snapshot.
    #[serde(default)]
    pub progress: JobProgress,

    /// The validated plan driving generation (set after planning).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_plan: Option<ShotPlan>,

    /// Segments persisted so far, in shot order.
    #[serde(default)]
    pub segments: Vec<Segment>,

    /// User-facing error message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Sequence number for snapshot ordering (monotonically increasing).
    #[serde(default)]
    pub event_seq: u64,
}

impl Job {
    /// Create a new job in the planning phase.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Planning,
            result_url: None,
            progress: JobProgress::new(0, "planning", "Planning shots..."),
            shot_plan: None,
            segments: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            event_seq: 0,
        }
    }

    /// Move to a new phase with a fresh progress snapshot.
    pub fn advance(&mut self, status: JobStatus, progress: JobProgress) {
        self.status = status;
        self.progress = progress;
        self.touch();
    }

    /// Update progress within the current phase.
    pub fn set_progress(&mut self, progress: JobProgress) {
        self.progress = progress;
        self.touch();
    }

    /// Record a persisted segment.
    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.touch();
    }

    /// Mark the job done with its result URL.
    pub fn complete(&mut self, result_url: impl Into<String>) {
        self.status = JobStatus::Done;
        self.result_url = Some(result_url.into());
        self.progress = JobProgress::new(100, "done", "Video ready");
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    /// Mark the job failed with a user-facing message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
