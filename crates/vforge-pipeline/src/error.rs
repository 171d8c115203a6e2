//! Pipeline error taxonomy.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort (or, for the recoverable ones, steer) a job.
///
/// Planning failures never reach the orchestrator: the planner swallows
/// them and falls back to its heuristic. Bad-output failures only surface
/// once the generator runs out of retry attempts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Keyframe preparation failed: {0}")]
    KeyframePrep(String),

    #[error("Shot {shot_id} was rejected by the content policy")]
    ContentPolicy { shot_id: u32 },

    #[error("Shot {shot_id} generation timed out")]
    GenerationTimeout { shot_id: u32 },

    #[error("Shot {shot_id} produced unusable output after {attempts} attempts")]
    BadOutput { shot_id: u32, attempts: u32 },

    #[error("Shot {shot_id} generation failed: {message}")]
    Generation { shot_id: u32, message: String },

    #[error("Continuity extraction failed: {0}")]
    ContinuityExtraction(String),

    #[error("Stitch failed: {0}")]
    Stitch(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vforge_storage::StorageError),

    #[error("Status store error: {0}")]
    Status(#[from] vforge_status::StatusError),

    #[error("Media error: {0}")]
    Media(#[from] vforge_media::MediaError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL so upstream endpoints never leak into messages.
        // Timeouts are named explicitly; reqwest's Display does not always
        // surface the underlying cause, and downstream failure
        // classification keys on the message.
        if e.is_timeout() {
            Self::Upstream(format!("request timed out: {}", e.without_url()))
        } else {
            Self::Upstream(e.without_url().to_string())
        }
    }
}

impl PipelineError {
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    pub fn keyframe_prep(msg: impl Into<String>) -> Self {
        Self::KeyframePrep(msg.into())
    }

    pub fn continuity(msg: impl Into<String>) -> Self {
        Self::ContinuityExtraction(msg.into())
    }

    pub fn stitch_failed(msg: impl Into<String>) -> Self {
        Self::Stitch(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Single descriptive line shown to the user on failure.
    ///
    /// Never includes task ids, stack traces, or raw upstream payloads.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Planning(_) => "Could not plan the video".to_string(),
            PipelineError::KeyframePrep(_) => {
                "Could not prepare the opening frame of your video".to_string()
            }
            PipelineError::ContentPolicy { shot_id } => {
                format!("Shot {shot_id} was rejected by the content safety filter")
            }
            PipelineError::GenerationTimeout { shot_id } => {
                format!("Shot {shot_id} took too long to generate")
            }
            PipelineError::BadOutput { shot_id, .. } => {
                format!("Shot {shot_id} could not be generated at acceptable quality")
            }
            PipelineError::Generation { shot_id, .. } => {
                format!("Shot {shot_id} failed to generate")
            }
            PipelineError::ContinuityExtraction(_) => {
                "Could not carry visual continuity into the next shot".to_string()
            }
            PipelineError::Stitch(_) => "Could not assemble the final video".to_string(),
            PipelineError::Upstream(_) => {
                "The video generation service is currently unavailable".to_string()
            }
            PipelineError::Storage(_) => "Could not store the generated media".to_string(),
            PipelineError::Status(_)
            | PipelineError::Media(_)
            | PipelineError::Config(_)
            | PipelineError::Io(_) => "An internal error interrupted the job".to_string(),
        }
    }
}
