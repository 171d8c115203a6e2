//! Persisted video segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a persisted segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SegmentId(pub String);

impl SegmentId {
    /// Generate a new random segment ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The durably stored output of successfully generating one shot.
///
/// Only ever created after upload succeeds; a failed generation attempt
/// never produces a `Segment`. Immutable once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Unique segment ID.
    pub id: SegmentId,

    /// The shot this segment realizes (1-based).
    pub shot_id: u32,

    /// Durable storage URL of the media.
    pub url: String,

    /// Duration in seconds.
    pub duration_seconds: u32,

    /// Position in the final stitched output (1-based).
    pub order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ids_are_unique() {
        assert_ne!(SegmentId::new(), SegmentId::new());
    }

    #[test]
    fn test_segment_serialization() {
        let segment = Segment {
            id: SegmentId::new(),
            shot_id: 2,
            url: "https://cdn.example.com/jobs/j1/segments/002.mp4".to_string(),
            duration_seconds: 10,
            order: 1,
        };

        let json = serde_json::to_string(&segment).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(segment, back);
    }
}
