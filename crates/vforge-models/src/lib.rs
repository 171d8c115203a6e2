//! Shared data models for the VidForge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their status snapshots
//! - Shot plans and individual shots
//! - Keyframes (inlined seed images)
//! - Persisted video segments
//! - Aspect ratio handling

pub mod aspect;
pub mod job;
pub mod keyframe;
pub mod segment;
pub mod shot;

// Re-export common types
pub use aspect::AspectRatio;
pub use job::{Job, JobId, JobProgress, JobStatus};
pub use keyframe::Keyframe;
pub use segment::{Segment, SegmentId};
pub use shot::{PlanValidationError, Shot, ShotPlan, MAX_SHOT_SECONDS, MIN_SHOT_SECONDS};
