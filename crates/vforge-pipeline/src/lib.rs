//! Long-form video generation orchestrator.
//!
//! This crate provides:
//! - Shot planning with a deterministic heuristic fallback
//! - Seed keyframe preparation
//! - Sequential segment generation with a bounded retry ladder
//! - Continuity anchoring between segments
//! - Final stitching into one artifact
//! - Full-snapshot progress reporting

pub mod clients;
pub mod config;
pub mod continuity;
pub mod error;
pub mod generator;
pub mod keyframe;
pub mod logging;
pub mod orchestrator;
pub mod planner;
pub mod progress;
pub mod prompt;
pub mod retry;
pub mod stitcher;
pub mod store;
pub mod traits;

pub use clients::{HttpFetcher, HttpGenerationClient, HttpPlanningClient};
pub use config::PipelineConfig;
pub use continuity::FfmpegContinuityExtractor;
pub use error::{PipelineError, PipelineResult};
pub use generator::{FailureKind, GeneratorConfig, SegmentGenerator};
pub use keyframe::KeyframeProvider;
pub use logging::JobLogger;
pub use orchestrator::{JobOrchestrator, JobRequest};
pub use planner::ShotPlanner;
pub use progress::RedisProgressReporter;
pub use prompt::{degrade, PromptTier, DEGRADATION_LADDER, MAX_GENERATION_ATTEMPTS};
pub use stitcher::FfmpegStitcher;
pub use traits::{
    ContinuityExtractor, DurableStore, GenerationBackend, GenerationSpec, PlanningBackend,
    ProgressReporter, RemoteFetch, SegmentStitcher, TaskId, TaskSnapshot, TaskState,
};
