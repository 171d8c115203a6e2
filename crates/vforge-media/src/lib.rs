//! FFmpeg CLI wrapper for VidForge.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeouts
//! - FFprobe stream inspection
//! - Last-frame extraction (continuity anchors)
//! - Ordered segment concatenation (stream copy with re-encode fallback)
//! - Job-scoped ephemeral workspaces with guaranteed teardown

pub mod command;
pub mod concat;
pub mod error;
pub mod frames;
pub mod probe;
pub mod workspace;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_segments, ConcatMode};
pub use error::{MediaError, MediaResult};
pub use frames::extract_last_frame;
pub use probe::{probe_video, StreamParams};
pub use workspace::JobWorkspace;
