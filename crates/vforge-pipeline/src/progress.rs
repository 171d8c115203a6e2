//! Job progress reporting.
//!
//! Progress values carve the 0..100 range into fixed phase shares, with
//! the generation phase interpolated per completed shot. Reporting is
//! fire-and-forget: a reporter failure is logged and never fails the job.

use async_trait::async_trait;
use tracing::warn;

use vforge_models::{Job, JobProgress};
use vforge_status::RedisStatusStore;

use crate::traits::ProgressReporter;

/// Percentage reached once planning completes.
pub const PLANNING_DONE_PCT: u8 = 5;

/// Percentage reached once the initial keyframe is ready.
pub const KEYFRAME_DONE_PCT: u8 = 15;

/// Percentage at the start of the generation phase.
pub const GENERATION_START_PCT: u8 = 20;

/// Percentage at the end of the generation phase.
pub const GENERATION_END_PCT: u8 = 90;

/// Percentage while stitching runs.
pub const STITCHING_PCT: u8 = 90;

/// Interpolated percentage after `completed` of `total` shots.
pub fn generation_pct(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return GENERATION_START_PCT;
    }
    let span = (GENERATION_END_PCT - GENERATION_START_PCT) as u32;
    let gained = span * completed.min(total) / total;
    GENERATION_START_PCT + gained as u8
}

/// Progress snapshot for one completed shot.
pub fn shot_progress(completed: u32, total: u32) -> JobProgress {
    JobProgress::new(
        generation_pct(completed, total),
        "generating",
        format!("Generated shot {completed} of {total}"),
    )
}

/// [`ProgressReporter`] backed by the Redis snapshot store.
///
/// Each report overwrites the whole job record, so readers always see one
/// coherent snapshot.
pub struct RedisProgressReporter {
    store: RedisStatusStore,
}

impl RedisProgressReporter {
    pub fn new(store: RedisStatusStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProgressReporter for RedisProgressReporter {
    async fn report(&self, job: &Job) {
        if let Err(e) = self.store.write_snapshot(job).await {
            warn!(job_id = %job.id, "Progress snapshot write failed: {}", e);
        }
    }
}
