//! Final assembly of persisted segments.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use vforge_media::JobWorkspace;
use vforge_models::{JobId, Segment};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{DurableStore, RemoteFetch, SegmentStitcher};

/// FFmpeg-backed [`SegmentStitcher`].
///
/// Downloads every segment into a job-scoped workspace, concatenates them
/// in order, uploads the result, and tears the workspace down whether or
/// not the stitch succeeded. The individual segments are left untouched in
/// durable storage, so a stitch failure loses no generated media.
pub struct FfmpegStitcher {
    fetcher: Arc<dyn RemoteFetch>,
    store: Arc<dyn DurableStore>,
    work_dir: PathBuf,
}

impl FfmpegStitcher {
    pub fn new(
        fetcher: Arc<dyn RemoteFetch>,
        store: Arc<dyn DurableStore>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            store,
            work_dir: work_dir.into(),
        }
    }

    async fn stitch_in_workspace(
        &self,
        workspace: &JobWorkspace,
        job_id: &JobId,
        segments: &[Segment],
    ) -> PipelineResult<String> {
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.order);

        let mut local_paths = Vec::with_capacity(ordered.len());
        for segment in &ordered {
            let bytes = self.fetcher.fetch(&segment.url).await.map_err(|e| {
                PipelineError::stitch_failed(format!(
                    "segment {} download failed: {e}",
                    segment.shot_id
                ))
            })?;
            let path = workspace.file(format!("segment_{:03}.mp4", segment.order));
            tokio::fs::write(&path, &bytes).await?;
            local_paths.push(path);
        }

        let output_path = workspace.file("final.mp4");
        let mode = vforge_media::concat_segments(&local_paths, &output_path)
            .await
            .map_err(|e| PipelineError::stitch_failed(e.to_string()))?;
        info!(?mode, "Concatenated {} segments", local_paths.len());

        let bytes = tokio::fs::read(&output_path).await?;
        let key = format!("jobs/{}/final.mp4", job_id);
        let url = self.store.put(&key, bytes, "video/mp4").await?;
        Ok(url)
    }
}

#[async_trait]
impl SegmentStitcher for FfmpegStitcher {
    async fn stitch(&self, job_id: &JobId, segments: &[Segment]) -> PipelineResult<String> {
        if segments.is_empty() {
            return Err(PipelineError::stitch_failed("no segments to stitch"));
        }

        let workspace = JobWorkspace::create(&self.work_dir, job_id.as_str())
            .await
            .map_err(PipelineError::Media)?;

        let result = self.stitch_in_workspace(&workspace, job_id, segments).await;

        if let Err(e) = workspace.cleanup().await {
            warn!("Stitch workspace cleanup failed: {}", e);
        }
        result
    }
}
