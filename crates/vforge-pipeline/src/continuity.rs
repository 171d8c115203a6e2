//! Continuity anchor extraction over remote segments.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use vforge_media::JobWorkspace;
use vforge_models::Keyframe;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{ContinuityExtractor, RemoteFetch};

/// FFmpeg-backed [`ContinuityExtractor`].
///
/// Downloads the segment into a throwaway workspace, extracts its last
/// decodable frame, and returns it inlined. The workspace is removed
/// before returning on every path; a failure here ends the job, since
/// seeding the next shot from anything other than the previous shot's
/// final frame would break continuity.
pub struct FfmpegContinuityExtractor {
    fetcher: Arc<dyn RemoteFetch>,
    work_dir: PathBuf,
}

impl FfmpegContinuityExtractor {
    pub fn new(fetcher: Arc<dyn RemoteFetch>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            work_dir: work_dir.into(),
        }
    }

    async fn extract_in_workspace(
        &self,
        workspace: &JobWorkspace,
        media_url: &str,
    ) -> PipelineResult<Keyframe> {
        let bytes = self.fetcher.fetch(media_url).await.map_err(|e| {
            PipelineError::continuity(format!("segment download failed: {e}"))
        })?;

        let video_path = workspace.file("continuity_src.mp4");
        tokio::fs::write(&video_path, &bytes).await?;
        debug!("Downloaded {} bytes for frame extraction", bytes.len());

        let frame_path = workspace.file("continuity_frame.jpg");
        vforge_media::extract_last_frame(&video_path, &frame_path)
            .await
            .map_err(|e| PipelineError::continuity(e.to_string()))?;

        let frame_bytes = tokio::fs::read(&frame_path).await?;
        Ok(Keyframe::from_bytes(frame_bytes))
    }
}

#[async_trait]
impl ContinuityExtractor for FfmpegContinuityExtractor {
    async fn last_frame(&self, media_url: &str) -> PipelineResult<Keyframe> {
        let workspace = JobWorkspace::create(&self.work_dir, "continuity")
            .await
            .map_err(PipelineError::Media)?;

        let result = self.extract_in_workspace(&workspace, media_url).await;

        if let Err(e) = workspace.cleanup().await {
            warn!("Continuity workspace cleanup failed: {}", e);
        }
        result
    }
}
