//! Initial seed keyframe acquisition.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use vforge_models::{AspectRatio, Keyframe, Shot};

use crate::error::{PipelineError, PipelineResult};
use crate::generator::submit_and_poll;
use crate::retry::PollConfig;
use crate::traits::{ContinuityExtractor, GenerationBackend, GenerationSpec, RemoteFetch};

/// Produces the very first seed keyframe for a job.
///
/// When the caller attached a reference image, its bytes are fetched and
/// used directly. Otherwise a short bootstrap clip is generated from the
/// first shot's prompt and its last frame becomes the seed; the upstream
/// capability cannot generate from text alone on subsequent calls, so this
/// is the only place a text-only submission happens.
pub struct KeyframeProvider {
    backend: Arc<dyn GenerationBackend>,
    fetcher: Arc<dyn RemoteFetch>,
    extractor: Arc<dyn ContinuityExtractor>,
    /// Duration of the bootstrap clip.
    seed_clip_seconds: u32,
    poll_interval: Duration,
    poll_max_attempts: u32,
}

impl KeyframeProvider {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        fetcher: Arc<dyn RemoteFetch>,
        extractor: Arc<dyn ContinuityExtractor>,
        seed_clip_seconds: u32,
        poll_interval: Duration,
        poll_max_attempts: u32,
    ) -> Self {
        Self {
            backend,
            fetcher,
            extractor,
            seed_clip_seconds,
            poll_interval,
            poll_max_attempts,
        }
    }

    /// Obtain the initial keyframe for the first shot.
    ///
    /// Any failure here is fatal for the job; there is no degraded path to
    /// a usable seed.
    pub async fn initial_keyframe(
        &self,
        reference_image_url: Option<&str>,
        first_shot: &Shot,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<Keyframe> {
        match reference_image_url {
            Some(url) => {
                info!("Fetching caller-supplied reference image");
                let bytes = self
                    .fetcher
                    .fetch(url)
                    .await
                    .map_err(|e| PipelineError::keyframe_prep(format!(
                        "reference image download failed: {e}"
                    )))?;
                if bytes.is_empty() {
                    return Err(PipelineError::keyframe_prep("reference image is empty"));
                }
                Ok(Keyframe::from_bytes(bytes))
            }
            None => self.bootstrap_keyframe(first_shot, aspect_ratio).await,
        }
    }

    /// Generate a short clip from the first shot's prompt and take its
    /// last frame as the seed.
    async fn bootstrap_keyframe(
        &self,
        first_shot: &Shot,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<Keyframe> {
        info!(
            seed_clip_seconds = self.seed_clip_seconds,
            "No reference image; generating bootstrap clip for seed keyframe"
        );

        let spec = GenerationSpec {
            prompt: first_shot.prompt.clone(),
            keyframe: None,
            duration_seconds: self.seed_clip_seconds,
            aspect_ratio,
        };
        let poll = PollConfig::new(
            "bootstrap clip",
            self.poll_max_attempts,
            self.poll_interval,
        );

        let clip_url = submit_and_poll(self.backend.as_ref(), &spec, &poll)
            .await
            .map_err(|failure| {
                PipelineError::keyframe_prep(format!(
                    "bootstrap clip generation failed: {}",
                    failure.message
                ))
            })?;

        self.extractor
            .last_frame(&clip_url)
            .await
            .map_err(|e| PipelineError::keyframe_prep(format!(
                "bootstrap frame extraction failed: {e}"
            )))
    }
}
