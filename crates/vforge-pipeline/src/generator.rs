//! Segment generation with a bounded, classification-driven retry ladder.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use vforge_models::{AspectRatio, JobId, Keyframe, Segment, SegmentId, Shot};

use crate::error::{PipelineError, PipelineResult};
use crate::prompt::{degrade, PromptTier, MAX_GENERATION_ATTEMPTS};
use crate::retry::{backoff_delay, poll_until, PollConfig, PollOutcome};
use crate::traits::{GenerationBackend, GenerationSpec, RemoteFetch, TaskState};
use crate::traits::DurableStore;

/// Classification of a terminal generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected by upstream safety filtering; never retried.
    ContentPolicy,
    /// The polling ceiling was reached; never retried.
    Timeout,
    /// Malformed or low-fidelity result; eligible for prompt degradation.
    BadOutput,
    /// Anything else; never retried.
    Generic,
}

/// A classified terminal failure of one generation attempt.
#[derive(Debug, Clone)]
pub(crate) struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classify an upstream failure reason by message pattern.
pub(crate) fn classify_failure(reason: &str) -> FailureKind {
    let msg = reason.to_lowercase();

    if msg.contains("content policy")
        || msg.contains("content_policy")
        || msg.contains("safety")
        || msg.contains("moderation")
        || msg.contains("flagged")
        || msg.contains("prohibited")
    {
        return FailureKind::ContentPolicy;
    }

    if msg.contains("timeout") || msg.contains("timed out") || msg.contains("deadline") {
        return FailureKind::Timeout;
    }

    if msg.contains("bad output")
        || msg.contains("bad_output")
        || msg.contains("malformed")
        || msg.contains("corrupt")
        || msg.contains("low quality")
        || msg.contains("low fidelity")
        || msg.contains("unusable")
        || msg.contains("artifact")
    {
        return FailureKind::BadOutput;
    }

    FailureKind::Generic
}

/// Classify a transport-level error by its message.
///
/// An HTTP timeout during submit or polling is still a timeout of the
/// generation call and must classify as one; everything else stays
/// generic. Bad-output never applies to transport errors, since no output
/// was produced to judge.
fn classify_transport_error(message: String) -> TaskFailure {
    let kind = match classify_failure(&message) {
        FailureKind::Timeout => FailureKind::Timeout,
        _ => FailureKind::Generic,
    };
    TaskFailure::new(kind, message)
}

/// Submit a generation task and poll it to a terminal state.
///
/// Returns the output URL on success, or a classified failure. Ceiling
/// exhaustion and timed-out transport calls classify as timeout; other
/// transport errors classify as generic.
pub(crate) async fn submit_and_poll(
    backend: &dyn GenerationBackend,
    spec: &GenerationSpec,
    poll: &PollConfig,
) -> Result<String, TaskFailure> {
    let task_id = backend
        .submit(spec)
        .await
        .map_err(|e| classify_transport_error(e.to_string()))?;

    let outcome = poll_until(poll, || async {
        let snapshot = backend.status(&task_id).await?;
        match snapshot.state {
            TaskState::Succeeded => Ok(Some(Ok(snapshot.output_url))),
            TaskState::Failed => {
                let reason = snapshot
                    .failure_reason
                    .unwrap_or_else(|| "unspecified failure".to_string());
                Ok(Some(Err(TaskFailure::new(classify_failure(&reason), reason))))
            }
            TaskState::Queued | TaskState::Running => Ok(None),
        }
    })
    .await
    .map_err(|e: PipelineError| classify_transport_error(e.to_string()))?;

    match outcome {
        PollOutcome::Ready(Ok(Some(url))) if !url.is_empty() => Ok(url),
        // Succeeded without a usable artifact is a malformed result
        PollOutcome::Ready(Ok(_)) => Err(TaskFailure::new(
            FailureKind::BadOutput,
            "task succeeded without an output URL",
        )),
        PollOutcome::Ready(Err(failure)) => Err(failure),
        PollOutcome::Exhausted { attempts } => Err(TaskFailure::new(
            FailureKind::Timeout,
            format!("no terminal state after {attempts} polls"),
        )),
    }
}

/// Generator tuning knobs.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Total attempts per shot, all tiers included.
    pub max_attempts: u32,
    /// Base delay between bad-output retries (scales with attempt number).
    pub retry_backoff: Duration,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Polls per attempt before the attempt counts as timed out.
    pub poll_max_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_GENERATION_ATTEMPTS,
            retry_backoff: Duration::from_secs(2),
            poll_interval: Duration::from_secs(10),
            poll_max_attempts: 180,
        }
    }
}

/// Generates one shot's segment from a seed keyframe.
///
/// Only bad-output failures are retried, each retry one rung further down
/// the prompt degradation ladder with linear backoff in between. Content
/// policy, timeout, and generic failures abort immediately. The produced
/// media is persisted durably before a `Segment` is returned, so a shot
/// that needed three attempts still yields exactly one stored object.
pub struct SegmentGenerator {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn DurableStore>,
    fetcher: Arc<dyn RemoteFetch>,
    config: GeneratorConfig,
}

impl SegmentGenerator {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn DurableStore>,
        fetcher: Arc<dyn RemoteFetch>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            backend,
            store,
            fetcher,
            config,
        }
    }

    /// Generate, download, and persist the segment for one shot.
    ///
    /// The keyframe is consumed: it seeds this call and is not retained
    /// afterward.
    pub async fn generate(
        &self,
        job_id: &JobId,
        shot: &Shot,
        keyframe: Keyframe,
        aspect_ratio: AspectRatio,
        order: u32,
    ) -> PipelineResult<Segment> {
        for attempt in 1..=self.config.max_attempts {
            let tier = PromptTier::for_attempt(attempt);
            let prompt = degrade(&shot.prompt, tier);
            info!(
                shot_id = shot.id,
                attempt,
                ?tier,
                "Submitting generation for shot"
            );

            let spec = GenerationSpec {
                prompt,
                keyframe: Some(keyframe.clone()),
                duration_seconds: shot.duration_seconds,
                aspect_ratio,
            };
            let poll = PollConfig::new(
                format!("generation shot {} attempt {}", shot.id, attempt),
                self.config.poll_max_attempts,
                self.config.poll_interval,
            );

            match submit_and_poll(self.backend.as_ref(), &spec, &poll).await {
                Ok(output_url) => {
                    return self.persist(job_id, shot, &output_url, order).await;
                }
                Err(failure) => match failure.kind {
                    FailureKind::BadOutput if attempt < self.config.max_attempts => {
                        let delay = backoff_delay(self.config.retry_backoff, attempt);
                        warn!(
                            shot_id = shot.id,
                            attempt,
                            "Bad output ({}), degrading prompt and retrying in {:?}",
                            failure.message,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    FailureKind::BadOutput => {
                        return Err(PipelineError::BadOutput {
                            shot_id: shot.id,
                            attempts: attempt,
                        });
                    }
                    FailureKind::ContentPolicy => {
                        warn!(shot_id = shot.id, "Content policy rejection: {}", failure.message);
                        return Err(PipelineError::ContentPolicy { shot_id: shot.id });
                    }
                    FailureKind::Timeout => {
                        return Err(PipelineError::GenerationTimeout { shot_id: shot.id });
                    }
                    FailureKind::Generic => {
                        return Err(PipelineError::Generation {
                            shot_id: shot.id,
                            message: failure.message,
                        });
                    }
                },
            }
        }

        // max_attempts >= 1, so the loop always returns before this
        Err(PipelineError::Generation {
            shot_id: shot.id,
            message: "no generation attempts configured".to_string(),
        })
    }

    /// Download the produced media and store it durably.
    async fn persist(
        &self,
        job_id: &JobId,
        shot: &Shot,
        output_url: &str,
        order: u32,
    ) -> PipelineResult<Segment> {
        let bytes = self.fetcher.fetch(output_url).await.map_err(|e| {
            PipelineError::Generation {
                shot_id: shot.id,
                message: format!("output download failed: {e}"),
            }
        })?;

        let key = format!("jobs/{}/segments/{:03}.mp4", job_id, shot.id);
        let url = self.store.put(&key, bytes, "video/mp4").await?;

        info!(shot_id = shot.id, "Persisted segment at {}", url);
        Ok(Segment {
            id: SegmentId::new(),
            shot_id: shot.id,
            url,
            duration_seconds: shot.duration_seconds,
            order,
        })
    }
}
