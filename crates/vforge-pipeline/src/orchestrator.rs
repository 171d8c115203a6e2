//! The job state machine.
//!
//! Drives one job through `PLANNING → KEYFRAME_PREP → GENERATING →
//! STITCHING → DONE`, strictly forward, with `FAILED` reachable from any
//! phase. Shots are generated sequentially because each one is seeded by
//! the previous segment's final frame; there is no concurrency to exploit
//! here, only a data dependency chain.

use std::sync::Arc;
use tracing::info;

use vforge_models::{AspectRatio, Job, JobProgress, JobStatus, Keyframe, ShotPlan};

use crate::error::{PipelineError, PipelineResult};
use crate::generator::SegmentGenerator;
use crate::keyframe::KeyframeProvider;
use crate::logging::JobLogger;
use crate::planner::ShotPlanner;
use crate::progress::{
    shot_progress, GENERATION_START_PCT, KEYFRAME_DONE_PCT, PLANNING_DONE_PCT, STITCHING_PCT,
};
use crate::traits::{ContinuityExtractor, ProgressReporter, SegmentStitcher};

/// Everything needed to start one job.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobRequest {
    /// Natural-language description of the desired video.
    pub prompt: String,
    /// Requested total duration in seconds.
    pub target_seconds: u32,
    /// Requested aspect ratio; unknown values fall back to the default.
    pub aspect_ratio: String,
    /// Optional caller-supplied reference image used as the first seed.
    #[serde(default)]
    pub reference_image_url: Option<String>,
    /// A plan the caller already reviewed; skips the planning capability
    /// but not validation.
    #[serde(default)]
    pub approved_plan: Option<ShotPlan>,
}

/// Runs one job end to end. One instance per job; no state is shared
/// between jobs except durable storage and the status record.
pub struct JobOrchestrator {
    planner: ShotPlanner,
    keyframes: KeyframeProvider,
    generator: SegmentGenerator,
    continuity: Arc<dyn ContinuityExtractor>,
    stitcher: Arc<dyn SegmentStitcher>,
    reporter: Arc<dyn ProgressReporter>,
}

impl JobOrchestrator {
    pub fn new(
        planner: ShotPlanner,
        keyframes: KeyframeProvider,
        generator: SegmentGenerator,
        continuity: Arc<dyn ContinuityExtractor>,
        stitcher: Arc<dyn SegmentStitcher>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            planner,
            keyframes,
            generator,
            continuity,
            stitcher,
            reporter,
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// Always returns the terminal job record: `DONE` with a result URL,
    /// or `FAILED` with a single sanitized user-facing message.
    pub async fn run(&self, request: JobRequest) -> Job {
        let mut job = Job::new();
        let logger = JobLogger::new(&job.id, "orchestrator");
        logger.log_start(&format!(
            "Starting job for {}s of video",
            request.target_seconds
        ));
        self.reporter.report(&job).await;

        match self.execute(&mut job, request).await {
            Ok(result_url) => {
                job.complete(result_url);
                logger.log_completion("Job done");
            }
            Err(e) => {
                logger.log_error(&format!("Job failed: {e}"));
                job.fail(e.user_message());
            }
        }

        self.reporter.report(&job).await;
        job
    }

    async fn execute(&self, job: &mut Job, request: JobRequest) -> PipelineResult<String> {
        let aspect_ratio = AspectRatio::normalize(&request.aspect_ratio);

        // PLANNING
        let plan = match request.approved_plan {
            Some(plan) => self.planner.accept(plan)?,
            None => {
                self.planner
                    .plan(&request.prompt, request.target_seconds, aspect_ratio)
                    .await?
            }
        };
        info!(job_id = %job.id, "Plan has {} shots, {}s total", plan.len(), plan.total_seconds);
        job.shot_plan = Some(plan.clone());
        job.advance(
            JobStatus::KeyframePrep,
            JobProgress::new(PLANNING_DONE_PCT, "keyframe_prep", "Preparing opening frame"),
        );
        self.reporter.report(job).await;

        // KEYFRAME_PREP
        let first_shot = plan
            .shots
            .first()
            .ok_or_else(|| PipelineError::planning("validated plan has no shots"))?;
        let initial = self
            .keyframes
            .initial_keyframe(
                request.reference_image_url.as_deref(),
                first_shot,
                aspect_ratio,
            )
            .await?;
        job.advance(
            JobStatus::Generating,
            JobProgress::new(KEYFRAME_DONE_PCT, "generating", "Starting generation"),
        );
        self.reporter.report(job).await;

        // GENERATING: each shot consumes the current seed exactly once and
        // every shot except the last produces the next one.
        let total = plan.len() as u32;
        let mut seed: Option<Keyframe> = Some(initial);
        for (idx, shot) in plan.shots.iter().enumerate() {
            let order = (idx + 1) as u32;
            let is_last = order == total;

            let current = seed
                .take()
                .ok_or_else(|| PipelineError::continuity("seed keyframe missing"))?;
            let segment = self
                .generator
                .generate(&job.id, shot, current, aspect_ratio, order)
                .await?;
            let segment_url = segment.url.clone();
            job.push_segment(segment);
            job.set_progress(shot_progress(order, total));
            self.reporter.report(job).await;

            if !is_last {
                seed = Some(self.continuity.last_frame(&segment_url).await?);
            }
        }

        // STITCHING
        job.advance(
            JobStatus::Stitching,
            JobProgress::new(STITCHING_PCT, "stitching", "Assembling final video"),
        );
        self.reporter.report(job).await;

        self.stitcher.stitch(&job.id, &job.segments).await
    }
}

// Keeps the progress constants honest relative to each other.
const _: () = assert!(PLANNING_DONE_PCT < KEYFRAME_DONE_PCT);
const _: () = assert!(KEYFRAME_DONE_PCT < GENERATION_START_PCT);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::traits::{
        MockContinuityExtractor, MockDurableStore, MockGenerationBackend, MockPlanningBackend,
        MockProgressReporter, MockRemoteFetch, MockSegmentStitcher, TaskId, TaskSnapshot,
        TaskState,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use vforge_models::Shot;

    fn shot(id: u32, prompt: &str) -> Shot {
        Shot {
            id,
            prompt: prompt.to_string(),
            duration_seconds: 10,
            camera_directive: "static medium shot".to_string(),
        }
    }

    fn request(prompt: &str, target_seconds: u32) -> JobRequest {
        JobRequest {
            prompt: prompt.to_string(),
            target_seconds,
            aspect_ratio: "16:9".to_string(),
            reference_image_url: Some("https://example.com/ref.png".to_string()),
            approved_plan: None,
        }
    }

    fn jpeg_keyframe() -> Keyframe {
        Keyframe::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg")
    }

    /// Generation backend that fails the first `bad_failures` tasks with a
    /// bad-output reason, then succeeds everything.
    fn flaky_backend(bad_failures: u32) -> MockGenerationBackend {
        let mut backend = MockGenerationBackend::new();
        let submits = Arc::new(AtomicU32::new(0));
        {
            let submits = submits.clone();
            backend.expect_submit().returning(move |_| {
                let n = submits.fetch_add(1, Ordering::SeqCst);
                Ok(TaskId(format!("t{n}")))
            });
        }
        backend.expect_status().returning(move |task| {
            let n: u32 = task.0.trim_start_matches('t').parse().unwrap();
            if n < bad_failures {
                Ok(TaskSnapshot {
                    state: TaskState::Failed,
                    output_url: None,
                    failure_reason: Some("output malformed".to_string()),
                })
            } else {
                Ok(TaskSnapshot {
                    state: TaskState::Succeeded,
                    output_url: Some(format!("https://upstream.example.com/{}.mp4", task.0)),
                    failure_reason: None,
                })
            }
        });
        backend
    }

    struct Harness {
        planner_backend: MockPlanningBackend,
        generation_backend: MockGenerationBackend,
        continuity: MockContinuityExtractor,
        stitcher: MockSegmentStitcher,
    }

    impl Harness {
        fn with_plan(shots: Vec<Shot>) -> Self {
            let mut planner_backend = MockPlanningBackend::new();
            planner_backend
                .expect_plan()
                .returning(move |_, _, _| Ok(shots.clone()));
            Self {
                planner_backend,
                generation_backend: flaky_backend(0),
                continuity: MockContinuityExtractor::new(),
                stitcher: MockSegmentStitcher::new(),
            }
        }

        fn build(self) -> JobOrchestrator {
            let backend: Arc<dyn crate::traits::GenerationBackend> =
                Arc::new(self.generation_backend);

            let mut store = MockDurableStore::new();
            store
                .expect_put()
                .returning(|key, _, _| Ok(format!("https://cdn.example.com/{key}")));

            let mut fetcher = MockRemoteFetch::new();
            fetcher
                .expect_fetch()
                .returning(|_| Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
            let fetcher: Arc<dyn crate::traits::RemoteFetch> = Arc::new(fetcher);

            let mut reporter = MockProgressReporter::new();
            reporter.expect_report().return_const(());

            let config = GeneratorConfig {
                max_attempts: 3,
                retry_backoff: Duration::from_millis(1),
                poll_interval: Duration::from_millis(1),
                poll_max_attempts: 3,
            };

            JobOrchestrator::new(
                ShotPlanner::new(Arc::new(self.planner_backend), 10),
                KeyframeProvider::new(
                    backend.clone(),
                    fetcher.clone(),
                    Arc::new(MockContinuityExtractor::new()),
                    5,
                    Duration::from_millis(1),
                    3,
                ),
                SegmentGenerator::new(backend, Arc::new(store), fetcher, config),
                Arc::new(self.continuity),
                Arc::new(self.stitcher),
                Arc::new(reporter),
            )
        }
    }

    // A 20s prompt planned as two 10s shots runs the whole chain: generate
    // shot 1, extract its last frame, generate shot 2 from it, stitch both.
    #[tokio::test]
    async fn test_two_shot_job_completes() {
        let mut harness = Harness::with_plan(vec![
            shot(1, "A robot walks through a city"),
            shot(2, "The robot reaches a plaza"),
        ]);

        harness
            .continuity
            .expect_last_frame()
            .times(1)
            .withf(|url| url.contains("segments/001.mp4"))
            .returning(|_| Ok(jpeg_keyframe()));
        harness
            .stitcher
            .expect_stitch()
            .times(1)
            .withf(|_, segments| segments.len() == 2)
            .returning(|job_id, _| Ok(format!("https://cdn.example.com/jobs/{job_id}/final.mp4")));

        let job = harness
            .build()
            .run(request("A robot explores a city for 20s", 20))
            .await;

        assert_eq!(job.status, JobStatus::Done);
        assert!(job.result_url.unwrap().ends_with("final.mp4"));
        assert_eq!(job.segments.len(), 2);
        assert_eq!(job.progress.percentage, 100);
        assert!(job.error_message.is_none());
        assert!(job.completed_at.is_some());
    }

    // One bad-output failure on a middle shot is absorbed by the retry
    // ladder; the job still finishes with exactly one segment per shot.
    #[tokio::test]
    async fn test_bad_output_mid_job_recovers() {
        let mut harness = Harness::with_plan(vec![
            shot(1, "Opening shot"),
            shot(2, "Middle shot"),
            shot(3, "Closing shot"),
        ]);
        // keyframe uses a reference image, so tasks are t0..: shot 1 = t0,
        // shot 2 first attempt = t1 (fails), retry = t2, shot 3 = t3
        harness.generation_backend = {
            let mut backend = MockGenerationBackend::new();
            let submits = Arc::new(AtomicU32::new(0));
            {
                let submits = submits.clone();
                backend.expect_submit().returning(move |_| {
                    let n = submits.fetch_add(1, Ordering::SeqCst);
                    Ok(TaskId(format!("t{n}")))
                });
            }
            backend.expect_status().returning(|task| {
                if task.0 == "t1" {
                    Ok(TaskSnapshot {
                        state: TaskState::Failed,
                        output_url: None,
                        failure_reason: Some("result unusable".to_string()),
                    })
                } else {
                    Ok(TaskSnapshot {
                        state: TaskState::Succeeded,
                        output_url: Some(format!("https://upstream.example.com/{}.mp4", task.0)),
                        failure_reason: None,
                    })
                }
            });
            backend
        };

        harness
            .continuity
            .expect_last_frame()
            .times(2)
            .returning(|_| Ok(jpeg_keyframe()));
        harness
            .stitcher
            .expect_stitch()
            .times(1)
            .withf(|_, segments| segments.len() == 3)
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let job = harness.build().run(request("Three scenes", 30)).await;

        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.segments.len(), 3);
        // segments are per shot, not per attempt
        let shot_ids: Vec<u32> = job.segments.iter().map(|s| s.shot_id).collect();
        assert_eq!(shot_ids, vec![1, 2, 3]);
    }

    // A content policy rejection is never retried and fails the job with a
    // message naming the offending shot.
    #[tokio::test]
    async fn test_content_policy_fails_job_naming_shot() {
        let mut harness = Harness::with_plan(vec![
            shot(1, "Calm opening"),
            shot(2, "Something objectionable"),
            shot(3, "Never reached"),
        ]);
        harness.generation_backend = {
            let mut backend = MockGenerationBackend::new();
            let submits = Arc::new(AtomicU32::new(0));
            {
                let submits = submits.clone();
                // shot 1 = t0, shot 2 = t1; shot 2's rejection must not
                // produce a third submission
                backend.expect_submit().times(2).returning(move |_| {
                    let n = submits.fetch_add(1, Ordering::SeqCst);
                    Ok(TaskId(format!("t{n}")))
                });
            }
            backend.expect_status().returning(|task| {
                if task.0 == "t1" {
                    Ok(TaskSnapshot {
                        state: TaskState::Failed,
                        output_url: None,
                        failure_reason: Some("prompt flagged by content policy".to_string()),
                    })
                } else {
                    Ok(TaskSnapshot {
                        state: TaskState::Succeeded,
                        output_url: Some("https://upstream.example.com/ok.mp4".to_string()),
                        failure_reason: None,
                    })
                }
            });
            backend
        };

        harness
            .continuity
            .expect_last_frame()
            .times(1)
            .returning(|_| Ok(jpeg_keyframe()));
        harness.stitcher.expect_stitch().times(0);

        let job = harness.build().run(request("Three scenes", 30)).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_url.is_none());
        let message = job.error_message.unwrap();
        assert!(message.contains("Shot 2"), "got: {message}");
        assert!(message.contains("content safety"), "got: {message}");
        // the first segment was persisted before the failure
        assert_eq!(job.segments.len(), 1);
    }

    // Bad output on every attempt for one shot exhausts the retry ladder
    // and fails the whole job, keeping the segments produced before it.
    #[tokio::test]
    async fn test_bad_output_exhaustion_fails_job_keeping_prior_segments() {
        let mut harness = Harness::with_plan(vec![
            shot(1, "Calm opening"),
            shot(2, "Cursed middle"),
            shot(3, "Never reached"),
        ]);
        harness.generation_backend = {
            let mut backend = MockGenerationBackend::new();
            let submits = Arc::new(AtomicU32::new(0));
            {
                let submits = submits.clone();
                // shot 1 = t0, then shot 2's three attempts = t1..t3 and
                // nothing more once the ladder is spent
                backend.expect_submit().times(4).returning(move |_| {
                    let n = submits.fetch_add(1, Ordering::SeqCst);
                    Ok(TaskId(format!("t{n}")))
                });
            }
            backend.expect_status().returning(|task| {
                if task.0 == "t0" {
                    Ok(TaskSnapshot {
                        state: TaskState::Succeeded,
                        output_url: Some("https://upstream.example.com/t0.mp4".to_string()),
                        failure_reason: None,
                    })
                } else {
                    Ok(TaskSnapshot {
                        state: TaskState::Failed,
                        output_url: None,
                        failure_reason: Some("output malformed".to_string()),
                    })
                }
            });
            backend
        };

        harness
            .continuity
            .expect_last_frame()
            .times(1)
            .returning(|_| Ok(jpeg_keyframe()));
        harness.stitcher.expect_stitch().times(0);

        let job = harness.build().run(request("Three scenes", 30)).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_url.is_none());
        let message = job.error_message.unwrap();
        assert!(message.contains("Shot 2"), "got: {message}");
        assert!(message.contains("acceptable quality"), "got: {message}");
        assert_eq!(job.segments.len(), 1);
        assert_eq!(job.segments[0].shot_id, 1);
    }

    // Continuity runs once per shot boundary, never after the last shot.
    #[tokio::test]
    async fn test_continuity_called_n_minus_one_times() {
        let mut harness = Harness::with_plan(vec![
            shot(1, "One"),
            shot(2, "Two"),
            shot(3, "Three"),
            shot(4, "Four"),
        ]);
        harness
            .continuity
            .expect_last_frame()
            .times(3)
            .returning(|_| Ok(jpeg_keyframe()));
        harness
            .stitcher
            .expect_stitch()
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let job = harness.build().run(request("Four scenes", 40)).await;
        assert_eq!(job.status, JobStatus::Done);
    }

    // A single-shot job never touches the continuity extractor.
    #[tokio::test]
    async fn test_single_shot_skips_continuity() {
        let mut harness = Harness::with_plan(vec![shot(1, "Only shot")]);
        harness.continuity.expect_last_frame().times(0);
        harness
            .stitcher
            .expect_stitch()
            .withf(|_, segments| segments.len() == 1)
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let job = harness.build().run(request("One scene", 10)).await;
        assert_eq!(job.status, JobStatus::Done);
    }

    // Continuity failure is fatal with no fallback seed.
    #[tokio::test]
    async fn test_continuity_failure_fails_job() {
        let mut harness = Harness::with_plan(vec![shot(1, "One"), shot(2, "Two")]);
        harness
            .continuity
            .expect_last_frame()
            .returning(|_| Err(PipelineError::continuity("no decodable frame")));
        harness.stitcher.expect_stitch().times(0);

        let job = harness.build().run(request("Two scenes", 20)).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job
            .error_message
            .unwrap()
            .contains("visual continuity"));
    }

    // A planning backend blowup falls back to the heuristic instead of
    // failing the job.
    #[tokio::test]
    async fn test_planner_failure_uses_heuristic() {
        let mut planner_backend = MockPlanningBackend::new();
        planner_backend
            .expect_plan()
            .returning(|_, _, _| Err(PipelineError::upstream("planner down")));

        let mut harness = Harness::with_plan(vec![]);
        harness.planner_backend = planner_backend;
        // 25s at 10s heuristic chunks = 3 shots, so 2 continuity calls
        harness
            .continuity
            .expect_last_frame()
            .times(2)
            .returning(|_| Ok(jpeg_keyframe()));
        harness
            .stitcher
            .expect_stitch()
            .withf(|_, segments| segments.len() == 3)
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let job = harness.build().run(request("A sweeping vista", 25)).await;

        assert_eq!(job.status, JobStatus::Done);
        let plan = job.shot_plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.total_seconds, 25);
    }

    // An approved plan skips the planning capability but not validation.
    #[tokio::test]
    async fn test_approved_plan_bypasses_backend() {
        let mut planner_backend = MockPlanningBackend::new();
        planner_backend.expect_plan().times(0);

        let mut harness = Harness::with_plan(vec![]);
        harness.planner_backend = planner_backend;
        harness.continuity.expect_last_frame().times(0);
        harness
            .stitcher
            .expect_stitch()
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let approved = ShotPlan {
            aspect_ratio: AspectRatio::Wide,
            total_seconds: 999, // stale total; validation recomputes it
            shots: vec![shot(1, "Hand-written shot")],
        };
        let mut req = request("ignored", 10);
        req.approved_plan = Some(approved);

        let job = harness.build().run(req).await;

        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.shot_plan.unwrap().total_seconds, 10);
    }

    // Terminal snapshots carry a monotonically increased event_seq.
    #[tokio::test]
    async fn test_event_seq_increases() {
        let mut harness = Harness::with_plan(vec![shot(1, "Only shot")]);
        harness.continuity.expect_last_frame().times(0);
        harness
            .stitcher
            .expect_stitch()
            .returning(|_, _| Ok("https://cdn.example.com/final.mp4".to_string()));

        let job = harness.build().run(request("One scene", 10)).await;
        assert!(job.event_seq >= 4);
    }
}
