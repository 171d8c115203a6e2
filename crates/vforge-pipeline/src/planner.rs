//! Shot planning with a deterministic heuristic fallback.

use std::sync::Arc;
use tracing::{info, warn};

use vforge_models::{
    AspectRatio, Shot, ShotPlan, MAX_SHOT_SECONDS, MIN_SHOT_SECONDS,
};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::PlanningBackend;

/// Camera directive used for heuristic shots.
const GENERIC_CAMERA: &str = "static medium shot";

/// Turns a prompt and target duration into a validated shot plan.
///
/// Delegates to the planning capability and re-validates whatever comes
/// back. Any failure there, transport or content, drops to a deterministic
/// equal-split heuristic so planning can never block the pipeline.
pub struct ShotPlanner {
    backend: Arc<dyn PlanningBackend>,
    heuristic_shot_seconds: u32,
}

impl ShotPlanner {
    pub fn new(backend: Arc<dyn PlanningBackend>, heuristic_shot_seconds: u32) -> Self {
        Self {
            backend,
            heuristic_shot_seconds: heuristic_shot_seconds.clamp(MIN_SHOT_SECONDS, MAX_SHOT_SECONDS),
        }
    }

    /// Produce a validated plan for the prompt.
    pub async fn plan(
        &self,
        prompt: &str,
        target_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<ShotPlan> {
        match self.backend.plan(prompt, target_seconds, aspect_ratio).await {
            Ok(shots) => match ShotPlan::validated(aspect_ratio, shots) {
                Ok(plan) => {
                    info!(
                        "Planner produced {} shots totaling {}s",
                        plan.len(),
                        plan.total_seconds
                    );
                    return Ok(plan);
                }
                Err(e) => {
                    warn!("Planner output failed validation ({}), using heuristic", e);
                }
            },
            Err(e) => {
                warn!("Planning capability failed ({}), using heuristic", e);
            }
        }

        self.heuristic_plan(prompt, target_seconds, aspect_ratio)
    }

    /// Accept a plan the user already confirmed or edited.
    ///
    /// Planning is skipped but validation is not: fields are re-checked and
    /// the total recomputed.
    pub fn accept(&self, plan: ShotPlan) -> PipelineResult<ShotPlan> {
        plan.revalidate()
            .map_err(|e| PipelineError::planning(e.to_string()))
    }

    /// Deterministic fallback: split the target into equal generic shots.
    fn heuristic_plan(
        &self,
        prompt: &str,
        target_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> PipelineResult<ShotPlan> {
        let durations = split_duration(target_seconds, self.heuristic_shot_seconds);
        let shots = durations
            .into_iter()
            .enumerate()
            .map(|(index, duration_seconds)| Shot {
                id: index as u32 + 1,
                prompt: prompt.trim().to_string(),
                duration_seconds,
                camera_directive: GENERIC_CAMERA.to_string(),
            })
            .collect();

        let plan = ShotPlan::validated(aspect_ratio, shots)
            .map_err(|e| PipelineError::planning(format!("heuristic plan invalid: {e}")))?;
        info!(
            "Heuristic fallback produced {} shots totaling {}s",
            plan.len(),
            plan.total_seconds
        );
        Ok(plan)
    }
}

/// Split `total` seconds into near-equal shots of roughly `chunk` seconds.
///
/// The shot count, not the individual durations, is adjusted to keep every
/// shot within bounds, so the durations always sum to `total`. A target
/// below the minimum is rounded up to one minimum-length shot.
fn split_duration(total: u32, chunk: u32) -> Vec<u32> {
    if total <= MIN_SHOT_SECONDS {
        return vec![MIN_SHOT_SECONDS];
    }

    // Fewer shots when the chunk would fall under the minimum, more when
    // it would exceed the maximum.
    let count = total
        .div_ceil(chunk)
        .min(total / MIN_SHOT_SECONDS)
        .max(total.div_ceil(MAX_SHOT_SECONDS))
        .max(1);
    let base = total / count;
    let remainder = total % count;

    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockPlanningBackend;

    fn planner_with(backend: MockPlanningBackend) -> ShotPlanner {
        ShotPlanner::new(Arc::new(backend), 10)
    }

    fn backend_shot(duration: u32) -> Shot {
        Shot {
            id: 0,
            prompt: "a robot explores a city".to_string(),
            duration_seconds: duration,
            camera_directive: "slow dolly in".to_string(),
        }
    }

    #[tokio::test]
    async fn test_backend_plan_is_validated_and_used() {
        let mut backend = MockPlanningBackend::new();
        backend
            .expect_plan()
            .returning(|_, _, _| Ok(vec![backend_shot(10), backend_shot(10)]));

        let plan = planner_with(backend)
            .plan("a robot explores a city", 20, AspectRatio::Wide)
            .await
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.total_seconds, 20);
        assert_eq!(plan.shots[0].camera_directive, "slow dolly in");
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back_to_heuristic() {
        let mut backend = MockPlanningBackend::new();
        backend
            .expect_plan()
            .returning(|_, _, _| Err(PipelineError::upstream("planning service down")));

        let plan = planner_with(backend)
            .plan("a robot explores a city", 20, AspectRatio::Wide)
            .await
            .unwrap();

        // ceil(20 / 10) = 2 equal generic shots
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.shots[0].duration_seconds, 10);
        assert_eq!(plan.shots[1].duration_seconds, 10);
        assert_eq!(plan.shots[0].camera_directive, GENERIC_CAMERA);
        assert_eq!(plan.total_seconds, 20);
    }

    #[tokio::test]
    async fn test_malformed_backend_plan_falls_back() {
        let mut backend = MockPlanningBackend::new();
        // 40s shot violates the duration bound
        backend
            .expect_plan()
            .returning(|_, _, _| Ok(vec![backend_shot(40)]));

        let plan = planner_with(backend)
            .plan("a robot explores a city", 25, AspectRatio::Wide)
            .await
            .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.total_seconds, 25);
    }

    #[tokio::test]
    async fn test_accept_revalidates_user_plan() {
        let backend = MockPlanningBackend::new();
        let planner = planner_with(backend);

        let mut plan = ShotPlan::validated(
            AspectRatio::Portrait,
            vec![backend_shot(10), backend_shot(5)],
        )
        .unwrap();
        plan.total_seconds = 500; // user-tampered total is discarded

        let accepted = planner.accept(plan).unwrap();
        assert_eq!(accepted.total_seconds, 15);

        let mut bad = ShotPlan::validated(AspectRatio::Portrait, vec![backend_shot(10)]).unwrap();
        bad.shots[0].duration_seconds = 1;
        assert!(planner.accept(bad).is_err());
    }

    #[test]
    fn test_split_duration_equal_shots() {
        assert_eq!(split_duration(20, 10), vec![10, 10]);
        assert_eq!(split_duration(30, 10), vec![10, 10, 10]);
        assert_eq!(split_duration(25, 10), vec![9, 8, 8]);
        assert_eq!(split_duration(10, 10), vec![10]);
    }

    #[test]
    fn test_split_duration_respects_minimum() {
        assert_eq!(split_duration(2, 10), vec![MIN_SHOT_SECONDS]);
        assert_eq!(split_duration(0, 10), vec![MIN_SHOT_SECONDS]);
        for d in split_duration(95, 10) {
            assert!((MIN_SHOT_SECONDS..=MAX_SHOT_SECONDS).contains(&d));
        }
    }

    // Rounding a short remainder up to the minimum must shrink the shot
    // count, never stretch shot durations past the requested total.
    #[test]
    fn test_split_duration_preserves_total_above_minimum() {
        assert_eq!(split_duration(4, 3), vec![4]);
        assert_eq!(split_duration(7, 3), vec![4, 3]);

        for (total, chunk) in [(4, 3), (7, 3), (25, 10), (100, 3), (61, 30)] {
            let durations = split_duration(total, chunk);
            assert_eq!(durations.iter().sum::<u32>(), total, "total {total} chunk {chunk}");
            for d in durations {
                assert!(
                    (MIN_SHOT_SECONDS..=MAX_SHOT_SECONDS).contains(&d),
                    "total {total} chunk {chunk} produced {d}"
                );
            }
        }
    }
}
