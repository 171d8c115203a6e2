//! Shot plans: the validated decomposition of a prompt into timed shots.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AspectRatio;

/// Minimum duration of a single shot, in seconds.
pub const MIN_SHOT_SECONDS: u32 = 3;

/// Maximum duration of a single shot, in seconds.
pub const MAX_SHOT_SECONDS: u32 = 30;

/// One planned sub-unit of the final video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// Ordinal id within the plan (1-based).
    pub id: u32,

    /// Generation prompt for this shot.
    pub prompt: String,

    /// Duration in seconds, within `[MIN_SHOT_SECONDS, MAX_SHOT_SECONDS]`.
    pub duration_seconds: u32,

    /// Camera directive (e.g. "slow dolly in", "static wide").
    pub camera_directive: String,
}

/// The validated, ordered collection of shots for one job.
///
/// `total_seconds` is always recomputed from the shots; a caller-supplied
/// total is discarded during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotPlan {
    /// Target aspect ratio for every shot.
    pub aspect_ratio: AspectRatio,

    /// Sum of all shot durations.
    pub total_seconds: u32,

    /// Ordered shots.
    pub shots: Vec<Shot>,
}

/// Reasons a shot plan is rejected before any generation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanValidationError {
    #[error("plan contains no shots")]
    Empty,

    #[error("shot {id} has an empty prompt")]
    EmptyPrompt { id: u32 },

    #[error("shot {id} has an empty camera directive")]
    EmptyCameraDirective { id: u32 },

    #[error(
        "shot {id} duration {duration_seconds}s is outside \
         [{MIN_SHOT_SECONDS}, {MAX_SHOT_SECONDS}]"
    )]
    DurationOutOfRange { id: u32, duration_seconds: u32 },
}

impl ShotPlan {
    /// Build a validated plan from raw shots.
    ///
    /// Shot ids are renumbered sequentially and the total is recomputed, so
    /// whatever the planning capability (or the user) claimed is never
    /// trusted.
    pub fn validated(
        aspect_ratio: AspectRatio,
        shots: Vec<Shot>,
    ) -> Result<Self, PlanValidationError> {
        if shots.is_empty() {
            return Err(PlanValidationError::Empty);
        }

        let mut normalized = Vec::with_capacity(shots.len());
        for (index, mut shot) in shots.into_iter().enumerate() {
            shot.id = index as u32 + 1;

            if shot.prompt.trim().is_empty() {
                return Err(PlanValidationError::EmptyPrompt { id: shot.id });
            }
            if shot.camera_directive.trim().is_empty() {
                return Err(PlanValidationError::EmptyCameraDirective { id: shot.id });
            }
            if !(MIN_SHOT_SECONDS..=MAX_SHOT_SECONDS).contains(&shot.duration_seconds) {
                return Err(PlanValidationError::DurationOutOfRange {
                    id: shot.id,
                    duration_seconds: shot.duration_seconds,
                });
            }

            normalized.push(shot);
        }

        let total_seconds = normalized.iter().map(|s| s.duration_seconds).sum();

        Ok(Self {
            aspect_ratio,
            total_seconds,
            shots: normalized,
        })
    }

    /// Re-validate an existing plan (e.g. one edited by the user).
    pub fn revalidate(self) -> Result<Self, PlanValidationError> {
        Self::validated(self.aspect_ratio, self.shots)
    }

    /// Number of shots in the plan.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// True if the plan has no shots (never true for a validated plan).
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(id: u32, duration: u32) -> Shot {
        Shot {
            id,
            prompt: format!("shot {id} action"),
            duration_seconds: duration,
            camera_directive: "static wide".to_string(),
        }
    }

    #[test]
    fn test_total_is_recomputed() {
        let plan =
            ShotPlan::validated(AspectRatio::Wide, vec![shot(1, 10), shot(2, 10)]).unwrap();
        assert_eq!(plan.total_seconds, 20);
        assert_eq!(
            plan.total_seconds,
            plan.shots.iter().map(|s| s.duration_seconds).sum::<u32>()
        );
    }

    #[test]
    fn test_ids_are_renumbered() {
        let plan =
            ShotPlan::validated(AspectRatio::Wide, vec![shot(7, 10), shot(7, 10)]).unwrap();
        assert_eq!(plan.shots[0].id, 1);
        assert_eq!(plan.shots[1].id, 2);
    }

    #[test]
    fn test_duration_bounds_rejected() {
        let too_short = ShotPlan::validated(AspectRatio::Wide, vec![shot(1, 2)]);
        assert!(matches!(
            too_short,
            Err(PlanValidationError::DurationOutOfRange { id: 1, duration_seconds: 2 })
        ));

        let too_long = ShotPlan::validated(AspectRatio::Wide, vec![shot(1, 31)]);
        assert!(too_long.is_err());

        assert!(ShotPlan::validated(AspectRatio::Wide, vec![shot(1, 3)]).is_ok());
        assert!(ShotPlan::validated(AspectRatio::Wide, vec![shot(1, 30)]).is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut blank_prompt = shot(1, 10);
        blank_prompt.prompt = "  ".to_string();
        assert!(matches!(
            ShotPlan::validated(AspectRatio::Wide, vec![blank_prompt]),
            Err(PlanValidationError::EmptyPrompt { id: 1 })
        ));

        let mut blank_camera = shot(1, 10);
        blank_camera.camera_directive = String::new();
        assert!(matches!(
            ShotPlan::validated(AspectRatio::Wide, vec![blank_camera]),
            Err(PlanValidationError::EmptyCameraDirective { id: 1 })
        ));

        assert!(matches!(
            ShotPlan::validated(AspectRatio::Wide, vec![]),
            Err(PlanValidationError::Empty)
        ));
    }

    #[test]
    fn test_revalidate_discards_caller_total() {
        let mut plan =
            ShotPlan::validated(AspectRatio::Portrait, vec![shot(1, 10), shot(2, 5)]).unwrap();
        plan.total_seconds = 999;

        let plan = plan.revalidate().unwrap();
        assert_eq!(plan.total_seconds, 15);
    }
}
