use rigidframe_core::PhysicsError;
use serde::{Deserialize, Serialize};

/// How elapsed frame time becomes world steps.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DtPolicy {
    /// One step of the full elapsed time, however large.
    PassThrough,
    /// One step, capped at `max_dt`. Time above the cap is dropped.
    Clamp { max_dt: f32 },
    /// Whole steps of `step` seconds from an accumulator; at most `max_steps` per
    /// frame, the backlog beyond that is dropped.
    FixedStep { step: f32, max_steps: u32 },
}

impl Default for DtPolicy {
    fn default() -> Self { DtPolicy::Clamp { max_dt: 0.25 } }
}

/// Steps to run for one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepPlan {
    pub dt: f32,
    pub count: u32,
    /// Seconds of elapsed time that will never be simulated.
    pub dropped: f32,
}

impl DtPolicy {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let bad = |m: &str| Err(PhysicsError::InvalidConfiguration(m.into()));
        match *self {
            DtPolicy::PassThrough => Ok(()),
            DtPolicy::Clamp { max_dt } if !(max_dt > 0.0 && max_dt.is_finite()) => bad("clamp max_dt must be positive"),
            DtPolicy::FixedStep { step, .. } if !(step > 0.0 && step.is_finite()) => bad("fixed step must be positive"),
            DtPolicy::FixedStep { max_steps: 0, .. } => bad("fixed step max_steps must be at least 1"),
            _ => Ok(()),
        }
    }

    /// `elapsed` is never negative; `residual` carries fixed-step leftovers between frames.
    pub fn plan(&self, elapsed: f32, residual: &mut f32) -> StepPlan {
        let elapsed = elapsed.max(0.0);
        match *self {
            DtPolicy::PassThrough => StepPlan { dt: elapsed, count: 1, dropped: 0.0 },
            DtPolicy::Clamp { max_dt } => {
                let dt = elapsed.min(max_dt);
                StepPlan { dt, count: 1, dropped: elapsed - dt }
            }
            DtPolicy::FixedStep { step, max_steps } => {
                *residual += elapsed;
                let whole = (*residual / step).floor() as u64;
                let count = whole.min(max_steps as u64) as u32;
                *residual -= count as f32 * step;
                let mut dropped = 0.0;
                if whole > max_steps as u64 {
                    // Keep only the partial step so the next frame does not start behind.
                    let keep = *residual % step;
                    dropped = *residual - keep;
                    *residual = keep;
                }
                StepPlan { dt: step, count, dropped }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_keeps_large_frames() {
        let mut r = 0.0;
        assert_eq!(DtPolicy::PassThrough.plan(3.0, &mut r), StepPlan { dt: 3.0, count: 1, dropped: 0.0 });
    }

    #[test]
    fn clamp_caps_and_reports_dropped_time() {
        let mut r = 0.0;
        let p = DtPolicy::Clamp { max_dt: 0.25 }.plan(1.0, &mut r);
        assert_eq!((p.dt, p.count), (0.25, 1));
        assert!((p.dropped - 0.75).abs() < 1e-6);
        assert_eq!(DtPolicy::Clamp { max_dt: 0.25 }.plan(0.1, &mut r).dt, 0.1);
    }

    #[test]
    fn fixed_step_accumulates_remainder() {
        let policy = DtPolicy::FixedStep { step: 0.01, max_steps: 8 };
        let mut r = 0.0;
        assert_eq!(policy.plan(0.004, &mut r).count, 0);
        assert_eq!(policy.plan(0.004, &mut r).count, 0);
        assert_eq!(policy.plan(0.004, &mut r).count, 1);
        assert!((r - 0.002).abs() < 1e-6);
    }

    #[test]
    fn fixed_step_drops_backlog_past_max_steps() {
        let policy = DtPolicy::FixedStep { step: 0.01, max_steps: 4 };
        let mut r = 0.0;
        let p = policy.plan(0.105, &mut r);
        assert_eq!(p.count, 4);
        assert!(r < 0.01);
        assert!((p.dropped - 0.06).abs() < 1e-4, "{}", p.dropped);
    }

    #[test]
    fn invalid_policies_are_rejected() {
        assert!(DtPolicy::Clamp { max_dt: 0.0 }.validate().is_err());
        assert!(DtPolicy::FixedStep { step: -1.0, max_steps: 2 }.validate().is_err());
        assert!(DtPolicy::FixedStep { step: 0.01, max_steps: 0 }.validate().is_err());
        assert!(DtPolicy::default().validate().is_ok());
    }

    #[test]
    fn policies_read_from_json() {
        let p: DtPolicy = serde_json::from_str(r#"{"policy":"fixed_step","step":0.01,"max_steps":4}"#).unwrap();
        assert_eq!(p, DtPolicy::FixedStep { step: 0.01, max_steps: 4 });
    }
}
