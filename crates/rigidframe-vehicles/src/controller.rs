//! Driver input and drivetrain parameters.

use serde::{Deserialize, Serialize};

/// Below this forward speed (m/s) a backward input reverses instead of braking.
pub const REVERSE_SPEED_THRESHOLD: f32 = 0.1;

/// Per-frame driver commands.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInput {
    /// Throttle, `[0, 1]`.
    pub forward: f32,
    /// Brake, or reverse throttle when nearly stopped, `[0, 1]`.
    pub backward: f32,
    /// Steering, `[-1, 1]`; positive steers right.
    pub steering: f32,
    /// Handbrake, `[0, 1]`.
    pub handbrake: f32,
}

impl DriverInput {
    /// Inputs clamped to their ranges; non-finite values become zero.
    pub fn clamped(self) -> Self {
        let c = |v: f32, lo: f32, hi: f32| if v.is_finite() { v.clamp(lo, hi) } else { 0.0 };
        Self {
            forward: c(self.forward, 0.0, 1.0),
            backward: c(self.backward, 0.0, 1.0),
            steering: c(self.steering, -1.0, 1.0),
            handbrake: c(self.handbrake, 0.0, 1.0),
        }
    }

    /// No pedal, wheel or handbrake input.
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.backward == 0.0 && self.steering == 0.0 && self.handbrake == 0.0
    }

    /// `(throttle, brake)` given the forward speed; negative throttle drives backward.
    pub fn resolve(&self, forward_speed: f32) -> (f32, f32) {
        if self.backward > 0.0 && self.forward == 0.0 && forward_speed < REVERSE_SPEED_THRESHOLD {
            (-self.backward, 0.0)
        } else if self.forward > 0.0 && forward_speed < -REVERSE_SPEED_THRESHOLD {
            (0.0, self.forward)
        } else {
            (self.forward, self.backward)
        }
    }
}

/// Engine and driven-wheel layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheeledControllerSettings {
    /// Peak engine torque (N·m).
    pub engine_max_torque: f32,
    /// Engine to wheel torque multiplier.
    pub drive_ratio: f32,
    /// Indices of wheels that receive drive torque.
    pub driven_wheels: Vec<usize>,
}

impl Default for WheeledControllerSettings {
    fn default() -> Self {
        Self { engine_max_torque: 500.0, drive_ratio: 4.0, driven_wheels: Vec::new() }
    }
}

impl WheeledControllerSettings {
    /// Torque delivered to each driven wheel at full throttle.
    pub fn wheel_torque(&self) -> f32 {
        if self.driven_wheels.is_empty() { return 0.0; }
        self.engine_max_torque * self.drive_ratio / self.driven_wheels.len() as f32
    }
}
