use serde::{Deserialize, Serialize};

use crate::body::Body;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepSettings {
    /// Fastest point on the body, in m/s, below which the sleep timer runs.
    pub point_velocity_threshold: f32,
    pub time_before_sleep: f32,
}

impl Default for SleepSettings {
    fn default() -> Self { Self { point_velocity_threshold: 0.03, time_before_sleep: 0.5 } }
}

/// Advance the sleep timer. True once the body has been slow for long enough.
pub fn update_sleep(b: &mut Body, s: &SleepSettings, dt: f32) -> bool {
    if !b.allow_sleeping || !b.is_dynamic() {
        b.sleep_timer = 0.0;
        return false;
    }
    let r = b.shape().bounding_radius();
    let fastest = b.lin_vel.length() + b.ang_vel.length() * r;
    if fastest > s.point_velocity_threshold {
        b.sleep_timer = 0.0;
        return false;
    }
    b.sleep_timer += dt;
    b.sleep_timer >= s.time_before_sleep
}
