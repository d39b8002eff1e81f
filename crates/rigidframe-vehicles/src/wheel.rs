//! Wheel descriptors and per-wheel runtime state.

use rigidframe_articulation::SpringSettings;
use rigidframe_core::types::Vec3;
use rigidframe_core::BodyId;
use serde::{Deserialize, Serialize};

/// Geometry, suspension and brake parameters of one wheel.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSettings {
    /// Suspension attach point in chassis space.
    pub position: Vec3,
    /// Direction the suspension extends in, chassis space (usually down).
    pub suspension_direction: Vec3,
    /// Axis the wheel steers around, chassis space.
    pub steering_axis: Vec3,
    /// Shortest suspension length; reaching it is a hard stop.
    pub suspension_min_length: f32,
    /// Longest suspension length; beyond it the wheel is airborne.
    pub suspension_max_length: f32,
    /// Suspension spring.
    pub suspension_spring: SpringSettings,
    /// Wheel radius (m).
    pub radius: f32,
    /// Wheel width (m), used for drawing only.
    pub width: f32,
    /// Largest steering angle (rad). Zero for wheels that do not steer.
    pub max_steer_angle: f32,
    /// Brake torque at full brake input (N·m).
    pub max_brake_torque: f32,
    /// Handbrake torque; zero for wheels without a handbrake (N·m).
    pub max_hand_brake_torque: f32,
    /// Wheel moment of inertia around the axle (kg·m²).
    pub inertia: f32,
    /// Spin decay rate while airborne (1/s).
    pub angular_damping: f32,
    /// Friction coefficient along the rolling direction.
    pub longitudinal_friction: f32,
    /// Friction coefficient across the rolling direction.
    pub lateral_friction: f32,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            suspension_direction: Vec3::NEG_Y,
            steering_axis: Vec3::Y,
            suspension_min_length: 0.3,
            suspension_max_length: 0.5,
            suspension_spring: SpringSettings::new(1.5, 0.5),
            radius: 0.3,
            width: 0.1,
            max_steer_angle: 70f32.to_radians(),
            max_brake_torque: 1500.0,
            max_hand_brake_torque: 4000.0,
            inertia: 0.9,
            angular_damping: 0.2,
            longitudinal_friction: 1.2,
            lateral_friction: 1.0,
        }
    }
}

impl WheelSettings {
    /// Default wheel attached at `position` (chassis space).
    pub fn at(position: Vec3) -> Self { Self { position, ..Self::default() } }

    /// Builder: steering range in radians.
    pub fn with_max_steer_angle(mut self, a: f32) -> Self { self.max_steer_angle = a; self }

    /// Builder: handbrake torque, zero disables.
    pub fn with_hand_brake_torque(mut self, t: f32) -> Self { self.max_hand_brake_torque = t; self }
}

/// Ground contact found by this step's wheel ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WheelContact {
    /// Body under the wheel.
    pub body: BodyId,
    /// Contact point (world).
    pub point: Vec3,
    /// Surface normal (world).
    pub normal: Vec3,
    /// Suspension impulse applied this step.
    pub suspension_impulse: f32,
}

/// Runtime state of one wheel.
#[derive(Clone, Debug)]
pub struct Wheel {
    pub(crate) settings: WheelSettings,
    pub(crate) contact: Option<WheelContact>,
    pub(crate) suspension_length: f32,
    pub(crate) steer_angle: f32,
    pub(crate) angular_velocity: f32,
    pub(crate) rotation_angle: f32,
}

impl Wheel {
    pub(crate) fn new(settings: WheelSettings) -> Self {
        Self {
            settings,
            contact: None,
            suspension_length: settings.suspension_max_length,
            steer_angle: 0.0,
            angular_velocity: 0.0,
            rotation_angle: 0.0,
        }
    }

    /// Descriptor this wheel was built from.
    pub fn settings(&self) -> &WheelSettings { &self.settings }
    /// Contact from the latest step, if grounded.
    pub fn contact(&self) -> Option<&WheelContact> { self.contact.as_ref() }
    /// True when the latest ray found ground.
    pub fn has_contact(&self) -> bool { self.contact.is_some() }
    /// Current suspension length (m).
    pub fn suspension_length(&self) -> f32 { self.suspension_length }
    /// Current steering angle (rad).
    pub fn steer_angle(&self) -> f32 { self.steer_angle }
    /// Spin rate around the axle (rad/s).
    pub fn angular_velocity(&self) -> f32 { self.angular_velocity }
    /// Accumulated spin angle in `[0, 2π)`.
    pub fn rotation_angle(&self) -> f32 { self.rotation_angle }
}
