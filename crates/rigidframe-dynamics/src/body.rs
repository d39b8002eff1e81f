use std::sync::Arc;

use glam::Quat;
use rigidframe_core::types::{Isometry, Mat3, Vec3};
use rigidframe_core::ObjectLayer;
use rigidframe_geom::{Aabb, Shape};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionType { Static, Kinematic, Dynamic }

/// `LinearCast` widens the broad-phase bounds by the distance travelled this step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionQuality { #[default] Discrete, LinearCast }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activation { Activate, DontActivate }

/// `Created -> InWorld -> Removed -> (InWorld ...)`. Destroyed bodies leave the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyState { Created, InWorld, Removed }

#[derive(Clone, Debug)]
pub struct BodyCreationSettings {
    pub shape: Arc<Shape>,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion_type: MotionType,
    pub object_layer: ObjectLayer,
    pub motion_quality: MotionQuality,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_factor: f32,
    pub mass_override: Option<f32>,
    pub gyroscopic_force: bool,
    pub allow_sleeping: bool,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
}

impl BodyCreationSettings {
    pub fn new(shape: Arc<Shape>, position: Vec3, rotation: Quat, motion_type: MotionType, object_layer: ObjectLayer) -> Self {
        Self {
            shape, position, rotation, motion_type, object_layer,
            motion_quality: MotionQuality::Discrete,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            friction: 0.2,
            restitution: 0.0,
            linear_damping: 0.05,
            angular_damping: 0.05,
            gravity_factor: 1.0,
            mass_override: None,
            gyroscopic_force: false,
            allow_sleeping: true,
            max_linear_velocity: 500.0,
            max_angular_velocity: 0.25 * core::f32::consts::PI * 60.0,
        }
    }

    pub fn with_friction(mut self, f: f32) -> Self { self.friction = f; self }
    pub fn with_restitution(mut self, r: f32) -> Self { self.restitution = r; self }
    pub fn with_mass(mut self, m: f32) -> Self { self.mass_override = Some(m); self }
    pub fn with_motion_quality(mut self, q: MotionQuality) -> Self { self.motion_quality = q; self }
    pub fn with_gyroscopic_force(mut self, on: bool) -> Self { self.gyroscopic_force = on; self }
    pub fn with_velocity(mut self, lin: Vec3, ang: Vec3) -> Self { self.linear_velocity = lin; self.angular_velocity = ang; self }
    pub fn with_damping(mut self, lin: f32, ang: f32) -> Self { self.linear_damping = lin; self.angular_damping = ang; self }
    pub fn with_sleeping(mut self, allow: bool) -> Self { self.allow_sleeping = allow; self }
}

pub struct Body {
    shape: Arc<Shape>,
    motion_type: MotionType,
    motion_quality: MotionQuality,
    layer: ObjectLayer,
    pub(crate) state: BodyState,
    pub(crate) active: bool,

    pub(crate) pos: Vec3,
    pub(crate) rot: Quat,
    pub(crate) prev_pos: Vec3,
    pub(crate) prev_rot: Quat,
    pub(crate) lin_vel: Vec3,
    pub(crate) ang_vel: Vec3,
    pub(crate) pre_lin_vel: Vec3,
    pub(crate) pre_ang_vel: Vec3,
    pub(crate) gyro_delta: Vec3,

    pub(crate) inv_mass: f32,
    pub(crate) inertia_local: Mat3,
    pub(crate) inv_inertia_local: Mat3,

    friction: f32,
    restitution: f32,
    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) gravity_factor: f32,
    pub(crate) gyroscopic: bool,
    pub(crate) allow_sleeping: bool,
    pub(crate) max_linear_velocity: f32,
    pub(crate) max_angular_velocity: f32,
    pub(crate) sleep_timer: f32,
}

impl Body {
    pub(crate) fn from_settings(s: &BodyCreationSettings) -> Self {
        let props = match s.mass_override {
            Some(m) => s.shape.mass_props().with_mass(m),
            None => s.shape.mass_props(),
        };
        let dynamic = s.motion_type == MotionType::Dynamic;
        let rot = s.rotation.normalize();
        let (lin, ang) = if s.motion_type == MotionType::Static { (Vec3::ZERO, Vec3::ZERO) } else { (s.linear_velocity, s.angular_velocity) };
        Self {
            shape: s.shape.clone(),
            motion_type: s.motion_type,
            motion_quality: s.motion_quality,
            layer: s.object_layer,
            state: BodyState::Created,
            active: false,
            pos: s.position,
            rot,
            prev_pos: s.position,
            prev_rot: rot,
            lin_vel: lin,
            ang_vel: ang,
            pre_lin_vel: lin,
            pre_ang_vel: ang,
            gyro_delta: Vec3::ZERO,
            inv_mass: if dynamic { props.inv_mass } else { 0.0 },
            inertia_local: props.inertia,
            inv_inertia_local: if dynamic { props.inv_inertia_local() } else { Mat3::ZERO },
            friction: s.friction,
            restitution: s.restitution,
            linear_damping: s.linear_damping,
            angular_damping: s.angular_damping,
            gravity_factor: s.gravity_factor,
            gyroscopic: s.gyroscopic_force,
            allow_sleeping: s.allow_sleeping,
            max_linear_velocity: s.max_linear_velocity,
            max_angular_velocity: s.max_angular_velocity,
            sleep_timer: 0.0,
        }
    }

    #[inline] pub fn shape(&self) -> &Arc<Shape> { &self.shape }
    #[inline] pub fn motion_type(&self) -> MotionType { self.motion_type }
    #[inline] pub fn motion_quality(&self) -> MotionQuality { self.motion_quality }
    #[inline] pub fn object_layer(&self) -> ObjectLayer { self.layer }
    #[inline] pub fn state(&self) -> BodyState { self.state }
    #[inline] pub fn is_in_world(&self) -> bool { self.state == BodyState::InWorld }
    #[inline] pub fn is_active(&self) -> bool { self.active }
    #[inline] pub fn is_dynamic(&self) -> bool { self.motion_type == MotionType::Dynamic }
    #[inline] pub fn is_static(&self) -> bool { self.motion_type == MotionType::Static }
    #[inline] pub fn is_kinematic(&self) -> bool { self.motion_type == MotionType::Kinematic }

    #[inline] pub fn position(&self) -> Vec3 { self.pos }
    #[inline] pub fn rotation(&self) -> Quat { self.rot }
    #[inline] pub fn transform(&self) -> Isometry { Isometry { pos: self.pos, rot: self.rot } }
    #[inline] pub fn prev_transform(&self) -> Isometry { Isometry { pos: self.prev_pos, rot: self.prev_rot } }
    #[inline] pub fn linear_velocity(&self) -> Vec3 { self.lin_vel }
    #[inline] pub fn angular_velocity(&self) -> Vec3 { self.ang_vel }
    #[inline] pub fn pre_solve_velocity_at(&self, p: Vec3) -> Vec3 { self.pre_lin_vel + self.pre_ang_vel.cross(p - self.pos) }
    #[inline] pub fn velocity_at(&self, p: Vec3) -> Vec3 { self.lin_vel + self.ang_vel.cross(p - self.pos) }

    #[inline] pub fn inv_mass(&self) -> f32 { self.inv_mass }
    #[inline] pub fn mass(&self) -> f32 { if self.inv_mass > 0.0 { 1.0 / self.inv_mass } else { f32::INFINITY } }
    #[inline] pub fn friction(&self) -> f32 { self.friction }
    #[inline] pub fn restitution(&self) -> f32 { self.restitution }
    #[inline] pub fn set_friction(&mut self, f: f32) { self.friction = f.max(0.0); }
    #[inline] pub fn set_restitution(&mut self, r: f32) { self.restitution = r.clamp(0.0, 1.0); }

    pub fn world_aabb(&self) -> Aabb { self.shape.aabb(&self.transform()) }

    /// World-space inverse inertia: R * I^-1_local * R^T.
    pub fn inv_inertia_world(&self) -> Mat3 {
        if self.inv_mass == 0.0 { return Mat3::ZERO; }
        let r = Mat3::from_quat(self.rot);
        r * self.inv_inertia_local * r.transpose()
    }

    pub fn inertia_world(&self) -> Mat3 {
        let r = Mat3::from_quat(self.rot);
        r * self.inertia_local * r.transpose()
    }

    /// Ignored for static bodies.
    pub fn set_velocities(&mut self, lin: Vec3, ang: Vec3) {
        if self.is_static() { return; }
        self.lin_vel = lin;
        self.ang_vel = ang;
    }

    /// Teleport. Previous pose follows so no velocity is derived from the jump.
    pub fn set_transform(&mut self, pos: Vec3, rot: Quat) {
        self.pos = pos;
        self.rot = rot.normalize();
        self.prev_pos = self.pos;
        self.prev_rot = self.rot;
    }

    /// Impulse at a world-space point. Only dynamic bodies respond.
    pub fn apply_impulse_at(&mut self, j: Vec3, p: Vec3) {
        if self.inv_mass == 0.0 { return; }
        self.lin_vel += j * self.inv_mass;
        self.ang_vel += self.inv_inertia_world() * (p - self.pos).cross(j);
    }

    /// Small-angle orientation correction (world space).
    pub fn apply_orientation_delta(&mut self, dtheta_world: Vec3) {
        if dtheta_world.length_squared() <= 0.0 { return; }
        let dq = Quat::from_xyzw(dtheta_world.x, dtheta_world.y, dtheta_world.z, 0.0) * self.rot;
        self.rot = (self.rot + dq * 0.5).normalize();
    }
}
