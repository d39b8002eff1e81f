//! Vehicle constraint: wheel rays, suspension springs, tire friction and drive.
//!
//! The constraint does its work once per collision step from
//! [`VehicleConstraint::update`], driven by a [`crate::VehicleStepListener`]. Wheel
//! impulses are applied to chassis velocity before integration, so the regular
//! substep pipeline carries them forward.

use std::any::Any;
use std::f32::consts::TAU;

use glam::Quat;
use rigidframe_articulation::{Constraint, ConstraintKind};
use rigidframe_collision::BroadPhase;
use rigidframe_core::types::{Mat3, Vec3};
use rigidframe_core::{BodyId, Isometry, LayerPolicy, PhysicsError};
use rigidframe_dynamics::xpbd::{apply_impulse_pair, positional_weight, solve_positional};
use rigidframe_dynamics::{cast_ray, Body, BodyRegistry};
use serde::{Deserialize, Serialize};

use crate::controller::{DriverInput, WheeledControllerSettings};
use crate::wheel::{Wheel, WheelContact, WheelSettings};

/// Description of a vehicle, in chassis space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConstraintSettings {
    /// Chassis up axis.
    pub up: Vec3,
    /// Chassis forward axis.
    pub forward: Vec3,
    /// Wheels, indexed in this order everywhere.
    pub wheels: Vec<WheelSettings>,
    /// Drivetrain.
    pub controller: WheeledControllerSettings,
}

impl Default for VehicleConstraintSettings {
    fn default() -> Self {
        Self { up: Vec3::Y, forward: Vec3::Z, wheels: Vec::new(), controller: WheeledControllerSettings::default() }
    }
}

impl VehicleConstraintSettings {
    /// Validate and bind to a dynamic chassis.
    pub fn create(&self, chassis: BodyId, bodies: &BodyRegistry) -> Result<VehicleConstraint, PhysicsError> {
        let body = bodies.get(chassis)?;
        if !body.is_dynamic() {
            return Err(invalid(format!("vehicle chassis {chassis} must be dynamic")));
        }
        if self.wheels.is_empty() {
            return Err(invalid("vehicle needs at least one wheel".into()));
        }
        let up = self.up.try_normalize().ok_or_else(|| invalid("up axis is zero".into()))?;
        let forward = self.forward.try_normalize().ok_or_else(|| invalid("forward axis is zero".into()))?;
        if up.dot(forward).abs() > 1.0e-3 {
            return Err(invalid("up and forward axes must be perpendicular".into()));
        }
        for (i, w) in self.wheels.iter().enumerate() {
            check_wheel(i, w)?;
        }
        if let Some(&bad) = self.controller.driven_wheels.iter().find(|&&i| i >= self.wheels.len()) {
            return Err(invalid(format!("driven wheel {bad} out of range")));
        }
        if !(self.controller.engine_max_torque >= 0.0 && self.controller.drive_ratio >= 0.0) {
            return Err(invalid("engine torque and drive ratio must be non-negative".into()));
        }
        Ok(VehicleConstraint {
            chassis,
            up,
            forward,
            wheels: self.wheels.iter().copied().map(Wheel::new).collect(),
            controller: self.controller.clone(),
            input: DriverInput::default(),
        })
    }
}

fn invalid(msg: String) -> PhysicsError { PhysicsError::InvalidConstraint(msg) }

fn check_wheel(i: usize, w: &WheelSettings) -> Result<(), PhysicsError> {
    if !(w.radius > 0.0) {
        return Err(invalid(format!("wheel {i}: radius must be positive")));
    }
    if !(w.suspension_min_length >= 0.0 && w.suspension_min_length <= w.suspension_max_length && w.suspension_max_length > 0.0) {
        return Err(invalid(format!("wheel {i}: need 0 <= min length <= max length, max > 0")));
    }
    if w.suspension_direction.try_normalize().is_none() || w.steering_axis.try_normalize().is_none() {
        return Err(invalid(format!("wheel {i}: zero suspension direction or steering axis")));
    }
    if !(w.suspension_spring.frequency > 0.0 && w.suspension_spring.damping >= 0.0) {
        return Err(invalid(format!("wheel {i}: suspension spring needs a positive frequency")));
    }
    if !(w.inertia > 0.0) {
        return Err(invalid(format!("wheel {i}: inertia must be positive")));
    }
    Ok(())
}

/// A chassis on ray-cast wheels.
pub struct VehicleConstraint {
    chassis: BodyId,
    up: Vec3,
    forward: Vec3,
    wheels: Vec<Wheel>,
    controller: WheeledControllerSettings,
    input: DriverInput,
}

/// Per-update values shared by every wheel.
struct Frame {
    dt: f32,
    brake: f32,
    handbrake: f32,
    forward: Vec3,
    sprung_mass: f32,
}

impl VehicleConstraint {
    /// Chassis body.
    pub fn chassis(&self) -> BodyId { self.chassis }
    /// All wheels, in settings order.
    pub fn wheels(&self) -> &[Wheel] { &self.wheels }
    /// One wheel by index.
    pub fn wheel(&self, index: usize) -> Option<&Wheel> { self.wheels.get(index) }
    /// Input applied at the next update.
    pub fn driver_input(&self) -> DriverInput { self.input }
    /// Drivetrain parameters.
    pub fn controller(&self) -> &WheeledControllerSettings { &self.controller }

    /// Takes effect on the next update. Any non-idle input wakes the chassis.
    pub fn set_driver_input(&mut self, input: DriverInput) { self.input = input.clamped(); }

    /// Chassis right axis, chassis space.
    fn right(&self) -> Vec3 { self.forward.cross(self.up) }

    /// One collision step of wheel work. Does nothing while the chassis is out of the
    /// world, or asleep with idle input.
    pub fn update(&mut self, dt: f32, bodies: &mut BodyRegistry, broad_phase: &BroadPhase, policy: &LayerPolicy) {
        if !(dt > 0.0) { return; }
        let Ok(chassis) = bodies.get(self.chassis) else { return };
        if !chassis.is_in_world() { return; }
        if !chassis.is_active() {
            if self.input.is_idle() { return; }
            if bodies.activate(self.chassis).is_err() { return; }
        }
        let Ok(chassis) = bodies.get(self.chassis) else { return };
        let xf = chassis.transform();
        let layer = chassis.object_layer();
        let forward = xf.transform_vector(self.forward);
        let (throttle, brake) = self.input.resolve(chassis.linear_velocity().dot(forward));
        let frame = Frame {
            dt,
            brake,
            handbrake: self.input.handbrake,
            forward,
            sprung_mass: chassis.mass() / self.wheels.len() as f32,
        };

        let id = self.chassis;
        for w in &mut self.wheels {
            w.steer_angle = self.input.steering * w.settings.max_steer_angle;
            probe(w, &xf, id, layer, bodies, broad_phase, policy);
        }

        let torque = self.controller.wheel_torque() * throttle;
        for (i, w) in self.wheels.iter_mut().enumerate() {
            let drive = if self.controller.driven_wheels.contains(&i) { torque } else { 0.0 };
            match w.contact {
                Some(contact) => {
                    if let Ok((c, g)) = bodies.pair_mut(id, contact.body) {
                        grounded(w, contact, c, g, drive, &frame);
                    }
                }
                None => airborne(w, drive, &frame),
            }
            w.rotation_angle = (w.rotation_angle + w.angular_velocity * dt).rem_euclid(TAU);
        }
    }

    /// Wheel pose relative to the chassis. `wheel_right` and `wheel_up` are the axle
    /// and up axes of the wheel model; they are mapped onto the chassis axes before
    /// steering and spin apply.
    pub fn wheel_local_transform(&self, index: usize, wheel_right: Vec3, wheel_up: Vec3) -> Option<Isometry> {
        let w = self.wheels.get(index)?;
        let s = &w.settings;
        let model_right = wheel_right.try_normalize()?;
        let model_up = wheel_up.try_normalize()?;
        if model_right.dot(model_up).abs() > 1.0e-3 { return None; }
        let right = self.right();
        let model = Mat3::from_cols(model_right, model_up, model_right.cross(model_up));
        let chassis = Mat3::from_cols(right, self.up, right.cross(self.up));
        let basis = Quat::from_mat3a(&(chassis * model.transpose()));
        let steer = Quat::from_axis_angle(s.steering_axis.normalize().into(), -w.steer_angle);
        // Forward roll is a negative turn about the right axis.
        let spin = Quat::from_axis_angle(right.into(), -w.rotation_angle);
        let pos = s.position + s.suspension_direction.normalize() * w.suspension_length;
        Some(Isometry { pos, rot: (steer * spin * basis).normalize() })
    }

    /// Wheel pose in world space, given the chassis pose.
    pub fn wheel_world_transform(&self, index: usize, wheel_right: Vec3, wheel_up: Vec3, chassis: &Isometry) -> Option<Isometry> {
        self.wheel_local_transform(index, wheel_right, wheel_up).map(|local| chassis.mul_iso(&local))
    }
}

fn probe(
    w: &mut Wheel,
    xf: &Isometry,
    chassis: BodyId,
    layer: rigidframe_core::ObjectLayer,
    bodies: &BodyRegistry,
    broad_phase: &BroadPhase,
    policy: &LayerPolicy,
) {
    let s = w.settings;
    let origin = xf.transform_point(s.position);
    let dir = xf.transform_vector(s.suspension_direction.normalize());
    let reach = s.suspension_max_length + s.radius;
    let hit = cast_ray(broad_phase, bodies, origin, dir, reach, |id, other| {
        id != chassis && policy.objects_collide(layer, other)
    });
    match hit {
        Some(hit) => {
            w.suspension_length = (hit.distance - s.radius).clamp(0.0, s.suspension_max_length);
            w.contact = Some(WheelContact { body: hit.body, point: hit.point, normal: hit.normal, suspension_impulse: 0.0 });
        }
        None => {
            w.suspension_length = s.suspension_max_length;
            w.contact = None;
        }
    }
}

fn grounded(w: &mut Wheel, mut contact: WheelContact, c: &mut Body, g: &mut Body, drive: f32, f: &Frame) {
    let s = w.settings;
    let h = f.dt;
    let p = contact.point;
    let axis = -c.transform().transform_vector(s.suspension_direction.normalize());
    let rel_along = |c: &Body, g: &Body, n: Vec3| (c.velocity_at(p) - g.velocity_at(p)).dot(n);
    let weight = |c: &Body, g: &Body, n: Vec3| {
        positional_weight(c, p - c.position(), n) + positional_weight(g, p - g.position(), n)
    };

    let w_axis = weight(c, g, axis);
    if w_axis <= 0.0 {
        w.contact = Some(contact);
        return;
    }

    // Soft spring with rest length at full extension.
    let omega = TAU * s.suspension_spring.frequency;
    let k = f.sprung_mass * omega * omega;
    let damping = 2.0 * f.sprung_mass * s.suspension_spring.damping * omega;
    let gamma = 1.0 / (h * (damping + h * k));
    let err = w.suspension_length - s.suspension_max_length;
    let bias = err * h * k * gamma;
    let mut lambda = (-(rel_along(c, g, axis) + bias) / (w_axis + gamma)).max(0.0);
    apply_impulse_pair(c, g, p, p, axis * lambda);

    // Hard stop at minimum length.
    if w.suspension_length < s.suspension_min_length {
        let depth = s.suspension_min_length - w.suspension_length;
        solve_positional(c, g, p - c.position(), p - g.position(), axis * depth, 0.0);
        w.suspension_length = s.suspension_min_length;
        let vn = rel_along(c, g, axis);
        if vn < 0.0 {
            let stop = -vn / weight(c, g, axis).max(1.0e-9);
            apply_impulse_pair(c, g, p, p, axis * stop);
            lambda += stop;
        }
    }
    contact.suspension_impulse = lambda;

    // Friction basis on the contact plane.
    let n = contact.normal;
    let steer_axis = c.transform().transform_vector(s.steering_axis.normalize());
    let steered = Quat::from_axis_angle(steer_axis.into(), -w.steer_angle) * f.forward;
    let Some(long) = (steered - n * steered.dot(n)).try_normalize() else {
        w.contact = Some(contact);
        return;
    };
    let lat = n.cross(long);

    let brake_torque = f.brake * s.max_brake_torque + f.handbrake * s.max_hand_brake_torque;
    let w_long = weight(c, g, long);
    if w_long > 0.0 {
        let mut target = drive * h / s.radius;
        if brake_torque > 0.0 {
            let limit = brake_torque * h / s.radius;
            target += (-rel_along(c, g, long) / w_long).clamp(-limit, limit);
        }
        let max = s.longitudinal_friction * lambda;
        apply_impulse_pair(c, g, p, p, long * target.clamp(-max, max));
    }
    let w_lat = weight(c, g, lat);
    if w_lat > 0.0 {
        let max = s.lateral_friction * lambda;
        let impulse = (-rel_along(c, g, lat) / w_lat).clamp(-max, max);
        apply_impulse_pair(c, g, p, p, lat * impulse);
    }

    let locked = f.handbrake > 0.0 && s.max_hand_brake_torque > 0.0;
    w.angular_velocity = if locked { 0.0 } else { rel_along(c, g, long) / s.radius };
    w.contact = Some(contact);
}

fn airborne(w: &mut Wheel, drive: f32, f: &Frame) {
    let s = w.settings;
    w.angular_velocity += drive / s.inertia * f.dt;
    let brake_torque = f.brake * s.max_brake_torque + f.handbrake * s.max_hand_brake_torque;
    let slow = brake_torque / s.inertia * f.dt;
    w.angular_velocity = if w.angular_velocity.abs() <= slow { 0.0 } else { w.angular_velocity - slow * w.angular_velocity.signum() };
    w.angular_velocity *= (1.0 - s.angular_damping * f.dt).max(0.0);
}

impl Constraint for VehicleConstraint {
    fn kind(&self) -> ConstraintKind { ConstraintKind::Vehicle }
    fn bodies(&self) -> (BodyId, Option<BodyId>) { (self.chassis, None) }
    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_collision::Proxy;
    use rigidframe_core::{vec3, ObjectLayer};
    use rigidframe_dynamics::{integrate, update_velocities, Activation, BodyCreationSettings, MotionType};
    use rigidframe_geom::{BoxShapeSettings, ShapeSettings};

    struct Rig {
        bodies: BodyRegistry,
        bp: BroadPhase,
        policy: LayerPolicy,
        chassis: BodyId,
        vehicle: VehicleConstraint,
    }

    fn rig() -> Rig {
        let policy = LayerPolicy::collide_all();
        let mut bodies = BodyRegistry::new(8);
        let mut bp = BroadPhase::new(1);
        let ground_shape = BoxShapeSettings::new(vec3(50.0, 0.5, 50.0)).create().unwrap();
        let ground = bodies
            .create(&BodyCreationSettings::new(ground_shape, vec3(0.0, -0.5, 0.0), Quat::IDENTITY, MotionType::Static, ObjectLayer(0)))
            .unwrap();
        bodies.mark_added(ground, Activation::DontActivate).unwrap();
        let aabb = bodies.get(ground).unwrap().world_aabb();
        bp.insert(Proxy { body: ground, layer: ObjectLayer(0), aabb }, &policy);

        let chassis_shape = BoxShapeSettings::new(vec3(0.9, 0.2, 2.0)).create().unwrap();
        let chassis = bodies
            .create(
                &BodyCreationSettings::new(chassis_shape, vec3(0.0, 1.0, 0.0), Quat::IDENTITY, MotionType::Dynamic, ObjectLayer(0))
                    .with_mass(1500.0)
                    .with_sleeping(false),
            )
            .unwrap();
        bodies.mark_added(chassis, Activation::Activate).unwrap();

        let settings = VehicleConstraintSettings {
            wheels: vec![
                WheelSettings::at(vec3(0.0, -0.2, 1.6)).with_hand_brake_torque(0.0),
                WheelSettings::at(vec3(0.8, -0.2, -0.8)).with_max_steer_angle(0.0),
                WheelSettings::at(vec3(-0.8, -0.2, -0.8)).with_max_steer_angle(0.0),
            ],
            controller: WheeledControllerSettings { driven_wheels: vec![1, 2], ..Default::default() },
            ..Default::default()
        };
        let vehicle = settings.create(chassis, &bodies).unwrap();
        Rig { bodies, bp, policy, chassis, vehicle }
    }

    fn step(r: &mut Rig, frames: usize) {
        let g = vec3(0.0, -9.81, 0.0);
        let dt = 1.0 / 60.0;
        for _ in 0..frames {
            r.vehicle.update(dt, &mut r.bodies, &r.bp, &r.policy);
            let b = r.bodies.get_mut(r.chassis).unwrap();
            integrate(b, g, dt);
            update_velocities(b, dt);
        }
    }

    #[test]
    fn chassis_settles_on_suspension() {
        let mut r = rig();
        step(&mut r, 300);
        let y0 = r.bodies.get(r.chassis).unwrap().position().y;
        step(&mut r, 60);
        let y1 = r.bodies.get(r.chassis).unwrap().position().y;
        assert!((y1 - y0).abs() < 5e-3, "still moving: {y0} -> {y1}");
        // attach height 0.2 + radius 0.3 + suspension in [0.3, 0.5]
        assert!((0.8..=1.0).contains(&y1), "height {y1}");
        for w in r.vehicle.wheels() {
            assert!(w.has_contact());
            let len = w.suspension_length();
            assert!(len >= 0.3 && len <= 0.5, "suspension {len}");
        }
    }

    #[test]
    fn throttle_moves_forward_and_spins_wheels() {
        let mut r = rig();
        step(&mut r, 120);
        r.vehicle.set_driver_input(DriverInput { forward: 1.0, ..Default::default() });
        step(&mut r, 60);
        let b = r.bodies.get(r.chassis).unwrap();
        assert!(b.linear_velocity().z > 0.5);
        assert!(b.position().z > 0.0);
        assert!(r.vehicle.wheel(1).unwrap().angular_velocity() > 0.0);
    }

    #[test]
    fn airborne_wheels_report_full_extension() {
        let mut r = rig();
        r.bodies.get_mut(r.chassis).unwrap().set_transform(vec3(0.0, 10.0, 0.0), Quat::IDENTITY);
        r.vehicle.update(1.0 / 60.0, &mut r.bodies, &r.bp, &r.policy);
        for w in r.vehicle.wheels() {
            assert!(!w.has_contact());
            assert_eq!(w.suspension_length(), 0.5);
        }
    }

    #[test]
    fn steering_turns_front_wheel_pose() {
        let mut r = rig();
        r.vehicle.set_driver_input(DriverInput { steering: 1.0, ..Default::default() });
        r.vehicle.update(1.0 / 60.0, &mut r.bodies, &r.bp, &r.policy);
        assert!((r.vehicle.wheel(0).unwrap().steer_angle() - 70f32.to_radians()).abs() < 1e-5);
        assert_eq!(r.vehicle.wheel(1).unwrap().steer_angle(), 0.0);

        let chassis = r.bodies.get(r.chassis).unwrap().transform();
        let front = r.vehicle.wheel_world_transform(0, Vec3::X, Vec3::Y, &chassis).unwrap();
        let rear = r.vehicle.wheel_world_transform(1, Vec3::X, Vec3::Y, &chassis).unwrap();
        let axle = |xf: &Isometry| xf.transform_vector(Vec3::X);
        assert!(axle(&rear).dot(Vec3::X).abs() > 0.99);
        assert!(axle(&front).dot(Vec3::X).abs() < 0.5);
        // Wheel hangs below its attach point.
        assert!(front.pos.y < chassis.transform_point(vec3(0.0, -0.2, 1.6)).y);
    }

    #[test]
    fn settings_are_validated() {
        let r = rig();
        let mut s = VehicleConstraintSettings { wheels: vec![WheelSettings::default()], ..Default::default() };
        s.wheels[0].suspension_min_length = 0.6;
        assert!(matches!(s.create(r.chassis, &r.bodies), Err(PhysicsError::InvalidConstraint(_))));

        let s = VehicleConstraintSettings {
            wheels: vec![WheelSettings::default()],
            controller: WheeledControllerSettings { driven_wheels: vec![3], ..Default::default() },
            ..Default::default()
        };
        assert!(s.create(r.chassis, &r.bodies).is_err());
        assert!(VehicleConstraintSettings::default().create(r.chassis, &r.bodies).is_err());
    }

    #[test]
    fn idle_vehicle_does_not_wake_sleeping_chassis() {
        let mut r = rig();
        r.bodies.deactivate(r.chassis).unwrap();
        r.vehicle.update(1.0 / 60.0, &mut r.bodies, &r.bp, &r.policy);
        assert!(!r.bodies.get(r.chassis).unwrap().is_active());
        r.vehicle.set_driver_input(DriverInput { forward: 1.0, ..Default::default() });
        r.vehicle.update(1.0 / 60.0, &mut r.bodies, &r.bp, &r.policy);
        assert!(r.bodies.get(r.chassis).unwrap().is_active());
    }
}
