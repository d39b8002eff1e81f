use glam::Quat;
use rigidframe_core::types::Vec3;

use crate::body::{Body, MotionType};

/// Predict step: remember the pose, then advance it by the current velocity.
pub fn integrate(b: &mut Body, gravity: Vec3, h: f32) {
    b.prev_pos = b.pos;
    b.prev_rot = b.rot;
    match b.motion_type() {
        MotionType::Static => return,
        MotionType::Kinematic => {}
        MotionType::Dynamic => {
            b.lin_vel += gravity * (b.gravity_factor * h);
            b.lin_vel *= (1.0 - b.linear_damping * h).max(0.0);
            b.ang_vel *= (1.0 - b.angular_damping * h).max(0.0);
            b.lin_vel = b.lin_vel.clamp_length_max(b.max_linear_velocity);
            b.ang_vel = b.ang_vel.clamp_length_max(b.max_angular_velocity);
        }
    }
    b.pre_lin_vel = b.lin_vel;
    b.pre_ang_vel = b.ang_vel;

    b.pos += b.lin_vel * h;

    // angular momentum is carried across the orientation update
    let momentum = (b.gyroscopic && b.is_dynamic()).then(|| b.inertia_world() * b.ang_vel);
    let dq = Quat::from_scaled_axis((b.ang_vel * h).into());
    b.rot = (dq * b.rot).normalize();
    b.gyro_delta = match momentum {
        Some(l) => {
            let w = b.inv_inertia_world() * l;
            let delta = w - b.ang_vel;
            b.ang_vel = w;
            delta
        }
        None => Vec3::ZERO,
    };
}

/// Derive velocities from the solved pose.
pub fn update_velocities(b: &mut Body, h: f32) {
    if !b.is_dynamic() || h <= 0.0 { return; }
    b.lin_vel = (b.pos - b.prev_pos) / h;
    let mut dq = b.rot * b.prev_rot.conjugate();
    if dq.w < 0.0 { dq = -dq; }
    let v = Vec3::new(dq.x, dq.y, dq.z);
    let s = v.length();
    let scaled_axis = if s > 1.0e-9 { v * (2.0 * s.atan2(dq.w) / s) } else { v * 2.0 };
    b.ang_vel = scaled_axis / h + b.gyro_delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyCreationSettings;
    use rigidframe_core::{vec3, ObjectLayer};
    use rigidframe_geom::{BoxShapeSettings, ShapeSettings};

    fn body(motion: MotionType, half: Vec3) -> Body {
        let shape = BoxShapeSettings::new(half).with_convex_radius(0.0).create().unwrap();
        let s = BodyCreationSettings::new(shape, Vec3::ZERO, Quat::IDENTITY, motion, ObjectLayer(0)).with_damping(0.0, 0.0);
        Body::from_settings(&s)
    }

    #[test]
    fn free_fall_matches_semi_implicit_euler() {
        let mut b = body(MotionType::Dynamic, Vec3::splat(0.5));
        let g = vec3(0.0, -10.0, 0.0);
        let h = 0.01;
        for _ in 0..100 {
            integrate(&mut b, g, h);
            update_velocities(&mut b, h);
        }
        assert!((b.linear_velocity().y + 10.0).abs() < 1e-3);
        assert!((b.position().y + 5.05).abs() < 1e-2);
    }

    #[test]
    fn static_and_kinematic() {
        let mut s = body(MotionType::Static, Vec3::splat(0.5));
        integrate(&mut s, vec3(0.0, -10.0, 0.0), 0.1);
        assert_eq!(s.position(), Vec3::ZERO);

        let mut k = body(MotionType::Kinematic, Vec3::splat(0.5));
        k.set_velocities(vec3(1.0, 0.0, 0.0), Vec3::ZERO);
        integrate(&mut k, vec3(0.0, -10.0, 0.0), 0.5);
        update_velocities(&mut k, 0.5);
        assert!((k.position() - vec3(0.5, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(k.linear_velocity(), vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn spin_recovered_from_pose_difference() {
        let mut b = body(MotionType::Dynamic, Vec3::splat(0.5));
        b.set_velocities(Vec3::ZERO, vec3(0.0, 2.0, 0.0));
        integrate(&mut b, Vec3::ZERO, 0.01);
        update_velocities(&mut b, 0.01);
        assert!((b.angular_velocity() - vec3(0.0, 2.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn gyroscopic_keeps_momentum_magnitude() {
        let mut b = body(MotionType::Dynamic, vec3(0.15, 0.05, 0.1));
        b.gyroscopic = true;
        b.set_velocities(Vec3::ZERO, vec3(0.3, 0.0, 5.0));
        let l0 = (b.inertia_world() * b.angular_velocity()).length();
        for _ in 0..600 {
            integrate(&mut b, Vec3::ZERO, 1.0 / 240.0);
            update_velocities(&mut b, 1.0 / 240.0);
        }
        let l1 = (b.inertia_world() * b.angular_velocity()).length();
        assert!((l1 - l0).abs() / l0 < 1e-2);
    }
}
