//! XPBD position and orientation corrections between two bodies.
//!
//! Conventions: a correction `p` moves A by `+p` and B by `-p`, each scaled by its
//! generalized inverse mass. Static and kinematic bodies have zero inverse mass.

use rigidframe_core::types::Vec3;

use crate::body::Body;

/// `w = 1/m + (r × n) · I⁻¹ (r × n)`
#[inline]
pub fn positional_weight(b: &Body, r: Vec3, n: Vec3) -> f32 {
    if b.inv_mass == 0.0 { return 0.0; }
    let rn = r.cross(n);
    b.inv_mass + rn.dot(b.inv_inertia_world() * rn)
}

/// `w = n · I⁻¹ n`
#[inline]
pub fn angular_weight(b: &Body, n: Vec3) -> f32 {
    if b.inv_mass == 0.0 { return 0.0; }
    n.dot(b.inv_inertia_world() * n)
}

/// Scalar form with damping. `c` is how far A should move along `n`, `dc` how much
/// `c` grew since the previous substep. Returns the applied multiplier.
#[allow(clippy::too_many_arguments)]
pub fn solve_linear(
    a: &mut Body, b: &mut Body,
    ra: Vec3, rb: Vec3,
    n: Vec3, c: f32,
    alpha_tilde: f32, gamma: f32, dc: f32,
) -> f32 {
    let w = positional_weight(a, ra, n) + positional_weight(b, rb, n);
    if w <= 0.0 { return 0.0; }
    let lambda = (c + gamma * dc) / ((1.0 + gamma) * w + alpha_tilde);
    apply_linear(a, b, ra, rb, n * lambda);
    lambda
}

/// Close the gap `e` (A should move toward `+e`). Returns the multiplier.
pub fn solve_positional(a: &mut Body, b: &mut Body, ra: Vec3, rb: Vec3, e: Vec3, alpha_tilde: f32) -> f32 {
    let c = e.length();
    if c <= 1.0e-9 { return 0.0; }
    solve_linear(a, b, ra, rb, e / c, c, alpha_tilde, 0.0, 0.0)
}

/// Rotate A by `+dphi` and B by `-dphi`, weighted. Returns the multiplier.
pub fn solve_angular(a: &mut Body, b: &mut Body, dphi: Vec3, alpha_tilde: f32) -> f32 {
    let theta = dphi.length();
    if theta <= 1.0e-9 { return 0.0; }
    let n = dphi / theta;
    let w = angular_weight(a, n) + angular_weight(b, n);
    if w <= 0.0 { return 0.0; }
    let lambda = theta / (w + alpha_tilde);
    let p = n * lambda;
    if a.inv_mass > 0.0 { let d = a.inv_inertia_world() * p; a.apply_orientation_delta(d); }
    if b.inv_mass > 0.0 { let d = b.inv_inertia_world() * p; b.apply_orientation_delta(-d); }
    lambda
}

/// Positional impulse `p` at the given arms.
pub fn apply_linear(a: &mut Body, b: &mut Body, ra: Vec3, rb: Vec3, p: Vec3) {
    if a.inv_mass > 0.0 {
        let dtheta = a.inv_inertia_world() * ra.cross(p);
        a.pos += p * a.inv_mass;
        a.apply_orientation_delta(dtheta);
    }
    if b.inv_mass > 0.0 {
        let dtheta = b.inv_inertia_world() * rb.cross(p);
        b.pos -= p * b.inv_mass;
        b.apply_orientation_delta(-dtheta);
    }
}

/// Velocity-level impulse `p` on A and `-p` on B at world points.
pub fn apply_impulse_pair(a: &mut Body, b: &mut Body, pa: Vec3, pb: Vec3, p: Vec3) {
    a.apply_impulse_at(p, pa);
    b.apply_impulse_at(-p, pb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use rigidframe_core::{vec3, ObjectLayer};
    use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
    use crate::body::{BodyCreationSettings, MotionType};

    fn cube(motion: MotionType, pos: Vec3) -> Body {
        let shape = BoxShapeSettings::new(Vec3::splat(0.5)).create().unwrap();
        Body::from_settings(&BodyCreationSettings::new(shape, pos, Quat::IDENTITY, motion, ObjectLayer(0)))
    }

    #[test]
    fn rigid_correction_closes_gap_between_equal_bodies() {
        let mut a = cube(MotionType::Dynamic, Vec3::ZERO);
        let mut b = cube(MotionType::Dynamic, vec3(3.0, 0.0, 0.0));
        let e = b.position() - a.position() - vec3(1.0, 0.0, 0.0);
        solve_positional(&mut a, &mut b, Vec3::ZERO, Vec3::ZERO, e, 0.0);
        assert!((a.position().x - 1.0).abs() < 1e-5);
        assert!((b.position().x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn static_partner_takes_nothing() {
        let mut a = cube(MotionType::Dynamic, Vec3::ZERO);
        let mut s = cube(MotionType::Static, vec3(0.0, -2.0, 0.0));
        solve_positional(&mut a, &mut s, Vec3::ZERO, Vec3::ZERO, vec3(0.0, 0.5, 0.0), 0.0);
        assert!((a.position().y - 0.5).abs() < 1e-5);
        assert_eq!(s.position(), vec3(0.0, -2.0, 0.0));
    }

    #[test]
    fn compliance_softens() {
        let mut a = cube(MotionType::Dynamic, Vec3::ZERO);
        let mut s = cube(MotionType::Static, Vec3::ZERO);
        let w = positional_weight(&a, Vec3::ZERO, Vec3::X);
        solve_positional(&mut a, &mut s, Vec3::ZERO, Vec3::ZERO, Vec3::X, w);
        assert!((a.position().x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn angular_alignment() {
        let mut a = cube(MotionType::Dynamic, Vec3::ZERO);
        let mut s = cube(MotionType::Static, Vec3::ZERO);
        solve_angular(&mut a, &mut s, vec3(0.0, 0.0, 0.01), 0.0);
        let (axis, angle) = a.rotation().to_axis_angle();
        assert!((angle - 0.01).abs() < 1e-4);
        assert!(axis.z > 0.99);
    }
}
