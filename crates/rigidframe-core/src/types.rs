use glam::{Vec3A, Mat3A, Quat, Affine3A};
use crate::Scalar;

pub type Vec3 = Vec3A;
pub type Mat3 = Mat3A;

#[inline] pub fn vec3(x: Scalar, y: Scalar, z: Scalar) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }

/// Rigid transform: rotation then translation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

impl Isometry {
    #[inline] pub fn transform_point(&self, p: Vec3) -> Vec3 { self.pos + self.rot * p }
    #[inline] pub fn transform_vector(&self, v: Vec3) -> Vec3 { self.rot * v }
    #[inline] pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 { self.rot.conjugate() * (p - self.pos) }
    #[inline] pub fn inverse_transform_vector(&self, v: Vec3) -> Vec3 { self.rot.conjugate() * v }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rot, self.pos.into())
    }

    /// `self * rhs`: apply `rhs` first.
    pub fn mul_iso(&self, rhs: &Isometry) -> Isometry {
        Isometry { pos: self.transform_point(rhs.pos), rot: (self.rot * rhs.rot).normalize() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_point_round_trips() {
        let t = iso(vec3(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let p = vec3(-0.4, 0.5, 2.0);
        assert!((t.inverse_transform_point(t.transform_point(p)) - p).length() < 1e-5);
    }

    #[test]
    fn affine_matches_isometry() {
        let t = iso(vec3(0.0, 1.0, 0.0), Quat::from_rotation_z(core::f32::consts::FRAC_PI_2));
        let a = t.to_affine();
        let p = a.transform_point3a(vec3(1.0, 0.0, 0.0));
        assert!((p - vec3(0.0, 2.0, 0.0)).length() < 1e-5);
    }
}
