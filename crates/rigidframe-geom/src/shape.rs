use std::sync::Arc;

use glam::Mat3A;
use rigidframe_core::types::{Isometry, Vec3, Mat3};
use thiserror::Error;

use crate::aabb::Aabb;
use crate::mass::MassProps;
use crate::ray::RayHit;

pub const DEFAULT_CONVEX_RADIUS: f32 = 0.05;
const DEFAULT_DENSITY: f32 = 1000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("extent {0} must be finite and positive")]
    NonPositiveExtent(f32),
    #[error("convex radius {radius} must be in [0, {max}]")]
    InvalidConvexRadius { radius: f32, max: f32 },
    #[error("density {0} must be finite and positive")]
    NonPositiveDensity(f32),
}

impl From<ShapeError> for rigidframe_core::PhysicsError {
    fn from(e: ShapeError) -> Self { rigidframe_core::PhysicsError::InvalidShape(e.to_string()) }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Box { half_extents: Vec3, convex_radius: f32 },
    Sphere { radius: f32 },
}

/// Immutable collision geometry. Shared between bodies through `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    density: f32,
    mass: MassProps,
}

/// Validated construction of a [`Shape`].
pub trait ShapeSettings {
    fn create(&self) -> Result<Arc<Shape>, ShapeError>;
}

#[derive(Copy, Clone, Debug)]
pub struct BoxShapeSettings {
    pub half_extents: Vec3,
    pub convex_radius: f32,
    pub density: f32,
}

impl BoxShapeSettings {
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents, convex_radius: DEFAULT_CONVEX_RADIUS, density: DEFAULT_DENSITY }
    }
    pub fn with_convex_radius(mut self, r: f32) -> Self { self.convex_radius = r; self }
    pub fn with_density(mut self, d: f32) -> Self { self.density = d; self }
}

impl ShapeSettings for BoxShapeSettings {
    fn create(&self) -> Result<Arc<Shape>, ShapeError> {
        for e in [self.half_extents.x, self.half_extents.y, self.half_extents.z] {
            if !(e.is_finite() && e > 0.0) { return Err(ShapeError::NonPositiveExtent(e)); }
        }
        check_density(self.density)?;
        let max = self.half_extents.min_element();
        if !(self.convex_radius >= 0.0 && self.convex_radius <= max) {
            return Err(ShapeError::InvalidConvexRadius { radius: self.convex_radius, max });
        }
        Ok(Arc::new(Shape {
            kind: ShapeKind::Box { half_extents: self.half_extents, convex_radius: self.convex_radius },
            density: self.density,
            mass: MassProps::from_box(self.half_extents, self.density),
        }))
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SphereShapeSettings {
    pub radius: f32,
    pub density: f32,
}

impl SphereShapeSettings {
    pub fn new(radius: f32) -> Self { Self { radius, density: DEFAULT_DENSITY } }
    pub fn with_density(mut self, d: f32) -> Self { self.density = d; self }
}

impl ShapeSettings for SphereShapeSettings {
    fn create(&self) -> Result<Arc<Shape>, ShapeError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ShapeError::NonPositiveExtent(self.radius));
        }
        check_density(self.density)?;
        Ok(Arc::new(Shape {
            kind: ShapeKind::Sphere { radius: self.radius },
            density: self.density,
            mass: MassProps::from_sphere(self.radius, self.density),
        }))
    }
}

fn check_density(d: f32) -> Result<(), ShapeError> {
    if d.is_finite() && d > 0.0 { Ok(()) } else { Err(ShapeError::NonPositiveDensity(d)) }
}

impl Shape {
    #[inline] pub fn kind(&self) -> &ShapeKind { &self.kind }
    #[inline] pub fn density(&self) -> f32 { self.density }
    #[inline] pub fn mass_props(&self) -> MassProps { self.mass }

    #[inline]
    pub fn convex_radius(&self) -> f32 {
        match self.kind {
            ShapeKind::Box { convex_radius, .. } => convex_radius,
            ShapeKind::Sphere { .. } => 0.0,
        }
    }

    /// Half extents of the local bounding box.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        match self.kind {
            ShapeKind::Box { half_extents, .. } => half_extents,
            ShapeKind::Sphere { radius } => Vec3::splat(radius),
        }
    }

    /// Radius of the smallest sphere around the local origin containing the shape.
    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        match self.kind {
            ShapeKind::Box { half_extents, .. } => half_extents.length(),
            ShapeKind::Sphere { radius } => radius,
        }
    }

    pub fn aabb(&self, xf: &Isometry) -> Aabb {
        match self.kind {
            ShapeKind::Sphere { radius } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(radius)),
            ShapeKind::Box { half_extents, .. } => {
                let rot = Mat3A::from_quat(xf.rot);
                let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
                Aabb::from_center_half_extents(xf.pos, m * half_extents)
            }
        }
    }

    /// Ray in world space against this shape placed at `xf`. `dir` must be unit length.
    pub fn cast_ray(&self, xf: &Isometry, origin: Vec3, dir: Vec3, max_t: f32) -> Option<RayHit> {
        let lo = xf.inverse_transform_point(origin);
        let ld = xf.inverse_transform_vector(dir);
        let hit = match self.kind {
            ShapeKind::Box { half_extents, .. } => crate::ray::ray_box_local(lo, ld, half_extents, max_t)?,
            ShapeKind::Sphere { radius } => crate::ray::ray_sphere_local(lo, ld, radius, max_t)?,
        };
        Some(RayHit { t: hit.t, normal: xf.transform_vector(hit.normal) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::{vec3, iso, Quat};

    #[test]
    fn box_validation() {
        assert!(BoxShapeSettings::new(vec3(1.0, 0.2, 1.0)).create().is_ok());
        let thin = BoxShapeSettings::new(vec3(0.5, 0.025, 0.025)).create();
        assert!(matches!(thin, Err(ShapeError::InvalidConvexRadius { .. })));
        let ok = BoxShapeSettings::new(vec3(0.5, 0.025, 0.025)).with_convex_radius(0.01).create();
        assert!(ok.is_ok());
        assert!(matches!(BoxShapeSettings::new(vec3(0.0, 1.0, 1.0)).create(), Err(ShapeError::NonPositiveExtent(_))));
        assert!(matches!(SphereShapeSettings::new(1.0).with_density(-1.0).create(), Err(ShapeError::NonPositiveDensity(_))));
    }

    #[test]
    fn rotated_box_aabb_grows() {
        let s = BoxShapeSettings::new(vec3(1.0, 0.1, 0.1)).with_convex_radius(0.0).create().unwrap();
        let a = s.aabb(&iso(Vec3::ZERO, Quat::from_rotation_z(core::f32::consts::FRAC_PI_2)));
        assert!((a.max.y - 1.0).abs() < 1e-5);
        assert!((a.max.x - 0.1).abs() < 1e-5);
    }

    #[test]
    fn world_ray_hits_box_top() {
        let s = BoxShapeSettings::new(vec3(10.0, 0.5, 10.0)).create().unwrap();
        let xf = iso(vec3(0.0, -0.5, 0.0), Quat::IDENTITY);
        let hit = s.cast_ray(&xf, vec3(1.0, 2.0, 1.0), vec3(0.0, -1.0, 0.0), 5.0).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.normal - vec3(0.0, 1.0, 0.0)).length() < 1e-5);
    }
}
