use std::any::Any;
use std::f32::consts::PI;

use glam::Quat;
use rigidframe_core::types::Vec3;
use rigidframe_core::{BodyId, PhysicsError};
use rigidframe_dynamics::{xpbd, BodyRegistry};

use crate::constraint::{any_awake, check_pair, Constraint, ConstraintKind, ConstraintSettings};

/// Revolute joint. Points and axes are given in world space at creation time.
#[derive(Copy, Clone, Debug)]
pub struct HingeConstraintSettings {
    pub point1: Vec3,
    pub point2: Vec3,
    pub hinge_axis1: Vec3,
    pub hinge_axis2: Vec3,
    /// Perpendicular to the hinge axis. Zero angle is where the two normals agree.
    pub normal_axis1: Vec3,
    pub normal_axis2: Vec3,
    pub limits_min: f32,
    pub limits_max: f32,
}

impl HingeConstraintSettings {
    /// Shared pivot and axis. Normals are picked perpendicular to the axis.
    pub fn new(point: Vec3, axis: Vec3) -> Self {
        let axis = axis.normalize_or_zero();
        let normal = axis.any_orthonormal_vector();
        Self {
            point1: point, point2: point,
            hinge_axis1: axis, hinge_axis2: axis,
            normal_axis1: normal, normal_axis2: normal,
            limits_min: -PI, limits_max: PI,
        }
    }

    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.limits_min = min;
        self.limits_max = max;
        self
    }
}

impl ConstraintSettings for HingeConstraintSettings {
    type Output = HingeConstraint;

    fn create(&self, a: BodyId, b: BodyId, bodies: &BodyRegistry) -> Result<HingeConstraint, PhysicsError> {
        check_pair(a, b, bodies)?;
        for v in [self.hinge_axis1, self.hinge_axis2, self.normal_axis1, self.normal_axis2] {
            if v.length_squared() < 1.0e-8 || !v.is_finite() {
                return Err(PhysicsError::InvalidConstraint("hinge axes must be non-zero".into()));
            }
        }
        if self.hinge_axis1.normalize().dot(self.normal_axis1.normalize()).abs() > 1.0e-3 {
            return Err(PhysicsError::InvalidConstraint("hinge normal must be perpendicular to the axis".into()));
        }
        if self.limits_min > self.limits_max {
            return Err(PhysicsError::InvalidConstraint("hinge limits are inverted".into()));
        }
        let ta = bodies.get(a)?.transform();
        let tb = bodies.get(b)?.transform();
        Ok(HingeConstraint {
            a, b,
            local_a: ta.inverse_transform_point(self.point1),
            local_b: tb.inverse_transform_point(self.point2),
            axis_a: ta.inverse_transform_vector(self.hinge_axis1.normalize()),
            axis_b: tb.inverse_transform_vector(self.hinge_axis2.normalize()),
            normal_a: ta.inverse_transform_vector(self.normal_axis1.normalize()),
            normal_b: tb.inverse_transform_vector(self.normal_axis2.normalize()),
            limits: (self.limits_min > -PI || self.limits_max < PI).then_some((self.limits_min, self.limits_max)),
        })
    }
}

#[derive(Clone, Debug)]
pub struct HingeConstraint {
    a: BodyId,
    b: BodyId,
    local_a: Vec3,
    local_b: Vec3,
    axis_a: Vec3,
    axis_b: Vec3,
    normal_a: Vec3,
    normal_b: Vec3,
    limits: Option<(f32, f32)>,
}

impl HingeConstraint {
    pub fn local_anchors(&self) -> (Vec3, Vec3) { (self.local_a, self.local_b) }

    /// Signed angle of body B's normal relative to body A's, about A's hinge axis.
    pub fn current_angle(&self, bodies: &BodyRegistry) -> Result<f32, PhysicsError> {
        let ta = bodies.get(self.a)?.transform();
        let tb = bodies.get(self.b)?.transform();
        let axis = ta.transform_vector(self.axis_a);
        let n1 = ta.transform_vector(self.normal_a);
        let n2 = tb.transform_vector(self.normal_b);
        Ok(n1.cross(n2).dot(axis).atan2(n1.dot(n2)))
    }
}

impl Constraint for HingeConstraint {
    fn kind(&self) -> ConstraintKind { ConstraintKind::Hinge }
    fn bodies(&self) -> (BodyId, Option<BodyId>) { (self.a, Some(self.b)) }

    fn solve_position(&mut self, bodies: &mut BodyRegistry, _h: f32) {
        let Ok((a, b)) = bodies.pair_mut(self.a, self.b) else { return };
        if !any_awake(a, b) { return; }

        let a1 = a.rotation() * self.axis_a;
        let a2 = b.rotation() * self.axis_b;
        xpbd::solve_angular(a, b, a1.cross(a2), 0.0);

        if let Some((lo, hi)) = self.limits {
            let axis = a.rotation() * self.axis_a;
            let n1 = a.rotation() * self.normal_a;
            let n2 = b.rotation() * self.normal_b;
            let phi = n1.cross(n2).dot(axis).atan2(n1.dot(n2));
            if phi < lo || phi > hi {
                let target = Quat::from_axis_angle(axis.into(), phi.clamp(lo, hi)) * n1;
                xpbd::solve_angular(a, b, target.cross(n2), 0.0);
            }
        }

        let ta = a.transform();
        let tb = b.transform();
        let p1 = ta.transform_point(self.local_a);
        let p2 = tb.transform_point(self.local_b);
        xpbd::solve_positional(a, b, p1 - ta.pos, p2 - tb.pos, p2 - p1, 0.0);
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
