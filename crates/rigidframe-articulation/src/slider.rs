use std::any::Any;

use glam::Quat;
use rigidframe_core::types::Vec3;
use rigidframe_core::{BodyId, PhysicsError};
use rigidframe_dynamics::{xpbd, BodyRegistry};

use crate::constraint::{any_awake, check_pair, Constraint, ConstraintKind, ConstraintSettings};

/// Prismatic joint: relative rotation is frozen and B may only translate along the axis.
#[derive(Copy, Clone, Debug)]
pub struct SliderConstraintSettings {
    /// Use the midpoint of the two bodies instead of `point1`/`point2`.
    pub auto_detect_point: bool,
    pub point1: Vec3,
    pub point2: Vec3,
    pub slider_axis1: Vec3,
    pub slider_axis2: Vec3,
    pub limits_min: f32,
    pub limits_max: f32,
}

impl Default for SliderConstraintSettings {
    fn default() -> Self {
        Self {
            auto_detect_point: false,
            point1: Vec3::ZERO,
            point2: Vec3::ZERO,
            slider_axis1: Vec3::X,
            slider_axis2: Vec3::X,
            limits_min: f32::NEG_INFINITY,
            limits_max: f32::INFINITY,
        }
    }
}

impl SliderConstraintSettings {
    pub fn set_slider_axis(&mut self, axis: Vec3) {
        self.slider_axis1 = axis;
        self.slider_axis2 = axis;
    }

    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.limits_min = min;
        self.limits_max = max;
        self
    }
}

impl ConstraintSettings for SliderConstraintSettings {
    type Output = SliderConstraint;

    fn create(&self, a: BodyId, b: BodyId, bodies: &BodyRegistry) -> Result<SliderConstraint, PhysicsError> {
        check_pair(a, b, bodies)?;
        let axis = self.slider_axis1.try_normalize()
            .ok_or_else(|| PhysicsError::InvalidConstraint("slider axis must be non-zero".into()))?;
        if self.limits_min > self.limits_max {
            return Err(PhysicsError::InvalidConstraint("slider limits are inverted".into()));
        }
        let ta = bodies.get(a)?.transform();
        let tb = bodies.get(b)?.transform();
        let (p1, p2) = if self.auto_detect_point {
            let mid = (ta.pos + tb.pos) * 0.5;
            (mid, mid)
        } else {
            (self.point1, self.point2)
        };
        Ok(SliderConstraint {
            a, b,
            local_a: ta.inverse_transform_point(p1),
            local_b: tb.inverse_transform_point(p2),
            axis_a: ta.inverse_transform_vector(axis),
            rel_rot: ta.rot.conjugate() * tb.rot,
            limits: (self.limits_min, self.limits_max),
        })
    }
}

#[derive(Clone, Debug)]
pub struct SliderConstraint {
    a: BodyId,
    b: BodyId,
    local_a: Vec3,
    local_b: Vec3,
    axis_a: Vec3,
    rel_rot: Quat,
    limits: (f32, f32),
}

impl SliderConstraint {
    /// Offset of B's anchor from A's, along the slider axis.
    pub fn current_position(&self, bodies: &BodyRegistry) -> Result<f32, PhysicsError> {
        let ta = bodies.get(self.a)?.transform();
        let tb = bodies.get(self.b)?.transform();
        let e = tb.transform_point(self.local_b) - ta.transform_point(self.local_a);
        Ok(e.dot(ta.transform_vector(self.axis_a)))
    }
}

impl Constraint for SliderConstraint {
    fn kind(&self) -> ConstraintKind { ConstraintKind::Slider }
    fn bodies(&self) -> (BodyId, Option<BodyId>) { (self.a, Some(self.b)) }

    fn solve_position(&mut self, bodies: &mut BodyRegistry, _h: f32) {
        let Ok((a, b)) = bodies.pair_mut(self.a, self.b) else { return };
        if !any_awake(a, b) { return; }

        let target = a.rotation() * self.rel_rot;
        let mut err = b.rotation() * target.conjugate();
        if err.w < 0.0 { err = -err; }
        xpbd::solve_angular(a, b, Vec3::new(err.x, err.y, err.z) * 2.0, 0.0);

        let ta = a.transform();
        let tb = b.transform();
        let axis = ta.transform_vector(self.axis_a);
        let p1 = ta.transform_point(self.local_a);
        let p2 = tb.transform_point(self.local_b);
        let e = p2 - p1;
        let along = e.dot(axis);
        xpbd::solve_positional(a, b, p1 - ta.pos, p2 - tb.pos, e - axis * along, 0.0);

        let (lo, hi) = self.limits;
        if along < lo || along > hi {
            let ta = a.transform();
            let tb = b.transform();
            let p1 = ta.transform_point(self.local_a);
            let p2 = tb.transform_point(self.local_b);
            let along = (p2 - p1).dot(axis);
            let excess = if along < lo { along - lo } else { along - hi };
            xpbd::solve_positional(a, b, p1 - ta.pos, p2 - tb.pos, axis * excess, 0.0);
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::vec3;
    use crate::test_util::{bar, run_substeps, ground};

    #[test]
    fn only_moves_along_axis() {
        let (mut reg, base) = ground();
        let cube = bar(&mut reg, vec3(0.0, 0.1, 0.0), Vec3::splat(0.05));
        let mut s = SliderConstraintSettings { auto_detect_point: true, ..Default::default() };
        s.set_slider_axis(Vec3::Y);
        let mut slider = s.create(base, cube, &reg).unwrap();
        reg.get_mut(cube).unwrap().set_velocities(vec3(1.0, 0.0, 0.5), vec3(0.0, 3.0, 0.0));

        run_substeps(&mut reg, &mut [&mut slider], vec3(0.0, -1.0, 0.0), 1.0 / 480.0, 240);

        let t = reg.get(cube).unwrap().transform();
        assert!(t.pos.x.abs() < 1e-3 && t.pos.z.abs() < 1e-3, "drifted to {:?}", t.pos);
        assert!(t.pos.y < 0.1);
        assert!(t.rot.angle_between(Quat::IDENTITY) < 1e-3);
    }

    #[test]
    fn limits_stop_travel() {
        let (mut reg, base) = ground();
        let cube = bar(&mut reg, vec3(0.0, 0.5, 0.0), Vec3::splat(0.05));
        let mut s = SliderConstraintSettings { auto_detect_point: true, ..Default::default() }.with_limits(-0.2, 0.2);
        s.set_slider_axis(Vec3::Y);
        let mut slider = s.create(base, cube, &reg).unwrap();
        run_substeps(&mut reg, &mut [&mut slider], vec3(0.0, -9.81, 0.0), 1.0 / 480.0, 480);
        let d = slider.current_position(&reg).unwrap();
        assert!(d > -0.21, "travel {d}");
    }
}
