use std::any::Any;

use rigidframe_core::types::Vec3;
use rigidframe_core::{BodyId, PhysicsError};
use rigidframe_dynamics::{xpbd, BodyRegistry};

use crate::constraint::{any_awake, check_pair, Constraint, ConstraintKind, ConstraintSettings};
use crate::spring::SpringSettings;

/// Keeps two anchor points between `min_distance` and `max_distance` apart.
#[derive(Copy, Clone, Debug)]
pub struct DistanceConstraintSettings {
    pub point1: Vec3,
    pub point2: Vec3,
    /// `None` uses the distance at creation.
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    /// Softens the limits. Zero frequency is rigid.
    pub limits_spring: SpringSettings,
}

impl DistanceConstraintSettings {
    pub fn new(point1: Vec3, point2: Vec3) -> Self {
        Self { point1, point2, min_distance: None, max_distance: None, limits_spring: SpringSettings::default() }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min_distance = Some(min);
        self.max_distance = Some(max);
        self
    }

    pub fn with_spring(mut self, spring: SpringSettings) -> Self { self.limits_spring = spring; self }
}

impl ConstraintSettings for DistanceConstraintSettings {
    type Output = DistanceConstraint;

    fn create(&self, a: BodyId, b: BodyId, bodies: &BodyRegistry) -> Result<DistanceConstraint, PhysicsError> {
        check_pair(a, b, bodies)?;
        let current = (self.point2 - self.point1).length();
        let min = self.min_distance.unwrap_or(current);
        let max = self.max_distance.unwrap_or(current);
        if !(min >= 0.0 && min <= max && max.is_finite()) {
            return Err(PhysicsError::InvalidConstraint(format!("distance range [{min}, {max}] is invalid")));
        }
        if self.limits_spring.frequency < 0.0 || self.limits_spring.damping < 0.0 {
            return Err(PhysicsError::InvalidConstraint("spring parameters must be non-negative".into()));
        }
        let ta = bodies.get(a)?.transform();
        let tb = bodies.get(b)?.transform();
        Ok(DistanceConstraint {
            a, b,
            local_a: ta.inverse_transform_point(self.point1),
            local_b: tb.inverse_transform_point(self.point2),
            min, max,
            spring: self.limits_spring,
        })
    }
}

#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    a: BodyId,
    b: BodyId,
    local_a: Vec3,
    local_b: Vec3,
    min: f32,
    max: f32,
    spring: SpringSettings,
}

impl DistanceConstraint {
    pub fn range(&self) -> (f32, f32) { (self.min, self.max) }

    pub fn current_distance(&self, bodies: &BodyRegistry) -> Result<f32, PhysicsError> {
        let ta = bodies.get(self.a)?.transform();
        let tb = bodies.get(self.b)?.transform();
        Ok((tb.transform_point(self.local_b) - ta.transform_point(self.local_a)).length())
    }
}

impl Constraint for DistanceConstraint {
    fn kind(&self) -> ConstraintKind { ConstraintKind::Distance }
    fn bodies(&self) -> (BodyId, Option<BodyId>) { (self.a, Some(self.b)) }

    fn solve_position(&mut self, bodies: &mut BodyRegistry, h: f32) {
        let Ok((a, b)) = bodies.pair_mut(self.a, self.b) else { return };
        if !any_awake(a, b) { return; }

        let (ta, tb) = (a.transform(), b.transform());
        let p1 = ta.transform_point(self.local_a);
        let p2 = tb.transform_point(self.local_b);
        let d = p2 - p1;
        let len = d.length();
        if len <= 1.0e-6 { return; }
        let c = if len < self.min { len - self.min } else if len > self.max { len - self.max } else { return };
        let n = d / len;
        let (ra, rb) = (p1 - ta.pos, p2 - tb.pos);

        let w = xpbd::positional_weight(a, ra, n) + xpbd::positional_weight(b, rb, n);
        let (alpha_tilde, gamma) = self.spring.xpbd_terms(w, h);
        let dc = if gamma > 0.0 {
            let q1 = a.prev_transform().transform_point(self.local_a);
            let q2 = b.prev_transform().transform_point(self.local_b);
            ((p2 - q2) - (p1 - q1)).dot(n)
        } else {
            0.0
        };
        xpbd::solve_linear(a, b, ra, rb, n, c, alpha_tilde, gamma, dc);
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
