use rigidframe_core::{Arena, BodyId, ConstraintId, PhysicsError};
use rigidframe_dynamics::BodyRegistry;

use crate::constraint::Constraint;

/// Constraints in registration order. Solving visits live slots in slot order.
#[derive(Default)]
pub struct ConstraintGraph {
    constraints: Arena<ConstraintId, Box<dyn Constraint>>,
}

impl ConstraintGraph {
    pub fn new() -> Self { Self { constraints: Arena::new() } }

    #[inline] pub fn len(&self) -> usize { self.constraints.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.constraints.is_empty() }
    #[inline] pub fn contains(&self, id: ConstraintId) -> bool { self.constraints.contains(id) }

    /// Participants must still exist in `bodies`.
    pub fn add(&mut self, c: Box<dyn Constraint>, bodies: &BodyRegistry) -> Result<ConstraintId, PhysicsError> {
        let (a, b) = c.bodies();
        bodies.get(a)?;
        if let Some(b) = b { bodies.get(b)?; }
        Ok(self.constraints.insert(c))
    }

    pub fn remove(&mut self, id: ConstraintId) -> Result<Box<dyn Constraint>, PhysicsError> {
        self.constraints.remove(id).ok_or(PhysicsError::StaleConstraint(id))
    }

    pub fn get(&self, id: ConstraintId) -> Result<&dyn Constraint, PhysicsError> {
        self.constraints.get(id).map(|c| c.as_ref()).ok_or(PhysicsError::StaleConstraint(id))
    }

    /// Typed access. A live id of another type is reported as stale too.
    pub fn get_as<T: Constraint>(&self, id: ConstraintId) -> Result<&T, PhysicsError> {
        self.get(id)?.as_any().downcast_ref::<T>().ok_or(PhysicsError::StaleConstraint(id))
    }

    pub fn get_as_mut<T: Constraint>(&mut self, id: ConstraintId) -> Result<&mut T, PhysicsError> {
        self.constraints.get_mut(id)
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
            .ok_or(PhysicsError::StaleConstraint(id))
    }

    /// First constraint still referencing `body`.
    pub fn find_referencing(&self, body: BodyId) -> Option<ConstraintId> {
        self.constraints.iter().find(|(_, c)| c.references(body)).map(|(id, _)| id)
    }

    pub fn ids(&self) -> Vec<ConstraintId> { self.constraints.ids() }

    pub fn iter(&self) -> impl Iterator<Item = (ConstraintId, &dyn Constraint)> + '_ {
        self.constraints.iter().map(|(id, c)| (id, c.as_ref()))
    }

    pub fn solve_positions(&mut self, bodies: &mut BodyRegistry, h: f32) {
        for (_, c) in self.constraints.iter_mut() { c.solve_position(bodies, h); }
    }

    pub fn solve_velocities(&mut self, bodies: &mut BodyRegistry, h: f32) {
        for (_, c) in self.constraints.iter_mut() { c.solve_velocity(bodies, h); }
    }

    /// Wake sleeping partners of awake bodies. Returns how many were woken.
    pub fn propagate_activation(&self, bodies: &mut BodyRegistry) -> usize {
        let mut woken = 0;
        for (_, c) in self.constraints.iter() {
            let (a, b) = c.bodies();
            let Some(b) = b else { continue };
            let awake = |id: BodyId, reg: &BodyRegistry| reg.get(id).is_ok_and(|x| x.is_active());
            let (aa, ab) = (awake(a, bodies), awake(b, bodies));
            if aa == ab { continue; }
            let sleeper = if aa { b } else { a };
            let wakeable = bodies.get(sleeper).is_ok_and(|x| x.is_in_world() && x.is_dynamic());
            if wakeable && bodies.activate(sleeper).is_ok() { woken += 1; }
        }
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::{vec3, Vec3};
    use crate::{DistanceConstraint, DistanceConstraintSettings, ConstraintSettings, HingeConstraintSettings};
    use crate::test_util::{bar, ground};

    #[test]
    fn typed_lookup_and_reference_tracking() {
        let (mut reg, base) = ground();
        let bob = bar(&mut reg, vec3(0.4, 0.5, 0.0), Vec3::splat(0.05));
        let rod = DistanceConstraintSettings::new(vec3(0.0, 0.5, 0.0), vec3(0.4, 0.5, 0.0)).create(base, bob, &reg).unwrap();
        let mut g = ConstraintGraph::new();
        let id = g.add(Box::new(rod), &reg).unwrap();
        assert!(g.get_as::<DistanceConstraint>(id).is_ok());
        assert!(g.get_as::<crate::HingeConstraint>(id).is_err());
        assert_eq!(g.find_referencing(bob), Some(id));
        g.remove(id).unwrap();
        assert_eq!(g.find_referencing(bob), None);
        assert!(matches!(g.remove(id), Err(PhysicsError::StaleConstraint(_))));
    }

    #[test]
    fn sleeping_partner_is_woken() {
        let (mut reg, _base) = ground();
        let a = bar(&mut reg, vec3(0.0, 0.0, 0.0), Vec3::splat(0.05));
        let b = bar(&mut reg, vec3(0.2, 0.0, 0.0), Vec3::splat(0.05));
        let hinge = HingeConstraintSettings::new(vec3(0.1, 0.0, 0.0), Vec3::Z).create(a, b, &reg).unwrap();
        let mut g = ConstraintGraph::new();
        g.add(Box::new(hinge), &reg).unwrap();
        reg.deactivate(b).unwrap();
        assert_eq!(g.propagate_activation(&mut reg), 1);
        assert!(reg.get(b).unwrap().is_active());
    }
}
