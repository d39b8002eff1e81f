use rigidframe_core::{Arena, BodyId, PhysicsError};

use crate::body::{Activation, Body, BodyCreationSettings, BodyState};

/// Owns every body between creation and destruction.
pub struct BodyRegistry {
    bodies: Arena<BodyId, Body>,
    max_bodies: usize,
}

impl BodyRegistry {
    pub fn new(max_bodies: usize) -> Self {
        Self { bodies: Arena::with_capacity(max_bodies.min(4096)), max_bodies }
    }

    #[inline] pub fn len(&self) -> usize { self.bodies.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.bodies.is_empty() }
    #[inline] pub fn max_bodies(&self) -> usize { self.max_bodies }
    #[inline] pub fn contains(&self, id: BodyId) -> bool { self.bodies.contains(id) }

    pub fn create(&mut self, s: &BodyCreationSettings) -> Result<BodyId, PhysicsError> {
        if self.bodies.len() >= self.max_bodies {
            return Err(PhysicsError::CapacityExceeded { resource: "bodies", limit: self.max_bodies });
        }
        if !(s.position.is_finite() && s.rotation.is_finite()) {
            return Err(PhysicsError::InvalidConfiguration("body pose must be finite".into()));
        }
        if let Some(m) = s.mass_override {
            if !(m.is_finite() && m > 0.0) {
                return Err(PhysicsError::InvalidConfiguration(format!("mass override {m} must be positive")));
            }
        }
        Ok(self.bodies.insert(Body::from_settings(s)))
    }

    /// Fails while the body is still in the world.
    pub fn destroy(&mut self, id: BodyId) -> Result<Body, PhysicsError> {
        match self.get(id)?.state {
            BodyState::InWorld => Err(PhysicsError::BodyStillInWorld(id)),
            _ => self.bodies.remove(id).ok_or(PhysicsError::StaleBody(id)),
        }
    }

    pub fn get(&self, id: BodyId) -> Result<&Body, PhysicsError> {
        self.bodies.get(id).ok_or(PhysicsError::StaleBody(id))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(id).ok_or(PhysicsError::StaleBody(id))
    }

    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Result<(&mut Body, &mut Body), PhysicsError> {
        if a == b {
            return Err(PhysicsError::InvalidConstraint(format!("{a} paired with itself")));
        }
        self.get(a)?;
        self.get(b)?;
        self.bodies.get2_mut(a, b).ok_or(PhysicsError::StaleBody(a))
    }

    pub fn mark_added(&mut self, id: BodyId, activation: Activation) -> Result<(), PhysicsError> {
        let b = self.get_mut(id)?;
        if b.state == BodyState::InWorld { return Err(PhysicsError::BodyAlreadyInWorld(id)); }
        b.state = BodyState::InWorld;
        b.active = activation == Activation::Activate && !b.is_static();
        b.sleep_timer = 0.0;
        Ok(())
    }

    pub fn mark_removed(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let b = self.get_mut(id)?;
        if b.state != BodyState::InWorld { return Err(PhysicsError::BodyNotInWorld(id)); }
        b.state = BodyState::Removed;
        b.active = false;
        Ok(())
    }

    /// No-op for static bodies.
    pub fn activate(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let b = self.get_mut(id)?;
        if b.state != BodyState::InWorld { return Err(PhysicsError::BodyNotInWorld(id)); }
        if !b.is_static() {
            b.active = true;
            b.sleep_timer = 0.0;
        }
        Ok(())
    }

    pub fn deactivate(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let b = self.get_mut(id)?;
        if b.state != BodyState::InWorld { return Err(PhysicsError::BodyNotInWorld(id)); }
        b.active = false;
        b.lin_vel = rigidframe_core::Vec3::ZERO;
        b.ang_vel = rigidframe_core::Vec3::ZERO;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ { self.bodies.iter() }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut Body)> + '_ { self.bodies.iter_mut() }
    pub fn ids(&self) -> Vec<BodyId> { self.bodies.ids() }

    pub fn num_in_world(&self) -> usize { self.iter().filter(|(_, b)| b.is_in_world()).count() }
    pub fn num_active(&self) -> usize { self.iter().filter(|(_, b)| b.active).count() }

    /// Visit every active in-world body on the current rayon pool.
    pub fn par_for_each_active<F>(&mut self, f: F)
    where
        F: Fn(&mut Body) + Sync + Send,
    {
        self.bodies.par_for_each_mut(|b| {
            if b.active && b.state == BodyState::InWorld { f(b) }
        });
    }
}
