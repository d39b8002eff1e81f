use rigidframe_articulation::{Constraint, ConstraintSettings, StepListener};
use rigidframe_core::{BodyId, ConstraintId, PhysicsError, StepListenerId};
use rigidframe_dynamics::{Activation, BodyCreationSettings};
use rigidframe_vehicles::{VehicleConstraintSettings, VehicleStepListener};
use rigidframe_world::World;

use crate::{FrameClock, FrameHooks, RunSummary, StepLoop};

/// Owns a world plus every body, constraint and listener created through it.
///
/// Teardown runs in reverse construction order: listeners, constraints, then bodies
/// (removed and destroyed newest first), then the world itself. Dropping a context
/// without calling [`teardown`](Self::teardown) runs the same sequence and reports
/// failures on stderr, so a scene builder that bails out halfway leaks nothing.
pub struct SimulationContext {
    world: World,
    bodies: Vec<BodyId>,
    constraints: Vec<ConstraintId>,
    listeners: Vec<StepListenerId>,
    closed: bool,
}

impl SimulationContext {
    pub fn new(world: World) -> Self {
        Self { world, bodies: Vec::new(), constraints: Vec::new(), listeners: Vec::new(), closed: false }
    }

    pub fn world(&self) -> &World { &self.world }
    /// Objects created directly on the world are not tracked and will block shutdown.
    pub fn world_mut(&mut self) -> &mut World { &mut self.world }

    pub fn bodies(&self) -> &[BodyId] { &self.bodies }
    pub fn constraints(&self) -> &[ConstraintId] { &self.constraints }
    pub fn listeners(&self) -> &[StepListenerId] { &self.listeners }

    /// Allocate a body without adding it, so mass and friction can still be adjusted.
    pub fn create_body(&mut self, s: &BodyCreationSettings) -> Result<BodyId, PhysicsError> {
        let id = self.world.create_body(s)?;
        self.bodies.push(id);
        Ok(id)
    }

    pub fn add_body(&mut self, id: BodyId, activation: Activation) -> Result<(), PhysicsError> {
        self.world.add_body(id, activation)
    }

    pub fn create_and_add_body(&mut self, s: &BodyCreationSettings, activation: Activation) -> Result<BodyId, PhysicsError> {
        let id = self.create_body(s)?;
        self.add_body(id, activation)?;
        Ok(id)
    }

    /// Remove (if still in the world) and destroy.
    pub fn destroy_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        if self.world.body(id)?.is_in_world() { self.world.remove_body(id)?; }
        self.world.destroy_body(id)?;
        self.bodies.retain(|b| *b != id);
        Ok(())
    }

    pub fn add_constraint<C: Constraint>(&mut self, c: C) -> Result<ConstraintId, PhysicsError> {
        let id = self.world.add_constraint(c)?;
        self.constraints.push(id);
        Ok(id)
    }

    pub fn create_constraint<S: ConstraintSettings>(&mut self, settings: &S, a: BodyId, b: BodyId) -> Result<ConstraintId, PhysicsError> {
        let id = self.world.create_constraint(settings, a, b)?;
        self.constraints.push(id);
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), PhysicsError> {
        self.world.remove_constraint(id)?;
        self.constraints.retain(|c| *c != id);
        Ok(())
    }

    pub fn add_step_listener<L: StepListener + 'static>(&mut self, listener: L) -> Result<StepListenerId, PhysicsError> {
        let id = self.world.add_step_listener(listener)?;
        self.listeners.push(id);
        Ok(id)
    }

    pub fn remove_step_listener(&mut self, id: StepListenerId) -> Result<(), PhysicsError> {
        self.world.remove_step_listener(id)?;
        self.listeners.retain(|l| *l != id);
        Ok(())
    }

    /// Vehicle constraint plus the listener that updates it every collision step.
    pub fn add_vehicle(&mut self, settings: &VehicleConstraintSettings, chassis: BodyId) -> Result<(ConstraintId, StepListenerId), PhysicsError> {
        let vehicle = settings.create(chassis, self.world.bodies())?;
        let constraint = self.add_constraint(vehicle)?;
        let listener = self.add_step_listener(VehicleStepListener::new(constraint))?;
        Ok((constraint, listener))
    }

    pub fn run<C: FrameClock, H: FrameHooks>(&mut self, step_loop: &mut StepLoop<C>, hooks: &mut H) -> Result<RunSummary, PhysicsError> {
        step_loop.run(&mut self.world, hooks)
    }

    /// Release everything and shut the world down. Returns the first failure; later
    /// stages still run.
    pub fn teardown(mut self) -> Result<(), PhysicsError> { self.close() }

    fn close(&mut self) -> Result<(), PhysicsError> {
        if self.closed { return Ok(()); }
        self.closed = true;
        let mut first = None;
        let mut keep = |r: Result<(), PhysicsError>| {
            if let Err(e) = r { first.get_or_insert(e); }
        };
        for id in std::mem::take(&mut self.listeners).into_iter().rev() {
            keep(self.world.remove_step_listener(id).map(drop));
        }
        for id in std::mem::take(&mut self.constraints).into_iter().rev() {
            keep(self.world.remove_constraint(id).map(drop));
        }
        for id in std::mem::take(&mut self.bodies).into_iter().rev() {
            let in_world = self.world.body(id).map(|b| b.is_in_world());
            match in_world {
                Ok(true) => keep(self.world.remove_body(id).and_then(|_| self.world.destroy_body(id))),
                Ok(false) => keep(self.world.destroy_body(id)),
                Err(e) => keep(Err(e)),
            }
        }
        keep(self.world.shutdown());
        first.map_or(Ok(()), Err)
    }
}

impl Drop for SimulationContext {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[context] teardown: {e}");
        }
    }
}
