use std::any::Any;

use rigidframe_core::{BodyId, PhysicsError};
use rigidframe_dynamics::BodyRegistry;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintKind { Hinge, Slider, Distance, Vehicle }

/// A joint or controller owned by the world's constraint graph.
///
/// Solve hooks run once per substep, in registration order. The default no-ops suit
/// constraints that do their work from a step listener.
pub trait Constraint: Any + Send + Sync {
    fn kind(&self) -> ConstraintKind;

    /// Participants. Single-body constraints return `None` for the second.
    fn bodies(&self) -> (BodyId, Option<BodyId>);

    fn references(&self, body: BodyId) -> bool {
        let (a, b) = self.bodies();
        a == body || b == Some(body)
    }

    fn solve_position(&mut self, _bodies: &mut BodyRegistry, _h: f32) {}

    fn solve_velocity(&mut self, _bodies: &mut BodyRegistry, _h: f32) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builds a constraint from the bodies' current poses.
pub trait ConstraintSettings {
    type Output: Constraint;

    fn create(&self, a: BodyId, b: BodyId, bodies: &BodyRegistry) -> Result<Self::Output, PhysicsError>;
}

/// Both bodies alive and distinct.
pub(crate) fn check_pair(a: BodyId, b: BodyId, bodies: &BodyRegistry) -> Result<(), PhysicsError> {
    if a == b {
        return Err(PhysicsError::InvalidConstraint(format!("{a} cannot be constrained to itself")));
    }
    bodies.get(a)?;
    bodies.get(b)?;
    Ok(())
}

/// True when at least one participant can move this substep.
pub(crate) fn any_awake(a: &rigidframe_dynamics::Body, b: &rigidframe_dynamics::Body) -> bool {
    let live = |x: &rigidframe_dynamics::Body| x.is_in_world() && x.is_active() && x.is_dynamic();
    a.is_in_world() && b.is_in_world() && (live(a) || live(b))
}
