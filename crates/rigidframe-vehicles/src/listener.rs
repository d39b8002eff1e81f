//! Step listener that runs a vehicle's per-step update.

use rigidframe_articulation::{StepContext, StepListener};
use rigidframe_core::ConstraintId;

use crate::vehicle::VehicleConstraint;

/// Drives one [`VehicleConstraint`] from the world's step.
///
/// Holds the constraint's id rather than the constraint, so removing the constraint
/// first simply turns the listener into a no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VehicleStepListener {
    constraint: ConstraintId,
}

impl VehicleStepListener {
    /// Listener for the vehicle registered under `constraint`.
    pub fn new(constraint: ConstraintId) -> Self { Self { constraint } }

    /// Vehicle this listener updates.
    pub fn constraint(&self) -> ConstraintId { self.constraint }
}

impl StepListener for VehicleStepListener {
    fn on_step(&mut self, ctx: &mut StepContext<'_>) {
        if let Ok(vehicle) = ctx.constraints.get_as_mut::<VehicleConstraint>(self.constraint) {
            vehicle.update(ctx.dt, ctx.bodies, ctx.broad_phase, ctx.policy);
        }
    }
}
