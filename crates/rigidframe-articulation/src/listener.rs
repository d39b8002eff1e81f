use rigidframe_collision::BroadPhase;
use rigidframe_core::types::Vec3;
use rigidframe_core::LayerPolicy;
use rigidframe_dynamics::BodyRegistry;

use crate::graph::ConstraintGraph;

/// What a listener may touch during a collision step.
pub struct StepContext<'a> {
    /// Length of this collision step.
    pub dt: f32,
    pub gravity: Vec3,
    pub bodies: &'a mut BodyRegistry,
    pub constraints: &'a mut ConstraintGraph,
    pub broad_phase: &'a BroadPhase,
    pub policy: &'a LayerPolicy,
}

/// Called once per collision step, before integration.
pub trait StepListener: Send {
    fn on_step(&mut self, ctx: &mut StepContext<'_>);
}
