use rigidframe_core::{BodyId, LayerPolicy, PhysicsError};
use rigidframe_render::PoseExtractor;
use rigidframe_runtime::{FrameHooks, FrameInfo, SimulationContext};
use rigidframe_world::{World, WorldSettings};

use crate::layers::demo_policy;

pub mod pendulum;
pub mod suspension;
pub mod tumble;
pub mod vehicle;

pub use pendulum::PendulumDemo;
pub use suspension::SuspensionDemo;
pub use tumble::TumbleDemo;
pub use vehicle::VehicleDemo;

/// A scene: how to build it, what to draw and what to do around each step.
pub trait Demo: Sized {
    const NAME: &'static str;

    fn world_settings() -> WorldSettings { WorldSettings::default() }
    fn policy() -> LayerPolicy { demo_policy() }

    /// Populate the context. Everything created here is owned by the context.
    fn build(ctx: &mut SimulationContext) -> Result<Self, PhysicsError>;

    fn drawables(&self, world: &World, extractor: &mut PoseExtractor) -> Result<(), PhysicsError>;

    /// Bodies re-activated before every step.
    fn keep_awake(&self) -> Vec<BodyId> { Vec::new() }

    fn before_step(&mut self, _world: &mut World, _frame: &FrameInfo) -> Result<(), PhysicsError> { Ok(()) }
    fn after_step(&mut self, _world: &World, _frame: &FrameInfo) -> Result<(), PhysicsError> { Ok(()) }
}

/// Adapts a [`Demo`] to the step loop's hooks.
pub struct DemoHooks<'a, D: Demo>(pub &'a mut D);

impl<D: Demo> FrameHooks for DemoHooks<'_, D> {
    fn before_step(&mut self, world: &mut World, frame: &FrameInfo) -> Result<(), PhysicsError> { self.0.before_step(world, frame) }
    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> { self.0.after_step(world, frame) }
}

const GREY: [f32; 3] = [0.6, 0.6, 0.6];
const ORANGE: [f32; 3] = [0.95, 0.55, 0.2];
const BLUE: [f32; 3] = [0.3, 0.5, 0.9];
