use rigidframe_core::{vec3, BodyId, PhysicsError, Quat, Vec3};
use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
use rigidframe_render::PoseExtractor;
use rigidframe_runtime::SimulationContext;
use rigidframe_world::{World, WorldSettings};

use super::{Demo, ORANGE};
use crate::layers::MOVING;

pub const SPIN: Vec3 = Vec3::new(0.3, 0.0, 5.0);

/// A box with three distinct inertias spinning freely without gravity. Spin about
/// the intermediate axis is unstable, so the box keeps flipping over.
pub struct TumbleDemo {
    pub body: BodyId,
}

impl Demo for TumbleDemo {
    const NAME: &'static str = "tumble";

    fn world_settings() -> WorldSettings { WorldSettings::default().with_gravity(Vec3::ZERO) }

    fn build(ctx: &mut SimulationContext) -> Result<Self, PhysicsError> {
        let shape = BoxShapeSettings::new(vec3(0.25, 0.05, 0.125)).with_convex_radius(0.01).with_density(1000.0).create()?;
        let s = BodyCreationSettings::new(shape, Vec3::ZERO, Quat::IDENTITY, MotionType::Dynamic, MOVING)
            .with_gyroscopic_force(true)
            .with_damping(0.0, 0.0)
            .with_sleeping(false)
            .with_velocity(Vec3::ZERO, SPIN);
        let body = ctx.create_and_add_body(&s, Activation::Activate)?;
        ctx.world_mut().optimize_broad_phase()?;
        Ok(Self { body })
    }

    fn drawables(&self, world: &World, ex: &mut PoseExtractor) -> Result<(), PhysicsError> {
        ex.add_body(world, self.body, "box", ORANGE)
    }
}
