use rigidframe_articulation::HingeConstraintSettings;
use rigidframe_core::{vec3, ConstraintId, BodyId, PhysicsError, Quat, Vec3};
use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
use rigidframe_render::PoseExtractor;
use rigidframe_runtime::SimulationContext;
use rigidframe_world::{World, WorldSettings};

use super::{Demo, BLUE, GREY};
use crate::layers::{LINKS, NON_MOVING};

/// Full length of one link along X.
pub const LINK_LENGTH: f32 = 0.5;

/// Two links chained by hinges about Z, hanging from a static base at the origin.
/// Both links start horizontal and swing down.
pub struct PendulumDemo {
    pub base: BodyId,
    pub links: [BodyId; 2],
    pub hinges: [ConstraintId; 2],
}

impl Demo for PendulumDemo {
    const NAME: &'static str = "pendulum";

    fn world_settings() -> WorldSettings { WorldSettings::default().with_gravity(vec3(0.0, -0.4, 0.0)) }

    fn build(ctx: &mut SimulationContext) -> Result<Self, PhysicsError> {
        let base_shape = BoxShapeSettings::new(Vec3::splat(0.05)).create()?;
        let base = ctx.create_and_add_body(
            &BodyCreationSettings::new(base_shape, Vec3::ZERO, Quat::IDENTITY, MotionType::Static, NON_MOVING),
            Activation::DontActivate,
        )?;

        let link_shape = BoxShapeSettings::new(vec3(0.5 * LINK_LENGTH, 0.025, 0.025)).with_convex_radius(0.01).create()?;
        let mut links = [base; 2];
        let mut hinges = Vec::with_capacity(2);
        let mut parent = base;
        for (i, link) in links.iter_mut().enumerate() {
            let pivot = vec3(i as f32 * LINK_LENGTH, 0.0, 0.0);
            let settings = BodyCreationSettings::new(link_shape.clone(), pivot + vec3(0.5 * LINK_LENGTH, 0.0, 0.0), Quat::IDENTITY, MotionType::Dynamic, LINKS)
                .with_damping(0.0, 0.0)
                .with_gyroscopic_force(true);
            *link = ctx.create_and_add_body(&settings, Activation::Activate)?;
            hinges.push(ctx.create_constraint(&HingeConstraintSettings::new(pivot, Vec3::Z), parent, *link)?);
            parent = *link;
        }
        ctx.world_mut().optimize_broad_phase()?;
        Ok(Self { base, links, hinges: [hinges[0], hinges[1]] })
    }

    fn drawables(&self, world: &World, ex: &mut PoseExtractor) -> Result<(), PhysicsError> {
        ex.add_body(world, self.base, "base", GREY)?;
        ex.add_body(world, self.links[0], "link0", BLUE)?;
        ex.add_body(world, self.links[1], "link1", BLUE)
    }
}
