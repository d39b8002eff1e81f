use rigidframe_articulation::{DistanceConstraintSettings, SliderConstraintSettings, SpringSettings};
use rigidframe_core::{vec3, BodyId, ConstraintId, PhysicsError, Quat, Vec3};
use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionQuality, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
use rigidframe_render::PoseExtractor;
use rigidframe_runtime::SimulationContext;
use rigidframe_world::{World, WorldSettings};

use super::{Demo, GREY, ORANGE};
use crate::layers::{MOVING, NON_MOVING};

pub const DISTANCE_LIMITS: (f32, f32) = (0.0, 0.4);

/// Two small boxes stacked 0.4 apart on a vertical slider, with a soft distance
/// limit between them, dropped onto a static slab.
pub struct SuspensionDemo {
    pub boxes: [BodyId; 2],
    pub ground: BodyId,
    pub slider: ConstraintId,
    pub distance: ConstraintId,
}

impl Demo for SuspensionDemo {
    const NAME: &'static str = "suspension";

    fn world_settings() -> WorldSettings { WorldSettings::default().with_gravity(vec3(0.0, -0.4, 0.0)) }

    fn build(ctx: &mut SimulationContext) -> Result<Self, PhysicsError> {
        let shape = BoxShapeSettings::new(Vec3::splat(0.05)).with_convex_radius(0.01).with_density(1000.0).create()?;
        let mut ids = Vec::with_capacity(2);
        for i in 0..2 {
            let s = BodyCreationSettings::new(shape.clone(), vec3(0.0, i as f32 * 0.4, 0.0), Quat::IDENTITY, MotionType::Dynamic, MOVING)
                .with_gyroscopic_force(true)
                .with_damping(0.0, 0.0)
                .with_motion_quality(MotionQuality::LinearCast)
                .with_friction(0.5)
                .with_restitution(0.3);
            let id = ctx.create_body(&s)?;
            ctx.add_body(id, Activation::Activate)?;
            ids.push(id);
        }
        let boxes = [ids[0], ids[1]];

        let mut slider = SliderConstraintSettings { auto_detect_point: true, ..Default::default() };
        slider.set_slider_axis(Vec3::Y);
        let slider = ctx.create_constraint(&slider, boxes[0], boxes[1])?;

        let distance = DistanceConstraintSettings::new(Vec3::ZERO, vec3(0.0, 0.4, 0.0))
            .with_range(DISTANCE_LIMITS.0, DISTANCE_LIMITS.1)
            .with_spring(SpringSettings::new(1.0, 0.1));
        let distance = ctx.create_constraint(&distance, boxes[0], boxes[1])?;

        let ground_shape = BoxShapeSettings::new(vec3(3.0, 0.1, 3.0)).create()?;
        let ground = ctx.create_body(&BodyCreationSettings::new(ground_shape, vec3(0.0, -0.5, 0.0), Quat::IDENTITY, MotionType::Static, NON_MOVING).with_friction(0.5))?;
        ctx.add_body(ground, Activation::DontActivate)?;

        ctx.world_mut().optimize_broad_phase()?;
        Ok(Self { boxes, ground, slider, distance })
    }

    fn drawables(&self, world: &World, ex: &mut PoseExtractor) -> Result<(), PhysicsError> {
        ex.add_body(world, self.ground, "ground", GREY)?;
        ex.add_body(world, self.boxes[0], "lower", ORANGE)?;
        ex.add_body(world, self.boxes[1], "upper", ORANGE)
    }

    fn keep_awake(&self) -> Vec<BodyId> { self.boxes.to_vec() }
}
