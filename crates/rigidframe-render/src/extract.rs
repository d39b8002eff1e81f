//! Pose extraction. Reads a world after a step and never writes to it.

use glam::Vec3;
use rigidframe_core::{BodyId, ConstraintId, PhysicsError};
use rigidframe_geom::ShapeKind as GeomShape;
use rigidframe_vehicles::VehicleConstraint;
use rigidframe_world::World;
use serde::{Deserialize, Serialize};

use crate::{BodyPose, RenderError};

/// Geometry a renderer instantiates for a drawable.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    Box { hx: f32, hy: f32, hz: f32 },
    Sphere { r: f32 },
    /// Axis along the model's local Y.
    Cylinder { r: f32, half_width: f32 },
}

impl ShapeKind {
    fn of_body(shape: &GeomShape) -> Self {
        match *shape {
            GeomShape::Box { half_extents: h, .. } => ShapeKind::Box { hx: h.x, hy: h.y, hz: h.z },
            GeomShape::Sphere { radius } => ShapeKind::Sphere { r: radius },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DrawSource {
    Body { id: BodyId },
    /// Wheels have no body; their pose comes from the vehicle constraint.
    Wheel { vehicle: ConstraintId, index: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub label: String,
    pub source: DrawSource,
    pub shape: ShapeKind,
    pub color: [f32; 3],
}

/// One drawable's state for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub label: String,
    pub pose: BodyPose,
}

/// Everything the drawing side needs for one rendered frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FramePacket {
    pub frame: u64,
    /// Simulated seconds since start.
    pub time: f64,
    pub instances: Vec<Instance>,
}

impl FramePacket {
    pub fn get(&self, label: &str) -> Option<&BodyPose> {
        self.instances.iter().find(|i| i.label == label).map(|i| &i.pose)
    }
}

/// Ordered list of drawables, resolved against the world each frame.
#[derive(Clone, Debug, Default)]
pub struct PoseExtractor {
    drawables: Vec<Drawable>,
}

impl PoseExtractor {
    pub fn new() -> Self { Self::default() }

    pub fn drawables(&self) -> &[Drawable] { &self.drawables }
    pub fn len(&self) -> usize { self.drawables.len() }
    pub fn is_empty(&self) -> bool { self.drawables.is_empty() }

    /// Track a body; its shape is read once, here.
    pub fn add_body(&mut self, world: &World, id: BodyId, label: impl Into<String>, color: [f32; 3]) -> Result<(), PhysicsError> {
        let shape = ShapeKind::of_body(world.body(id)?.shape().kind());
        self.drawables.push(Drawable { label: label.into(), source: DrawSource::Body { id }, shape, color });
        Ok(())
    }

    /// Track every wheel of a vehicle as `{prefix}{index}`.
    pub fn add_vehicle_wheels(&mut self, world: &World, vehicle: ConstraintId, prefix: &str, color: [f32; 3]) -> Result<(), PhysicsError> {
        let v = world.constraint::<VehicleConstraint>(vehicle)?;
        for (index, w) in v.wheels().iter().enumerate() {
            let s = w.settings();
            self.drawables.push(Drawable {
                label: format!("{prefix}{index}"),
                source: DrawSource::Wheel { vehicle, index },
                shape: ShapeKind::Cylinder { r: s.radius, half_width: 0.5 * s.width },
                color,
            });
        }
        Ok(())
    }

    /// Drop drawables that point at `id`, e.g. before it is destroyed.
    pub fn forget_body(&mut self, id: BodyId) {
        self.drawables.retain(|d| d.source != DrawSource::Body { id });
    }

    pub fn forget_vehicle(&mut self, vehicle: ConstraintId) {
        self.drawables.retain(|d| !matches!(d.source, DrawSource::Wheel { vehicle: v, .. } if v == vehicle));
    }

    /// Snapshot of every drawable, in registration order. Fails on the first id that
    /// no longer resolves.
    pub fn extract(&self, world: &World, frame: u64, time: f64) -> Result<FramePacket, RenderError> {
        let mut instances = Vec::with_capacity(self.drawables.len());
        for d in &self.drawables {
            let xf = match d.source {
                DrawSource::Body { id } => world.world_transform(id)?,
                DrawSource::Wheel { vehicle, index } => {
                    let v = world.constraint::<VehicleConstraint>(vehicle)?;
                    let chassis = world.world_transform(v.chassis())?;
                    // Cylinder axle is the model's Y; its X is treated as up.
                    v.wheel_world_transform(index, Vec3::Y.into(), Vec3::X.into(), &chassis)
                        .ok_or(RenderError::MissingWheel { vehicle, index })?
                }
            };
            let pose = BodyPose::from_isometry(&xf);
            if !pose.is_finite() { return Err(RenderError::InvalidPose(d.label.clone())); }
            instances.push(Instance { label: d.label.clone(), pose });
        }
        Ok(FramePacket { frame, time, instances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::{vec3, LayerPolicy, ObjectLayer, Quat};
    use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
    use rigidframe_geom::{BoxShapeSettings, ShapeSettings, SphereShapeSettings};
    use rigidframe_world::WorldBuilder;

    fn world_with_ball() -> (World, BodyId) {
        let mut world = WorldBuilder::new().policy(LayerPolicy::collide_none()).build().unwrap();
        let ball = SphereShapeSettings::new(0.5).create().unwrap();
        let id = world
            .create_and_add_body(&BodyCreationSettings::new(ball, vec3(0.0, 4.0, 0.0), Quat::IDENTITY, MotionType::Dynamic, ObjectLayer(0)), Activation::Activate)
            .unwrap();
        (world, id)
    }

    #[test]
    fn extraction_does_not_change_the_world() {
        let (mut world, id) = world_with_ball();
        world.step(1.0 / 60.0, 1).unwrap();
        let mut ex = PoseExtractor::new();
        ex.add_body(&world, id, "ball", [1.0, 0.0, 0.0]).unwrap();
        let before = world.step_hash();
        let a = ex.extract(&world, 1, 1.0 / 60.0).unwrap();
        let b = ex.extract(&world, 1, 1.0 / 60.0).unwrap();
        assert_eq!(before, world.step_hash());
        assert_eq!(a, b);
        assert_eq!(a.get("ball").unwrap().translation, Vec3::from(world.world_transform(id).unwrap().pos).to_array());
        assert!(a.get("ball").unwrap().is_orthonormal(1e-5));
    }

    #[test]
    fn shapes_are_read_from_bodies() {
        let (mut world, ball) = world_with_ball();
        let slab = BoxShapeSettings::new(vec3(2.0, 0.1, 1.0)).create().unwrap();
        let floor = world
            .create_and_add_body(&BodyCreationSettings::new(slab, Vec3::ZERO.into(), Quat::IDENTITY, MotionType::Static, ObjectLayer(0)), Activation::DontActivate)
            .unwrap();
        let mut ex = PoseExtractor::new();
        ex.add_body(&world, floor, "floor", [0.5; 3]).unwrap();
        ex.add_body(&world, ball, "ball", [1.0; 3]).unwrap();
        assert_eq!(ex.drawables()[0].shape, ShapeKind::Box { hx: 2.0, hy: 0.1, hz: 1.0 });
        assert_eq!(ex.drawables()[1].shape, ShapeKind::Sphere { r: 0.5 });
    }

    #[test]
    fn destroyed_body_fails_extraction() {
        let (mut world, id) = world_with_ball();
        let mut ex = PoseExtractor::new();
        ex.add_body(&world, id, "ball", [1.0; 3]).unwrap();
        world.remove_body(id).unwrap();
        // Removed but not destroyed: still readable.
        assert!(ex.extract(&world, 0, 0.0).is_ok());
        world.destroy_body(id).unwrap();
        let err = ex.extract(&world, 0, 0.0).unwrap_err();
        assert!(matches!(err, RenderError::Physics(PhysicsError::StaleBody(b)) if b == id));
        ex.forget_body(id);
        assert!(ex.extract(&world, 0, 0.0).unwrap().instances.is_empty());
    }
}
