use glam::Quat;
use rigidframe_core::types::Vec3;
use rigidframe_core::{BodyId, ObjectLayer};
use rigidframe_dynamics::{integrate, update_velocities, Activation, BodyCreationSettings, BodyRegistry, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};

use crate::Constraint;

pub fn ground() -> (BodyRegistry, BodyId) {
    let mut reg = BodyRegistry::new(16);
    let shape = BoxShapeSettings::new(Vec3::splat(0.05)).with_convex_radius(0.01).create().unwrap();
    let s = BodyCreationSettings::new(shape, Vec3::new(0.0, 0.5, 0.0), Quat::IDENTITY, MotionType::Static, ObjectLayer(0));
    let id = reg.create(&s).unwrap();
    reg.mark_added(id, Activation::DontActivate).unwrap();
    (reg, id)
}

pub fn bar(reg: &mut BodyRegistry, pos: Vec3, half: Vec3) -> BodyId {
    let shape = BoxShapeSettings::new(half).with_convex_radius(0.01).create().unwrap();
    let s = BodyCreationSettings::new(shape, pos, Quat::IDENTITY, MotionType::Dynamic, ObjectLayer(0)).with_damping(0.0, 0.0);
    let id = reg.create(&s).unwrap();
    reg.mark_added(id, Activation::Activate).unwrap();
    id
}

pub fn run_substeps(reg: &mut BodyRegistry, constraints: &mut [&mut dyn Constraint], g: Vec3, h: f32, n: usize) {
    for _ in 0..n {
        for (_, b) in reg.iter_mut() { if b.is_active() { integrate(b, g, h); } }
        for c in constraints.iter_mut() { c.solve_position(reg, h); }
        for (_, b) in reg.iter_mut() { if b.is_active() { update_velocities(b, h); } }
        for c in constraints.iter_mut() { c.solve_velocity(reg, h); }
    }
}
