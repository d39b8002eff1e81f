use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rigidframe_core::{vec3, ObjectLayer, Quat, Vec3};
use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
use rigidframe_world::{World, WorldBuilder};

fn stack(n: usize) -> World {
    let mut w = WorldBuilder::new().with_capacity(n + 1, 4 * n + 8, 16 * n + 32).build().unwrap();
    let floor = BoxShapeSettings::new(vec3(20.0, 0.5, 20.0)).create().unwrap();
    w.create_and_add_body(
        &BodyCreationSettings::new(floor, vec3(0.0, -0.5, 0.0), Quat::IDENTITY, MotionType::Static, ObjectLayer(0)),
        Activation::DontActivate,
    )
    .unwrap();
    let cube = BoxShapeSettings::new(Vec3::splat(0.25)).create().unwrap();
    for i in 0..n {
        let pos = vec3((i % 8) as f32 * 0.6 - 2.0, 0.3 + (i / 8) as f32 * 0.6, 0.0);
        let s = BodyCreationSettings::new(cube.clone(), pos, Quat::IDENTITY, MotionType::Dynamic, ObjectLayer(0)).with_sleeping(false);
        w.create_and_add_body(&s, Activation::Activate).unwrap();
    }
    w.optimize_broad_phase().unwrap();
    w
}

fn bench_step(c: &mut Criterion) {
    let mut w = stack(64);
    c.bench_function("step_64_boxes", |b| {
        b.iter(|| black_box(w.step(black_box(1.0 / 60.0), 1).unwrap()))
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
