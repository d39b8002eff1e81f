use rigidframe_articulation::{DistanceConstraint, HingeConstraint, HingeConstraintSettings};
use rigidframe_core::{PhysicsError, Quat};
use rigidframe_demos::{run_demo, Demo, PendulumDemo, RunArgs, SuspensionDemo, TumbleDemo, VehicleDemo};
use rigidframe_demos::cli::DtPolicyArg;
use rigidframe_render::{PoseExtractor, RenderError};
use rigidframe_runtime::{
    DtPolicy, FrameHooks, FrameInfo, LoopSettings, ManualClock, SimulatedClock, SimulationContext, StepLoop, StopReason,
};
use rigidframe_vehicles::VehicleConstraint;
use rigidframe_world::{World, WorldBuilder};

fn scene<D: Demo>() -> (SimulationContext, D) {
    let world = WorldBuilder::new().settings(D::world_settings()).policy(D::policy()).build().unwrap();
    let mut ctx = SimulationContext::new(world);
    let demo = D::build(&mut ctx).unwrap();
    (ctx, demo)
}

fn frames(n: u64) -> LoopSettings {
    LoopSettings { dt_policy: DtPolicy::PassThrough, max_frames: Some(n), ..Default::default() }
}

/// Runs a closure after every step.
struct Check<F>(F);

impl<F: FnMut(&World, &FrameInfo)> FrameHooks for Check<F> {
    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> {
        (self.0)(world, frame);
        Ok(())
    }
}

#[test]
fn static_bodies_never_move() {
    let (mut ctx, demo) = scene::<SuspensionDemo>();
    let start = ctx.world().world_transform(demo.ground).unwrap();
    let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), frames(600)).unwrap();
    for id in demo.keep_awake() { l.keep_awake(id); }
    let ground = demo.ground;
    ctx.run(&mut l, &mut Check(|w: &World, _: &FrameInfo| {
        assert_eq!(w.world_transform(ground).unwrap(), start);
        assert!(w.body(ground).unwrap().linear_velocity().length() == 0.0);
    }))
    .unwrap();
    ctx.teardown().unwrap();
}

#[test]
fn hinge_chain_anchors_stay_together() {
    let (mut ctx, demo) = scene::<PendulumDemo>();
    let pairs = [(demo.hinges[0], demo.base, demo.links[0]), (demo.hinges[1], demo.links[0], demo.links[1])];
    let mut worst = 0.0f32;
    let mut swung = false;
    let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), frames(1200)).unwrap();
    let tip_start = ctx.world().world_transform(demo.links[1]).unwrap().pos;
    ctx.run(&mut l, &mut Check(|w: &World, _: &FrameInfo| {
        for (hinge, a, b) in pairs {
            let (la, lb) = w.constraint::<HingeConstraint>(hinge).unwrap().local_anchors();
            let pa = w.world_transform(a).unwrap().transform_point(la);
            let pb = w.world_transform(b).unwrap().transform_point(lb);
            worst = worst.max((pa - pb).length());
        }
        swung |= w.world_transform(demo.links[1]).unwrap().pos.y < tip_start.y - 0.3;
    }))
    .unwrap();
    assert!(swung, "pendulum never swung");
    assert!(worst < 1.0e-2, "anchor drift {worst}");
    ctx.teardown().unwrap();
}

#[test]
fn destroyed_body_fails_every_lookup() {
    let (mut ctx, demo) = scene::<PendulumDemo>();
    let mut ex = PoseExtractor::new();
    demo.drawables(ctx.world(), &mut ex).unwrap();
    for _ in 0..10 { ctx.world_mut().step(1.0 / 60.0, 1).unwrap(); }

    let link = demo.links[1];
    assert!(matches!(ctx.destroy_body(link), Err(PhysicsError::BodyInUse { .. })));
    ctx.remove_constraint(demo.hinges[1]).unwrap();
    ctx.world_mut().remove_body(link).unwrap();
    // Removed only: still inspectable.
    assert!(ctx.world().world_transform(link).is_ok());
    ctx.destroy_body(link).unwrap();

    for _ in 0..2 {
        assert!(matches!(ctx.world().world_transform(link), Err(PhysicsError::StaleBody(b)) if b == link));
    }
    let hinge = HingeConstraintSettings::new(rigidframe_core::vec3(0.5, 0.0, 0.0), rigidframe_core::Vec3::Z);
    assert!(matches!(ctx.create_constraint(&hinge, demo.links[0], link), Err(PhysicsError::StaleBody(_))));
    assert!(matches!(ctx.world_mut().activate_body(link), Err(PhysicsError::StaleBody(_))));
    assert!(matches!(ex.extract(ctx.world(), 11, 0.0), Err(RenderError::Physics(PhysicsError::StaleBody(_)))));
    assert!(matches!(ctx.destroy_body(link), Err(PhysicsError::StaleBody(_))));
    ctx.teardown().unwrap();
}

#[test]
fn zero_time_frames_leave_the_scene_untouched() {
    let (mut ctx, demo) = scene::<SuspensionDemo>();
    let before: Vec<_> = demo.boxes.iter().map(|id| ctx.world().world_transform(*id).unwrap()).collect();
    let hash = ctx.world().step_hash();
    let mut l = StepLoop::new(ManualClock::new(), frames(50)).unwrap();
    let s = ctx.run(&mut l, &mut ()).unwrap();
    assert_eq!(s.reason, StopReason::FrameLimit);
    assert_eq!(s.sim_time, 0.0);
    let after: Vec<_> = demo.boxes.iter().map(|id| ctx.world().world_transform(*id).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(hash, ctx.world().step_hash());
}

#[test]
fn spin_without_gravity_rotates_in_place() {
    let (mut ctx, demo) = scene::<TumbleDemo>();
    let dt = 1.0 / 240.0;
    let start = ctx.world().world_transform(demo.body).unwrap();
    ctx.world_mut().step(dt, 1).unwrap();
    let end = ctx.world().world_transform(demo.body).unwrap();

    assert_eq!(end.pos, start.pos);
    let expected = Quat::from_scaled_axis((rigidframe_demos::scenes::tumble::SPIN * dt).into()) * start.rot;
    let err = (end.rot * expected.conjugate()).to_scaled_axis().length();
    assert!(err < 2.0e-3, "rotation off by {err} rad");
    let turned = (end.rot * start.rot.conjugate()).to_scaled_axis().length();
    assert!((turned - rigidframe_demos::scenes::tumble::SPIN.length() * dt).abs() < 2.0e-3);
}

#[test]
fn suspension_distance_stays_within_limits() {
    let (mut ctx, demo) = scene::<SuspensionDemo>();
    let (min, max) = rigidframe_demos::scenes::suspension::DISTANCE_LIMITS;
    let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), frames(900)).unwrap();
    for id in demo.keep_awake() { l.keep_awake(id); }
    let mut history = Vec::new();
    let distance = demo.distance;
    ctx.run(&mut l, &mut Check(|w: &World, _: &FrameInfo| {
        history.push(w.constraint::<DistanceConstraint>(distance).unwrap().current_distance(w.bodies()).unwrap());
    }))
    .unwrap();

    let worst = history.iter().cloned().fold(f32::MIN, f32::max);
    assert!(worst <= max + 5.0e-3, "exceeded max: {worst}");
    assert!(history.iter().all(|d| *d >= min));
    let tail = &history[history.len() - 60..];
    let spread = tail.iter().cloned().fold(f32::MIN, f32::max) - tail.iter().cloned().fold(f32::MAX, f32::min);
    assert!(spread < 5.0e-3, "still oscillating: {spread}");
}

#[test]
fn idle_vehicle_settles_on_its_suspension() {
    let (mut ctx, demo) = scene::<VehicleDemo>();
    let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), frames(420)).unwrap();
    l.keep_awake(demo.chassis);
    let mut heights = Vec::new();
    let chassis = demo.chassis;
    ctx.run(&mut l, &mut Check(|w: &World, _: &FrameInfo| {
        heights.push(w.world_transform(chassis).unwrap().pos.y);
    }))
    .unwrap();

    // Chassis half height is 0.2; the ground top is at y = 0.
    assert!(heights.iter().all(|y| *y - 0.2 > 0.0), "chassis touched the ground");
    let settled = &heights[heights.len() - 60..];
    let (lo, hi) = settled.iter().fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(*y), hi.max(*y)));
    assert!(hi - lo < 5.0e-3, "still moving: {lo}..{hi}");
    assert!((0.8..=1.0).contains(&hi), "height {hi}");

    let v = ctx.world().constraint::<VehicleConstraint>(demo.vehicle).unwrap();
    for w in v.wheels() {
        let s = w.settings();
        assert!(w.has_contact());
        assert!((s.suspension_min_length..=s.suspension_max_length).contains(&w.suspension_length()));
    }
}

#[test]
fn demos_run_headless_to_their_time_bound() {
    let out = std::env::temp_dir().join(format!("rigidframe-demo-{}.jsonl", std::process::id()));
    let args = RunArgs {
        seconds: 1.0,
        dt_policy: DtPolicyArg::Clamp,
        max_dt: 0.25,
        fixed_dt: 1.0 / 60.0,
        print_every: 0,
        frames_out: Some(out.clone()),
        settings: None,
        realtime: false,
        debug_every: 0,
    };
    let s = run_demo::<VehicleDemo>(&args, |d| d.input.forward = 0.5).unwrap();
    assert_eq!(s.reason, StopReason::DurationReached);
    let text = std::fs::read_to_string(&out).unwrap();
    std::fs::remove_file(&out).ok();
    let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines[0]["record"], "config");
    assert_eq!(lines[0]["drawables"].as_array().unwrap().len(), 5);
    assert_eq!(lines.len() as u64, s.frames + 1);

    let quiet = RunArgs { frames_out: None, ..args };
    for s in [
        run_demo::<PendulumDemo>(&quiet, |_| {}).unwrap(),
        run_demo::<SuspensionDemo>(&quiet, |_| {}).unwrap(),
        run_demo::<TumbleDemo>(&quiet, |_| {}).unwrap(),
    ] {
        assert_eq!(s.reason, StopReason::DurationReached);
        assert!((s.sim_time - 1.0).abs() < 0.05, "{}", s.sim_time);
    }
}
