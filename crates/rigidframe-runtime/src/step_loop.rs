//! Frame loop: clock time in, world steps out.
//!
//! Every [`StepLoop::tick`] checks the stop conditions first, then reads the clock,
//! plans steps with the [`DtPolicy`], runs `before_step` hooks, wakes keep-awake
//! bodies, steps the world and finally runs `after_step` hooks. The world is never
//! touched between `after_step` and the next tick.

use rigidframe_core::{BodyId, PhysicsError, StepStats};
use rigidframe_world::World;
use serde::{Deserialize, Serialize};

use crate::{DtPolicy, FrameClock, ShutdownToken, StepPlan};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Stepping,
    Stopped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Shutdown,
    DurationReached,
    FrameLimit,
    /// A step or hook returned an error.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    pub dt_policy: DtPolicy,
    /// Collision passes per world step.
    pub collision_steps: u32,
    /// Clock seconds after which the loop stops.
    pub max_seconds: Option<f64>,
    pub max_frames: Option<u64>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self { dt_policy: DtPolicy::default(), collision_steps: 1, max_seconds: None, max_frames: None }
    }
}

impl LoopSettings {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        self.dt_policy.validate()?;
        if self.collision_steps == 0 {
            return Err(PhysicsError::InvalidConfiguration("collision_steps must be at least 1".into()));
        }
        if let Some(s) = self.max_seconds {
            if !(s >= 0.0) {
                return Err(PhysicsError::InvalidConfiguration(format!("max_seconds {s} must be non-negative")));
            }
        }
        Ok(())
    }
}

/// What one frame did. `stats` is empty while `before_step` runs.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameInfo {
    /// 1-based index of this frame.
    pub frame: u64,
    /// Clock seconds since the previous frame.
    pub elapsed: f32,
    pub plan: StepPlan,
    /// Simulated seconds once this frame's steps are done.
    pub time: f64,
    pub stats: StepStats,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    Stepped(FrameInfo),
    Stopped(StopReason),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub sim_time: f64,
    pub clock_time: f64,
    pub dropped: f64,
    pub reason: StopReason,
    pub stats: StepStats,
}

/// Per-frame callbacks around the world step.
pub trait FrameHooks {
    /// Input goes here: driver commands, velocity overrides.
    fn before_step(&mut self, _world: &mut World, _frame: &FrameInfo) -> Result<(), PhysicsError> { Ok(()) }
    /// Read-only access to the stepped world, e.g. for pose extraction.
    fn after_step(&mut self, _world: &World, _frame: &FrameInfo) -> Result<(), PhysicsError> { Ok(()) }
}

impl FrameHooks for () {}

impl<A: FrameHooks, B: FrameHooks> FrameHooks for (A, B) {
    fn before_step(&mut self, world: &mut World, frame: &FrameInfo) -> Result<(), PhysicsError> {
        self.0.before_step(world, frame)?;
        self.1.before_step(world, frame)
    }
    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> {
        self.0.after_step(world, frame)?;
        self.1.after_step(world, frame)
    }
}

impl<H: FrameHooks + ?Sized> FrameHooks for &mut H {
    fn before_step(&mut self, world: &mut World, frame: &FrameInfo) -> Result<(), PhysicsError> { (**self).before_step(world, frame) }
    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> { (**self).after_step(world, frame) }
}

pub struct StepLoop<C: FrameClock> {
    clock: C,
    settings: LoopSettings,
    token: ShutdownToken,
    state: LoopState,
    stop_reason: Option<StopReason>,
    start_t: Option<f64>,
    last_t: Option<f64>,
    residual: f32,
    frame: u64,
    sim_time: f64,
    dropped: f64,
    totals: StepStats,
    keep_awake: Vec<BodyId>,
}

impl<C: FrameClock> StepLoop<C> {
    pub fn new(clock: C, settings: LoopSettings) -> Result<Self, PhysicsError> {
        settings.validate()?;
        Ok(Self {
            clock,
            settings,
            token: ShutdownToken::new(),
            state: LoopState::Idle,
            stop_reason: None,
            start_t: None,
            last_t: None,
            residual: 0.0,
            frame: 0,
            sim_time: 0.0,
            dropped: 0.0,
            totals: StepStats::default(),
            keep_awake: Vec::new(),
        })
    }

    /// Share an existing token, e.g. one held by an input thread.
    pub fn with_shutdown_token(mut self, token: ShutdownToken) -> Self { self.token = token; self }

    pub fn shutdown_token(&self) -> ShutdownToken { self.token.clone() }
    pub fn settings(&self) -> &LoopSettings { &self.settings }
    pub fn state(&self) -> LoopState { self.state }
    pub fn stop_reason(&self) -> Option<StopReason> { self.stop_reason }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn sim_time(&self) -> f64 { self.sim_time }
    /// Clock reading at the end of the last frame.
    pub fn last_time(&self) -> Option<f64> { self.last_t }
    pub fn clock(&self) -> &C { &self.clock }
    pub fn clock_mut(&mut self) -> &mut C { &mut self.clock }

    /// Re-activated before every step so input always reaches it.
    pub fn keep_awake(&mut self, id: BodyId) {
        if !self.keep_awake.contains(&id) { self.keep_awake.push(id); }
    }

    pub fn release(&mut self, id: BodyId) { self.keep_awake.retain(|b| *b != id); }

    fn check_stop(&self) -> Option<StopReason> {
        if self.token.is_requested() { return Some(StopReason::Shutdown); }
        if let Some(max) = self.settings.max_frames {
            if self.frame >= max { return Some(StopReason::FrameLimit); }
        }
        if let (Some(max), Some(start), Some(last)) = (self.settings.max_seconds, self.start_t, self.last_t) {
            if last - start >= max { return Some(StopReason::DurationReached); }
        }
        None
    }

    fn stop(&mut self, reason: StopReason) -> FrameOutcome {
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
        FrameOutcome::Stopped(reason)
    }

    /// One frame. Once stopped, every further call reports the same reason.
    pub fn tick<H: FrameHooks>(&mut self, world: &mut World, hooks: &mut H) -> Result<FrameOutcome, PhysicsError> {
        if let Some(reason) = self.stop_reason {
            return Ok(FrameOutcome::Stopped(reason));
        }
        if let Some(reason) = self.check_stop() {
            return Ok(self.stop(reason));
        }
        match self.advance(world, hooks) {
            Ok(info) => Ok(FrameOutcome::Stepped(info)),
            Err(e) => {
                self.stop(StopReason::Failed);
                Err(e)
            }
        }
    }

    fn advance<H: FrameHooks>(&mut self, world: &mut World, hooks: &mut H) -> Result<FrameInfo, PhysicsError> {
        let now = self.clock.now();
        let last = *self.last_t.get_or_insert(now);
        self.start_t.get_or_insert(now);
        // A clock reading in the past neither steps backwards nor rewinds `last_t`.
        let elapsed = if now > last { (now - last) as f32 } else { 0.0 };
        if now > last { self.last_t = Some(now); }

        let plan = self.settings.dt_policy.plan(elapsed, &mut self.residual);
        if plan.dropped > 0.0 {
            eprintln!("[loop] frame {}: {:.3}s of elapsed time not simulated", self.frame + 1, plan.dropped);
            self.dropped += plan.dropped as f64;
        }
        let mut info = FrameInfo {
            frame: self.frame + 1,
            elapsed,
            plan,
            time: self.sim_time + plan.dt as f64 * plan.count as f64,
            stats: StepStats::default(),
        };

        hooks.before_step(world, &info)?;
        for &id in &self.keep_awake {
            if world.body(id)?.is_in_world() { world.activate_body(id)?; }
        }

        self.state = LoopState::Stepping;
        for _ in 0..plan.count {
            let s = world.step(plan.dt, self.settings.collision_steps)?;
            info.stats.accumulate(&s);
        }
        self.state = LoopState::Idle;

        self.frame = info.frame;
        self.sim_time = info.time;
        self.totals.accumulate(&info.stats);
        hooks.after_step(world, &info)?;
        Ok(info)
    }

    /// Tick until a stop condition holds.
    pub fn run<H: FrameHooks>(&mut self, world: &mut World, hooks: &mut H) -> Result<RunSummary, PhysicsError> {
        loop {
            if let FrameOutcome::Stopped(reason) = self.tick(world, hooks)? {
                return Ok(RunSummary {
                    frames: self.frame,
                    sim_time: self.sim_time,
                    clock_time: match (self.start_t, self.last_t) { (Some(s), Some(l)) => l - s, _ => 0.0 },
                    dropped: self.dropped,
                    reason,
                    stats: self.totals,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, SimulatedClock};
    use rigidframe_core::{vec3, LayerPolicy, ObjectLayer, Quat, Vec3};
    use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
    use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
    use rigidframe_world::WorldBuilder;

    fn world_with_box() -> (World, BodyId) {
        let mut w = WorldBuilder::new().policy(LayerPolicy::collide_none()).build().unwrap();
        let shape = BoxShapeSettings::new(Vec3::splat(0.5)).create().unwrap();
        let id = w
            .create_and_add_body(&BodyCreationSettings::new(shape, vec3(0.0, 10.0, 0.0), Quat::IDENTITY, MotionType::Dynamic, ObjectLayer(0)), Activation::Activate)
            .unwrap();
        (w, id)
    }

    fn fixed(frames: u64) -> LoopSettings {
        LoopSettings { dt_policy: DtPolicy::PassThrough, max_frames: Some(frames), ..Default::default() }
    }

    #[test]
    fn frame_limit_stops_the_loop() {
        let (mut w, _) = world_with_box();
        let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), fixed(10)).unwrap();
        let s = l.run(&mut w, &mut ()).unwrap();
        assert_eq!(s.reason, StopReason::FrameLimit);
        assert_eq!(s.frames, 10);
        assert_eq!(w.tick_index(), 9, "the first frame only sets the start time");
        assert_eq!(l.state(), LoopState::Stopped);
        assert!(matches!(l.tick(&mut w, &mut ()).unwrap(), FrameOutcome::Stopped(StopReason::FrameLimit)));
    }

    #[test]
    fn duration_bound_uses_clock_time() {
        let (mut w, _) = world_with_box();
        let settings = LoopSettings { dt_policy: DtPolicy::PassThrough, max_seconds: Some(1.0), ..Default::default() };
        let mut l = StepLoop::new(SimulatedClock::new(0.1), settings).unwrap();
        let s = l.run(&mut w, &mut ()).unwrap();
        assert_eq!(s.reason, StopReason::DurationReached);
        assert!((s.clock_time - 1.0).abs() < 1e-9 || s.clock_time > 1.0);
        assert!((s.sim_time - s.clock_time).abs() < 1e-5);
    }

    #[test]
    fn shutdown_token_wins_before_stepping() {
        let (mut w, _) = world_with_box();
        let mut l = StepLoop::new(SimulatedClock::new(0.1), LoopSettings::default()).unwrap();
        l.shutdown_token().request();
        let before = w.step_hash();
        assert_eq!(l.tick(&mut w, &mut ()).unwrap(), FrameOutcome::Stopped(StopReason::Shutdown));
        assert_eq!(before, w.step_hash());
    }

    #[test]
    fn zero_elapsed_leaves_poses_unchanged() {
        let (mut w, id) = world_with_box();
        let mut l = StepLoop::new(ManualClock::new(), fixed(100)).unwrap();
        let before = w.world_transform(id).unwrap();
        for _ in 0..5 {
            let FrameOutcome::Stepped(info) = l.tick(&mut w, &mut ()).unwrap() else { panic!("stopped") };
            assert_eq!(info.elapsed, 0.0);
        }
        assert_eq!(before, w.world_transform(id).unwrap());
    }

    #[test]
    fn clock_going_backwards_never_rewinds() {
        let (mut w, id) = world_with_box();
        let mut l = StepLoop::new(ManualClock::new(), fixed(100)).unwrap();
        l.clock_mut().set(5.0);
        l.tick(&mut w, &mut ()).unwrap();
        l.clock_mut().set(4.0);
        let before = w.world_transform(id).unwrap();
        let FrameOutcome::Stepped(info) = l.tick(&mut w, &mut ()).unwrap() else { panic!("stopped") };
        assert_eq!(info.elapsed, 0.0);
        assert_eq!(l.last_time(), Some(5.0));
        assert_eq!(before, w.world_transform(id).unwrap());
        l.clock_mut().set(5.5);
        let FrameOutcome::Stepped(info) = l.tick(&mut w, &mut ()).unwrap() else { panic!("stopped") };
        assert!((info.elapsed - 0.5).abs() < 1e-6);
    }

    #[test]
    fn keep_awake_wakes_a_sleeping_body() {
        let (mut w, id) = world_with_box();
        w.deactivate_body(id).unwrap();
        let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), fixed(3)).unwrap();
        l.keep_awake(id);
        l.run(&mut w, &mut ()).unwrap();
        assert!(w.body(id).unwrap().is_active());
        assert!(w.world_transform(id).unwrap().pos.y < 10.0);
    }

    struct Counter { before: u32, after: u32, stop_at: u32, token: ShutdownToken }

    impl FrameHooks for Counter {
        fn before_step(&mut self, _w: &mut World, _f: &FrameInfo) -> Result<(), PhysicsError> {
            self.before += 1;
            Ok(())
        }
        fn after_step(&mut self, w: &World, f: &FrameInfo) -> Result<(), PhysicsError> {
            self.after += 1;
            assert_eq!(w.tick_index(), f.frame - 1);
            if self.after == self.stop_at { self.token.request(); }
            Ok(())
        }
    }

    #[test]
    fn hooks_bracket_each_step_and_can_request_shutdown() {
        let (mut w, _) = world_with_box();
        let mut l = StepLoop::new(SimulatedClock::new(1.0 / 60.0), LoopSettings { dt_policy: DtPolicy::PassThrough, ..Default::default() }).unwrap();
        let mut hooks = Counter { before: 0, after: 0, stop_at: 4, token: l.shutdown_token() };
        let s = l.run(&mut w, &mut hooks).unwrap();
        assert_eq!(s.reason, StopReason::Shutdown);
        assert_eq!((hooks.before, hooks.after), (4, 4));
    }

    #[test]
    fn step_errors_stop_the_loop() {
        let (mut w, id) = world_with_box();
        let mut l = StepLoop::new(SimulatedClock::new(0.1), fixed(10)).unwrap();
        l.keep_awake(id);
        l.tick(&mut w, &mut ()).unwrap();
        w.remove_body(id).unwrap();
        w.destroy_body(id).unwrap();
        assert!(matches!(l.tick(&mut w, &mut ()), Err(PhysicsError::StaleBody(b)) if b == id));
        assert_eq!(l.stop_reason(), Some(StopReason::Failed));
    }
}
