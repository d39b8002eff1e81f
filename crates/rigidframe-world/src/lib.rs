mod contact;
mod debug;
mod job_pool;
mod settings;

use std::collections::HashSet;

use rigidframe_articulation::{Constraint, ConstraintGraph, ConstraintSettings, StepContext, StepListener};
use rigidframe_collision::{BroadPhase, Proxy};
use rigidframe_core::{
    hash_quat, hash_vec3, Arena, BodyId, ConstraintId, Handle, Isometry, LayerPolicy, PhysicsError, Quat,
    StepHasher, StepListenerId, StepStage, StepStats, Vec3,
};
use rigidframe_dynamics::{
    cast_ray, integrate, update_velocities, Activation, Body, BodyCreationSettings, BodyRegistry, MotionQuality,
    RayCastResult,
};
use rigidframe_geom::Aabb;
use rigidframe_viz::{DebugSettings, Ledger, LedgerEvent, ScheduleRecorder};

use crate::contact::Contact;

pub use job_pool::JobPool;
pub use settings::WorldSettings;

/* ---------------- Builder ---------------- */
pub struct WorldBuilder {
    settings: WorldSettings,
    policy: LayerPolicy,
    debug: DebugSettings,
    ledger_capacity: usize,
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            settings: WorldSettings::default(),
            policy: LayerPolicy::collide_all(),
            debug: DebugSettings::default(),
            ledger_capacity: 4096,
        }
    }

    pub fn settings(mut self, s: WorldSettings) -> Self { self.settings = s; self }
    pub fn policy(mut self, p: LayerPolicy) -> Self { self.policy = p; self }
    pub fn debug(mut self, d: DebugSettings) -> Self { self.debug = d; self }
    pub fn ledger_capacity(mut self, n: usize) -> Self { self.ledger_capacity = n; self }

    pub fn with_capacity(mut self, bodies: usize, pairs: usize, contacts: usize) -> Self {
        self.settings = self.settings.with_capacity(bodies, pairs, contacts);
        self
    }

    pub fn gravity(mut self, g: Vec3) -> Self { self.settings.gravity = g; self }

    pub fn build(self) -> Result<World, PhysicsError> {
        let mut w = World::new(self.settings, self.policy)?;
        w.debug = self.debug;
        w.ledger = Ledger::new(self.ledger_capacity);
        Ok(w)
    }
}

/* ---------------- World ---------------- */
/// Bodies, constraints and step listeners under one gravity and layer policy.
///
/// Every mutating call takes `&mut self`, so a step can never overlap body or
/// constraint edits. After [`World::shutdown`] succeeds, every call that touches
/// simulation state returns [`PhysicsError::WorldShutDown`].
pub struct World {
    settings: WorldSettings,
    policy: LayerPolicy,
    bodies: BodyRegistry,
    constraints: ConstraintGraph,
    listeners: Arena<StepListenerId, Box<dyn StepListener>>,
    broad_phase: BroadPhase,
    pool: JobPool,
    schedule: ScheduleRecorder,
    debug: DebugSettings,
    ledger: Ledger,
    tick: u64,
    last_stats: StepStats,
    pairs: Vec<(BodyId, BodyId)>,
    contacts: Vec<Contact>,
    shut_down: bool,
}

impl World {
    /// Validates the settings and the policy, then allocates the broad-phase and job pool.
    pub fn new(settings: WorldSettings, policy: LayerPolicy) -> Result<Self, PhysicsError> {
        settings.validate()?;
        if let Some((a, b)) = policy.find_asymmetry() {
            return Err(PhysicsError::InvalidConfiguration(format!(
                "object layer predicate is not symmetric for ({}, {})", a.0, b.0
            )));
        }
        let pool = JobPool::new(settings.worker_threads)?;
        let broad_phase = BroadPhase::new(policy.map().num_broad_phase_layers());
        Ok(Self {
            bodies: BodyRegistry::new(settings.max_bodies),
            constraints: ConstraintGraph::new(),
            listeners: Arena::new(),
            broad_phase,
            pool,
            schedule: ScheduleRecorder::new(),
            debug: DebugSettings::default(),
            ledger: Ledger::new(4096),
            tick: 0,
            last_stats: StepStats::default(),
            pairs: Vec::new(),
            contacts: Vec::new(),
            shut_down: false,
            settings,
            policy,
        })
    }

    #[inline]
    fn ensure_live(&self) -> Result<(), PhysicsError> {
        if self.shut_down { Err(PhysicsError::WorldShutDown) } else { Ok(()) }
    }

    /* ---------- read-only ---------- */
    #[inline] pub fn settings(&self) -> &WorldSettings { &self.settings }
    #[inline] pub fn policy(&self) -> &LayerPolicy { &self.policy }
    #[inline] pub fn gravity(&self) -> Vec3 { self.settings.gravity }
    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    #[inline] pub fn last_stats(&self) -> StepStats { self.last_stats }
    #[inline] pub fn is_shut_down(&self) -> bool { self.shut_down }
    #[inline] pub fn num_bodies(&self) -> usize { self.bodies.len() }
    #[inline] pub fn num_constraints(&self) -> usize { self.constraints.len() }
    #[inline] pub fn num_step_listeners(&self) -> usize { self.listeners.len() }
    #[inline] pub fn num_active_bodies(&self) -> usize { self.bodies.num_active() }
    #[inline] pub fn job_threads(&self) -> usize { self.pool.num_threads() }
    pub fn bodies(&self) -> &BodyRegistry { &self.bodies }
    pub fn constraints(&self) -> &ConstraintGraph { &self.constraints }
    pub fn broad_phase(&self) -> &BroadPhase { &self.broad_phase }
    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub fn schedule(&self) -> &[StepStage] { self.schedule.stages() }

    pub fn body(&self, id: BodyId) -> Result<&Body, PhysicsError> { self.bodies.get(id) }

    /// Current pose. Fails for destroyed ids; removed bodies stay readable.
    pub fn world_transform(&self, id: BodyId) -> Result<Isometry, PhysicsError> {
        Ok(self.bodies.get(id)?.transform())
    }

    /* ---------- debug ---------- */
    pub fn set_debug(&mut self, cfg: DebugSettings) { self.debug = cfg; }
    pub fn debug_settings(&self) -> &DebugSettings { &self.debug }

    fn record(&mut self, e: LedgerEvent) {
        if self.debug.ledger_every > 0 { self.ledger.push(e); }
    }

    /* ---------- bodies ---------- */
    /// Allocates the body without adding it to the broad-phase.
    pub fn create_body(&mut self, s: &BodyCreationSettings) -> Result<BodyId, PhysicsError> {
        self.ensure_live()?;
        self.bodies.create(s)
    }

    pub fn add_body(&mut self, id: BodyId, activation: Activation) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.mark_added(id, activation)?;
        let b = self.bodies.get(id)?;
        let proxy = Proxy { body: id, layer: b.object_layer(), aabb: proxy_bounds(b, 0.0, self.settings.speculative_margin) };
        self.broad_phase.insert(proxy, &self.policy);
        self.record(LedgerEvent::BodyAdded { body: id });
        Ok(())
    }

    pub fn create_and_add_body(&mut self, s: &BodyCreationSettings, activation: Activation) -> Result<BodyId, PhysicsError> {
        let id = self.create_body(s)?;
        self.add_body(id, activation)?;
        Ok(id)
    }

    /// Leaves the broad-phase; the id stays valid for inspection until destroyed.
    pub fn remove_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.mark_removed(id)?;
        self.broad_phase.remove(id);
        self.record(LedgerEvent::BodyRemoved { body: id });
        Ok(())
    }

    /// Frees the slot. The body must be removed and no constraint may reference it.
    pub fn destroy_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        if self.bodies.get(id)?.is_in_world() {
            return Err(PhysicsError::BodyStillInWorld(id));
        }
        if let Some(constraint) = self.constraints.find_referencing(id) {
            return Err(PhysicsError::BodyInUse { body: id, constraint });
        }
        self.bodies.destroy(id)?;
        Ok(())
    }

    pub fn activate_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.activate(id)
    }

    pub fn deactivate_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.deactivate(id)
    }

    /// Does not wake the body.
    pub fn set_linear_and_angular_velocity(&mut self, id: BodyId, lin: Vec3, ang: Vec3) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.get_mut(id)?.set_velocities(lin, ang);
        Ok(())
    }

    pub fn set_body_transform(&mut self, id: BodyId, pos: Vec3, rot: Quat) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        if !(pos.is_finite() && rot.is_finite()) {
            return Err(PhysicsError::InvalidConfiguration(format!("non-finite pose for {id}")));
        }
        self.bodies.get_mut(id)?.set_transform(pos, rot);
        Ok(())
    }

    pub fn set_friction(&mut self, id: BodyId, f: f32) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.get_mut(id)?.set_friction(f);
        Ok(())
    }

    pub fn set_restitution(&mut self, id: BodyId, r: f32) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.bodies.get_mut(id)?.set_restitution(r);
        Ok(())
    }

    /* ---------- constraints & listeners ---------- */
    pub fn add_constraint<C: Constraint>(&mut self, c: C) -> Result<ConstraintId, PhysicsError> {
        self.ensure_live()?;
        let id = self.constraints.add(Box::new(c), &self.bodies)?;
        self.record(LedgerEvent::ConstraintAdded { constraint: id });
        Ok(id)
    }

    /// Build from `settings` against the bodies' current poses and register the result.
    pub fn create_constraint<S: ConstraintSettings>(&mut self, settings: &S, a: BodyId, b: BodyId) -> Result<ConstraintId, PhysicsError> {
        self.ensure_live()?;
        let c = settings.create(a, b, &self.bodies)?;
        self.add_constraint(c)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Box<dyn Constraint>, PhysicsError> {
        self.ensure_live()?;
        let c = self.constraints.remove(id)?;
        self.record(LedgerEvent::ConstraintRemoved { constraint: id });
        Ok(c)
    }

    pub fn constraint<T: Constraint>(&self, id: ConstraintId) -> Result<&T, PhysicsError> {
        self.constraints.get_as::<T>(id)
    }

    pub fn constraint_mut<T: Constraint>(&mut self, id: ConstraintId) -> Result<&mut T, PhysicsError> {
        self.ensure_live()?;
        self.constraints.get_as_mut::<T>(id)
    }

    pub fn add_step_listener<L: StepListener + 'static>(&mut self, listener: L) -> Result<StepListenerId, PhysicsError> {
        self.ensure_live()?;
        let id = self.listeners.insert(Box::new(listener));
        self.record(LedgerEvent::ListenerAdded { listener: id });
        Ok(id)
    }

    pub fn remove_step_listener(&mut self, id: StepListenerId) -> Result<Box<dyn StepListener>, PhysicsError> {
        self.ensure_live()?;
        let l = self.listeners.remove(id).ok_or(PhysicsError::StaleListener(id))?;
        self.record(LedgerEvent::ListenerRemoved { listener: id });
        Ok(l)
    }

    /* ---------- broad-phase & queries ---------- */
    /// Full rebuild of the broad-phase ordering. Call once after bulk insertion.
    pub fn optimize_broad_phase(&mut self) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.broad_phase.optimize();
        Ok(())
    }

    /// Closest in-world body along the ray.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayCastResult> {
        cast_ray(&self.broad_phase, &self.bodies, origin, dir, max_distance, |_, _| true)
    }

    /* ---------- stepping ---------- */
    /// Advance by `dt`, split into `collision_steps` equal collision passes.
    ///
    /// A zero `dt` returns immediately without touching any state. Capacity overflow
    /// during a pass is reported before any body of that pass is modified.
    pub fn step(&mut self, dt: f32, collision_steps: u32) -> Result<StepStats, PhysicsError> {
        self.ensure_live()?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }
        if collision_steps == 0 {
            return Err(PhysicsError::InvalidConfiguration("collision_steps must be at least 1".into()));
        }
        if dt == 0.0 {
            return Ok(StepStats::default());
        }

        let pool = self.pool.clone();
        let step_dt = dt / collision_steps as f32;
        let mut stats = StepStats::default();
        self.schedule.clear();
        let result: Result<(), PhysicsError> = pool.install(|| {
            for _ in 0..collision_steps {
                let s = self.collision_step(step_dt)?;
                stats.accumulate(&s);
            }
            Ok(())
        });
        result?;

        self.tick += 1;
        self.last_stats = stats;
        if self.debug.should_record(self.tick) {
            self.ledger.push(LedgerEvent::Step { tick: self.tick, dt, stats });
            for c in self.contacts.iter().take(self.debug.max_lines) {
                self.ledger.push(LedgerEvent::Contact { a: c.a, b: c.b, depth: c.depth });
            }
        }
        if self.debug.should_print(self.tick) {
            self.print_debug_block();
        }
        Ok(stats)
    }

    fn collision_step(&mut self, dt: f32) -> Result<StepStats, PhysicsError> {
        let margin = self.settings.speculative_margin;
        let mut stats = StepStats { collision_steps: 1, ..Default::default() };

        self.schedule.push(StepStage::UpdateAabbsPre);
        let bodies = &self.bodies;
        self.broad_phase.update(|id| bodies.get(id).ok().map(|b| proxy_bounds(b, dt, margin)));

        self.schedule.push(StepStage::BroadphaseSap);
        let bodies = &self.bodies;
        let moving = |id: BodyId| bodies.get(id).is_ok_and(|b| b.is_active() && !b.is_static());
        let dynamic = |id: BodyId| bodies.get(id).is_ok_and(|b| b.is_dynamic());
        self.broad_phase.find_pairs(
            &self.policy,
            |p, q| (moving(p.body) || moving(q.body)) && (dynamic(p.body) || dynamic(q.body)),
            &mut self.pairs,
        );
        stats.pairs_tested = self.pairs.len() as u32;
        if self.pairs.len() > self.settings.max_body_pairs {
            return Err(PhysicsError::CapacityExceeded { resource: "body pairs", limit: self.settings.max_body_pairs });
        }

        self.schedule.push(StepStage::Narrowphase);
        self.contacts = contact::generate(&self.bodies, &self.pairs, margin);
        stats.contacts = self.contacts.len() as u32;
        if self.contacts.len() > self.settings.max_contact_constraints {
            return Err(PhysicsError::CapacityExceeded {
                resource: "contact constraints",
                limit: self.settings.max_contact_constraints,
            });
        }

        // Sleeping bodies touched by moving ones, or joined to them, wake up.
        let bodies = &self.bodies;
        let awake = |id: BodyId| bodies.get(id).is_ok_and(|b| b.is_active());
        let sleepers: Vec<BodyId> = self.pairs.iter()
            .filter(|&&(a, b)| awake(a) != awake(b))
            .map(|&(a, b)| if awake(a) { b } else { a })
            .filter(|&id| bodies.get(id).is_ok_and(|b| b.is_dynamic()))
            .collect();
        for id in sleepers {
            if self.bodies.activate(id).is_ok() {
                self.record(LedgerEvent::Woke { body: id });
            }
        }
        self.constraints.propagate_activation(&mut self.bodies);

        self.schedule.push(StepStage::StepListeners);
        let gravity = self.settings.gravity;
        for (_, l) in self.listeners.iter_mut() {
            let mut ctx = StepContext {
                dt,
                gravity,
                bodies: &mut self.bodies,
                constraints: &mut self.constraints,
                broad_phase: &self.broad_phase,
                policy: &self.policy,
            };
            l.on_step(&mut ctx);
            stats.listeners_run += 1;
        }

        let substeps = self.settings.solver_substeps;
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.schedule.push(StepStage::Integrate);
            self.bodies.par_for_each_active(|b| integrate(b, gravity, h));
            self.schedule.push(StepStage::SolvePositions);
            contact::solve_positions(&mut self.contacts, &mut self.bodies);
            self.constraints.solve_positions(&mut self.bodies, h);
            self.schedule.push(StepStage::UpdateVelocities);
            self.bodies.par_for_each_active(|b| update_velocities(b, h));
            self.schedule.push(StepStage::SolveVelocities);
            contact::solve_velocities(&self.contacts, &mut self.bodies, h, gravity);
            self.constraints.solve_velocities(&mut self.bodies, h);
        }

        self.schedule.push(StepStage::Sleep);
        self.update_sleep(dt);
        stats.active_bodies = self.bodies.num_active() as u32;

        self.schedule.push(StepStage::UpdateAabbsPost);
        let bodies = &self.bodies;
        self.broad_phase.update(|id| bodies.get(id).ok().map(|b| proxy_bounds(b, 0.0, margin)));
        Ok(stats)
    }

    /// A slow body sleeps only when every awake dynamic body it touches or is joined to
    /// is ready to sleep as well.
    fn update_sleep(&mut self, dt: f32) {
        let sleep = self.settings.sleep;
        let mut ready: HashSet<BodyId> = HashSet::new();
        for (id, b) in self.bodies.iter_mut() {
            if b.is_active() && rigidframe_dynamics::sleep::update_sleep(b, &sleep, dt) {
                ready.insert(id);
            }
        }
        if ready.is_empty() { return; }

        let awake_dynamic = |id: BodyId| self.bodies.get(id).is_ok_and(|b| b.is_active() && b.is_dynamic());
        let mut links: Vec<(BodyId, BodyId)> = self.contacts.iter().map(|c| (c.a, c.b)).collect();
        links.extend(self.constraints.iter().filter_map(|(_, c)| match c.bodies() {
            (a, Some(b)) => Some((a, b)),
            _ => None,
        }));
        let mut blocked: HashSet<BodyId> = HashSet::new();
        for (a, b) in links {
            if ready.contains(&a) && awake_dynamic(b) && !ready.contains(&b) { blocked.insert(a); }
            if ready.contains(&b) && awake_dynamic(a) && !ready.contains(&a) { blocked.insert(b); }
        }

        let mut sleepers: Vec<BodyId> = ready.difference(&blocked).copied().collect();
        sleepers.sort_unstable();
        for id in sleepers {
            if self.bodies.deactivate(id).is_ok() {
                self.record(LedgerEvent::Slept { body: id });
            }
        }
    }

    /// Digest over every body's state and the stages run by the last step.
    pub fn step_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        h.update_u64(self.tick);
        for (id, b) in self.bodies.iter() {
            h.update_u64(((id.index() as u64) << 32) | id.generation() as u64);
            hash_vec3(&mut h, &b.position());
            hash_quat(&mut h, &b.rotation());
            hash_vec3(&mut h, &b.linear_velocity());
            hash_vec3(&mut h, &b.angular_velocity());
            h.update_bytes(&[b.is_active() as u8, b.is_in_world() as u8]);
        }
        h.update_bytes(&self.schedule.digest());
        h.finalize()
    }

    /* ---------- teardown ---------- */
    /// Succeeds only once every body is destroyed and every constraint and listener
    /// removed. Afterwards the world refuses further work.
    pub fn shutdown(&mut self) -> Result<(), PhysicsError> {
        if self.shut_down { return Ok(()); }
        let (bodies, constraints, listeners) = (self.bodies.len(), self.constraints.len(), self.listeners.len());
        if bodies + constraints + listeners > 0 {
            return Err(PhysicsError::ShutdownWithLiveObjects { bodies, constraints, listeners });
        }
        self.pairs = Vec::new();
        self.contacts = Vec::new();
        self.shut_down = true;
        Ok(())
    }
}

/// Broad-phase bounds: shape box grown by the speculative margin, swept along the
/// velocity for linear-cast bodies.
fn proxy_bounds(b: &Body, dt: f32, margin: f32) -> Aabb {
    let mut aabb = b.world_aabb();
    aabb.expand_by(margin);
    if b.motion_quality() == MotionQuality::LinearCast && b.is_active() {
        aabb.sweep(b.linear_velocity() * dt);
    }
    aabb
}
