/// Counters from one `World::step` call, summed over its collision steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StepStats {
    pub collision_steps: u32,
    pub pairs_tested: u32,
    pub contacts: u32,
    pub active_bodies: u32,
    pub listeners_run: u32,
}

impl StepStats {
    pub fn accumulate(&mut self, other: &StepStats) {
        self.collision_steps += other.collision_steps;
        self.pairs_tested += other.pairs_tested;
        self.contacts += other.contacts;
        self.active_bodies = other.active_bodies;
        self.listeners_run += other.listeners_run;
    }
}
