//! Step diagnostics: debug print settings, the stage schedule, and an event ledger.

use std::collections::VecDeque;
use std::io::{self, Write};

use rigidframe_core::{schedule_digest, BodyId, ConstraintId, StepListenerId, StepStage, StepStats};
use serde::{Deserialize, Serialize};

/// What the world prints, and how often. `print_every == 0` disables printing.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub print_every: u64,
    pub show_bodies: bool,
    pub show_contacts: bool,
    pub show_energy: bool,
    /// Cap on lines per section of a debug block.
    pub max_lines: usize,
    /// Record a ledger entry set every N steps; 0 records nothing.
    pub ledger_every: u64,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self { print_every: 0, show_bodies: true, show_contacts: false, show_energy: true, max_lines: 16, ledger_every: 0 }
    }
}

impl DebugSettings {
    pub fn every(n: u64) -> Self { Self { print_every: n, ..Self::default() } }

    #[inline] pub fn should_print(&self, tick: u64) -> bool { self.print_every > 0 && tick % self.print_every == 0 }
    #[inline] pub fn should_record(&self, tick: u64) -> bool { self.ledger_every > 0 && tick % self.ledger_every == 0 }
}

/// Stages run by the current step, in order.
#[derive(Default)]
pub struct ScheduleRecorder { stages: Vec<StepStage> }

impl ScheduleRecorder {
    pub fn new() -> Self { Self { stages: Vec::new() } }
    pub fn push(&mut self, s: StepStage) { self.stages.push(s); }
    pub fn clear(&mut self) { self.stages.clear(); }
    pub fn stages(&self) -> &[StepStage] { &self.stages }
    pub fn digest(&self) -> [u8; 32] { schedule_digest(&self.stages) }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Step { tick: u64, dt: f32, stats: StepStats },
    Contact { a: BodyId, b: BodyId, depth: f32 },
    Woke { body: BodyId },
    Slept { body: BodyId },
    BodyAdded { body: BodyId },
    BodyRemoved { body: BodyId },
    ConstraintAdded { constraint: ConstraintId },
    ConstraintRemoved { constraint: ConstraintId },
    ListenerAdded { listener: StepListenerId },
    ListenerRemoved { listener: StepListenerId },
}

/// Bounded event log. Oldest events drop first once full.
pub struct Ledger {
    events: VecDeque<LedgerEvent>,
    capacity: usize,
    dropped: u64,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self { events: VecDeque::with_capacity(capacity.min(4096)), capacity, dropped: 0 }
    }

    pub fn push(&mut self, e: LedgerEvent) {
        if self.capacity == 0 { self.dropped += 1; return; }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(e);
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }
    /// Events evicted or refused since creation.
    pub fn dropped(&self) -> u64 { self.dropped }
    pub fn clear(&mut self) { self.events.clear(); }
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> + '_ { self.events.iter() }

    /// One JSON object per line, oldest first.
    pub fn write_json_lines<W: Write>(&self, mut out: W) -> io::Result<()> {
        for e in &self.events {
            serde_json::to_writer(&mut out, e)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}
