//! Frame orchestration around a [`World`](rigidframe_world::World).
//!
//! A [`SimulationContext`] owns the world and every handle created through it and
//! tears them down in reverse order. A [`StepLoop`] turns clock time into world
//! steps under a [`DtPolicy`], stops on a [`ShutdownToken`] or a run bound, and
//! hands each finished frame to [`FrameHooks`] such as the [`Presenter`].

mod clock;
mod context;
mod policy;
mod present;
mod shutdown;
mod step_loop;

pub use clock::{FrameClock, ManualClock, SimulatedClock, SystemClock};
pub use context::SimulationContext;
pub use policy::{DtPolicy, StepPlan};
pub use present::Presenter;
pub use shutdown::ShutdownToken;
pub use step_loop::{FrameHooks, FrameInfo, FrameOutcome, LoopSettings, LoopState, RunSummary, StepLoop, StopReason};
