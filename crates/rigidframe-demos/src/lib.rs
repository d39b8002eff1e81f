//! Demo scenes and the shared command-line runner.
//! - `pendulum`: two box links hinged to a static base
//! - `suspension`: two boxes on a vertical slider held by a soft distance limit
//! - `tumble`: a free box spinning in zero gravity
//! - `vehicle`: a three-wheeled ray-cast vehicle on flat ground

pub mod cli;
pub mod layers;
pub mod scenes;

pub use cli::{run_demo, RunArgs};
pub use scenes::{Demo, DemoHooks, PendulumDemo, SuspensionDemo, TumbleDemo, VehicleDemo};
