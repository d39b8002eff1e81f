#![deny(missing_docs)]
//! Ray-cast wheeled vehicles.
//!
//! Usage:
//! - build a [`VehicleConstraintSettings`] for a dynamic chassis and `create` it.
//! - register the constraint with the world, then a [`VehicleStepListener`] pointing at it.
//! - feed [`DriverInput`] once per frame; wheel poses come from
//!   [`VehicleConstraint::wheel_world_transform`].

pub mod wheel;
pub mod controller;
pub mod vehicle;
pub mod listener;

pub use wheel::{Wheel, WheelContact, WheelSettings};
pub use controller::{DriverInput, WheeledControllerSettings};
pub use vehicle::{VehicleConstraint, VehicleConstraintSettings};
pub use listener::VehicleStepListener;
