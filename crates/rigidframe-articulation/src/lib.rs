pub mod constraint;
pub mod spring;
pub mod hinge;
pub mod slider;
pub mod distance;
pub mod graph;
pub mod listener;

pub use constraint::{Constraint, ConstraintKind, ConstraintSettings};
pub use spring::SpringSettings;
pub use hinge::{HingeConstraint, HingeConstraintSettings};
pub use slider::{SliderConstraint, SliderConstraintSettings};
pub use distance::{DistanceConstraint, DistanceConstraintSettings};
pub use graph::ConstraintGraph;
pub use listener::{StepListener, StepContext};

#[cfg(test)]
pub(crate) mod test_util;
