use thiserror::Error;

use crate::ids::{BodyId, ConstraintId, StepListenerId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("{resource} capacity exceeded (limit {limit})")]
    CapacityExceeded { resource: &'static str, limit: usize },
    #[error("{0} is stale or was never created")]
    StaleBody(BodyId),
    #[error("{0} is not in the world")]
    BodyNotInWorld(BodyId),
    #[error("{0} is already in the world")]
    BodyAlreadyInWorld(BodyId),
    #[error("{0} must be removed from the world before it is destroyed")]
    BodyStillInWorld(BodyId),
    #[error("{body} is still referenced by {constraint}")]
    BodyInUse { body: BodyId, constraint: ConstraintId },
    #[error("{0} is stale or was never added")]
    StaleConstraint(ConstraintId),
    #[error("{0} is stale or was never added")]
    StaleListener(StepListenerId),
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),
    #[error("invalid time step {0}")]
    InvalidTimeStep(f32),
    #[error("world was shut down")]
    WorldShutDown,
    #[error("shutdown with {bodies} bodies, {constraints} constraints and {listeners} listeners still alive")]
    ShutdownWithLiveObjects { bodies: usize, constraints: usize, listeners: usize },
    #[error("job pool: {0}")]
    JobPool(String),
}
