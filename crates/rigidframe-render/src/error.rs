use rigidframe_core::PhysicsError;
use thiserror::Error;

/// Failures on the drawing side.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pose lookup: {0}")]
    Physics(#[from] PhysicsError),
    #[error("wheel {index} of {vehicle} has no pose")]
    MissingWheel { vehicle: rigidframe_core::ConstraintId, index: usize },
    #[error("non-finite pose for `{0}`")]
    InvalidPose(String),
    #[error("frame output: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame encoding: {0}")]
    Encode(#[from] serde_json::Error),
}
