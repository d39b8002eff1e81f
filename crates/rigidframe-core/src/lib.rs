pub mod scalar;
pub mod ids;
pub mod arena;
pub mod types;
pub mod hash;
pub mod time;
pub mod schedule;
pub mod layers;
pub mod error;

pub use scalar::Scalar;
pub use ids::{BodyId, ConstraintId, StepListenerId, Handle};
pub use arena::Arena;
pub use types::{Vec3, Mat3, Isometry, vec3, iso};
pub use hash::{StepHasher, hash_vec3, hash_quat};
pub use time::StepStats;
pub use schedule::{StepStage, schedule_digest};
pub use layers::{
    ObjectLayer, BroadPhaseLayer, LayerIndex, CollisionPolicy, AlwaysCollide, NeverCollide,
    FnPolicy, PairTable, BroadPhaseLayerMap, LayerPolicy,
};
pub use error::PhysicsError;
pub use glam::Quat;
