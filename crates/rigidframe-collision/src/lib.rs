pub mod broadphase;
pub mod narrowphase;

pub use broadphase::{BroadPhase, Proxy};
pub use narrowphase::{collide, ContactManifold, ContactPoint, MAX_MANIFOLD_POINTS};
