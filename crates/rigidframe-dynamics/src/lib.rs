pub mod body;
pub mod registry;
pub mod integrate;
pub mod xpbd;
pub mod sleep;
pub mod query;

pub use body::{Body, BodyCreationSettings, BodyState, MotionType, MotionQuality, Activation};
pub use registry::BodyRegistry;
pub use integrate::{integrate, update_velocities};
pub use sleep::SleepSettings;
pub use query::{cast_ray, RayCastResult};
