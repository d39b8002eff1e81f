pub mod aabb;
pub mod shape;
pub mod mass;
pub mod ray;

pub use aabb::Aabb;
pub use shape::{Shape, ShapeKind, ShapeSettings, BoxShapeSettings, SphereShapeSettings, ShapeError, DEFAULT_CONVEX_RADIUS};
pub use mass::MassProps;
pub use ray::{Ray, RayHit};
