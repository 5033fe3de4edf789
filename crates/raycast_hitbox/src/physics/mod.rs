//! Physics primitives backing the in-memory scene
//!
//! Segment ray tests against simple shapes, plus collision-layer filtering.

pub mod collision_layers;
pub mod primitives;

pub use collision_layers::CollisionLayers;
pub use primitives::{BoundingSphere, Intersection, Plane, Ray, Triangle};
