//! Debug visualization
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 10.2:
//! "Debug Drawing Facilities"

pub mod ray_pool;

pub use ray_pool::{DebugRay, DebugRayPool, HIT_COLOR, RAY_COLOR};
