//! # Raycast Hitbox
//!
//! Per-frame hit detection for fast-moving attachment points.
//!
//! Every tick, each point of an armed hitbox casts a ray from where it was
//! last tick to where it is now, so thin or fast geometry cannot be skipped
//! between frames.
//!
//! ## Features
//!
//! - **Four point kinds**: rigid-body offsets, skeletal-joint offsets, linked
//!   marker pairs and tracked markers
//! - **Lifecycle**: arm/disarm, timed auto-disarm, deferred destruction
//! - **Hit classification**: per-entity, per-object, or unfiltered
//! - **Debug rays**: pooled line resources for an external renderer
//!
//! ## Quick Start
//!
//! ```rust
//! use raycast_hitbox::prelude::*;
//!
//! let mut scene = StaticScene::new();
//! let sword = scene.add_body("Sword", None, Transform::identity());
//!
//! let mut engine = HitboxEngine::new(EngineConfig::default()).unwrap();
//! let hitbox = engine.create_hitbox(sword, &scene);
//! engine
//!     .hitbox_mut(hitbox)
//!     .unwrap()
//!     .add_offset_points(sword, &[Vec3::new(0.0, 1.0, 0.0)], Some("blade"));
//! engine.hitbox_mut(hitbox).unwrap().on_hit.connect(|hit, _| {
//!     log::info!("struck {}", hit.surface);
//! });
//!
//! engine.arm(hitbox, Some(0.5)).unwrap();
//! let mut clock = FrameClock::new(engine.config().tick_rate);
//! for _ in 0..10 {
//!     engine.tick(clock.step(), &scene);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod config;
pub mod debug;
pub mod engine;
pub mod foundation;
pub mod hitbox;
pub mod physics;
pub mod scene;

#[cfg(test)]
mod tests;

pub use engine::{EngineError, HitboxEngine, TickReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig, HitboxSettings},
        debug::{DebugRay, DebugRayPool},
        engine::{EngineError, HitboxEngine, TickReport},
        foundation::{
            collections::{DebugRayId, HitboxId, PointId},
            math::{Quat, Transform, Vec3},
            time::{FrameClock, Stopwatch},
        },
        hitbox::{
            DetectionMode, HitEvent, Hitbox, HitboxCommands, Point, SolverKind, UpdateEvent,
        },
        physics::{BoundingSphere, CollisionLayers, Plane, Triangle},
        scene::{ColliderShape, FilterType, ObjectId, RayFilter, RayHit, SceneQuery, StaticScene},
    };
}
