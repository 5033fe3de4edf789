//! Scene collaborator boundary
//!
//! The hitbox engine never owns scene geometry. Everything it needs from the
//! hosting world goes through [`SceneQuery`]:
//!
//! ```text
//! HitboxEngine::tick
//!      ↓
//! SceneQuery (transforms, marker positions, ray casts, actor lookup)
//!      ↓
//! Host scene graph / physics world
//! ```
//!
//! [`StaticScene`] is a small in-memory implementation used by tests and the
//! demo application.

mod static_scene;

pub use static_scene::{ColliderShape, StaticScene};

use crate::foundation::math::{Transform, Vec3};
use crate::physics::CollisionLayers;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an object in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a successful scene ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The surface that was struck
    pub surface: ObjectId,
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
}

/// How [`RayFilter::instances`] is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Ignore the listed instances and their descendants
    #[default]
    Exclude,
    /// Only consider the listed instances and their descendants
    Include,
}

/// Ray filter configuration handed to the scene unmodified
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RayFilter {
    /// Layers the ray may strike
    #[serde(default)]
    pub mask: CollisionLayers,
    /// Interpretation of `instances`
    #[serde(default)]
    pub filter_type: FilterType,
    /// Instances excluded or included, depending on `filter_type`
    #[serde(default)]
    pub instances: Vec<ObjectId>,
}

impl RayFilter {
    /// Filter ignoring the given instances
    pub fn excluding(instances: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            instances: instances.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Filter considering only the given instances
    pub fn including(instances: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            filter_type: FilterType::Include,
            instances: instances.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Restrict the filter to a layer mask
    pub fn with_mask(mut self, mask: CollisionLayers) -> Self {
        self.mask = mask;
        self
    }
}

/// A marker discovered under a hitbox target during recalibration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerInfo {
    /// The marker object
    pub marker: ObjectId,
    /// Optional hit-group label stored on the marker
    pub group: Option<String>,
}

/// Everything the engine asks of the host scene
///
/// Implementations must be pure queries: no call may mutate the scene. The
/// engine calls these synchronously from inside [`crate::engine::HitboxEngine::tick`].
pub trait SceneQuery {
    /// Cast a segment from `origin` along `direction`.
    ///
    /// `direction` is not normalized; its length is the segment length.
    /// Returns the nearest hit accepted by `filter`.
    fn cast_ray(&self, origin: Vec3, direction: Vec3, filter: &RayFilter) -> Option<RayHit>;

    /// Current world transform of a rigid body
    fn body_transform(&self, body: ObjectId) -> Option<Transform>;

    /// Current world transform of an animated skeletal joint
    fn joint_transform(&self, joint: ObjectId) -> Option<Transform>;

    /// Current world position of a marker object
    fn marker_position(&self, marker: ObjectId) -> Option<Vec3>;

    /// Nearest ancestor of `surface` that is a higher-level entity
    fn owning_entity(&self, surface: ObjectId) -> Option<ObjectId>;

    /// The recognizable actor sub-component of an entity, if it has one
    fn actor_of(&self, entity: ObjectId) -> Option<ObjectId>;

    /// All markers named `name` among the descendants of `root`
    fn find_markers(&self, root: ObjectId, name: &str) -> Vec<MarkerInfo>;
}
