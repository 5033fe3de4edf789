//! Ray solving strategies
//!
//! Every point kind answers three questions each tick:
//! - `solve`: where does this tick's ray start and how far did it travel?
//! - `update_to_next_position`: what becomes next tick's `last_position`?
//! - `visualize`: how should a debug line be oriented for this ray?
//!
//! The scheduler only ever talks to [`SolverKind`], so it does not care what a
//! point is attached to.

use super::point::{Point, TrackedRef};
use crate::foundation::math::{Transform, Vec3};
use crate::scene::{ObjectId, SceneQuery};
use thiserror::Error;

/// Closed set of point attachment kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Fixed local offset on a rigid body
    RigidOffset,
    /// Fixed local offset on an animated skeletal joint
    SkeletalOffset,
    /// Two externally positioned markers; ray runs from the first to the second
    PairedMarkers,
    /// One externally positioned marker tracked across frames
    TrackedMarker,
}

/// Ray computed for one point this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolvedRay {
    /// World-space start of the ray
    pub origin: Vec3,
    /// World-space travel; length equals the distance covered (not normalized)
    pub direction: Vec3,
}

/// A point could not be resolved this tick
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Rigid body transform unavailable
    #[error("rigid body {0} is unavailable")]
    MissingBody(ObjectId),

    /// Skeletal joint transform unavailable
    #[error("skeletal joint {0} is unavailable")]
    MissingJoint(ObjectId),

    /// Marker position unavailable
    #[error("marker {0} is unavailable")]
    MissingMarker(ObjectId),

    /// Tracked references do not fit the solver kind
    #[error("{0:?} point has malformed tracked references")]
    MalformedRefs(SolverKind),
}

impl SolverKind {
    /// Whether the point derives its position from an object transform and offset
    pub fn is_offset_based(self) -> bool {
        matches!(self, Self::RigidOffset | Self::SkeletalOffset)
    }

    /// Compute this tick's ray for `point`.
    ///
    /// A point without history snaps `last_position` to its current position,
    /// so the first ray after arming has zero length.
    pub fn solve(self, point: &mut Point, scene: &dyn SceneQuery) -> Result<SolvedRay, ResolveError> {
        match self {
            Self::RigidOffset | Self::SkeletalOffset => {
                let current = self.resolve_offset(point, scene)?;
                point.resolved_world_space = Some(current);
                Ok(Self::from_history(point, current))
            }
            Self::TrackedMarker => {
                let current = marker_position(scene, self.object_at(point, 0)?)?;
                Ok(Self::from_history(point, current))
            }
            Self::PairedMarkers => {
                let (from, to) = self.paired_positions(point, scene)?;
                Ok(SolvedRay {
                    origin: from,
                    direction: to - from,
                })
            }
        }
    }

    /// Position that becomes next tick's `last_position`
    pub fn update_to_next_position(self, point: &Point, scene: &dyn SceneQuery) -> Result<Vec3, ResolveError> {
        match self {
            Self::RigidOffset | Self::SkeletalOffset => match point.resolved_world_space {
                Some(resolved) => Ok(resolved),
                None => self.resolve_offset(point, scene),
            },
            // Paired markers advance along their first marker only
            Self::TrackedMarker | Self::PairedMarkers => marker_position(scene, self.object_at(point, 0)?),
        }
    }

    /// Orientation for a debug line drawn along the ray from `solve`
    pub fn visualize(self, point: &Point, scene: &dyn SceneQuery) -> Result<Transform, ResolveError> {
        let (from, to) = match self {
            Self::RigidOffset | Self::SkeletalOffset => {
                let to = match point.resolved_world_space {
                    Some(resolved) => resolved,
                    None => self.resolve_offset(point, scene)?,
                };
                (point.last_position.unwrap_or(to), to)
            }
            Self::TrackedMarker => {
                let to = marker_position(scene, self.object_at(point, 0)?)?;
                (point.last_position.unwrap_or(to), to)
            }
            Self::PairedMarkers => self.paired_positions(point, scene)?,
        };
        Ok(Transform::looking_at(from, to))
    }

    fn from_history(point: &mut Point, current: Vec3) -> SolvedRay {
        let previous = *point.last_position.get_or_insert(current);
        SolvedRay {
            origin: previous,
            direction: current - previous,
        }
    }

    fn object_at(self, point: &Point, index: usize) -> Result<ObjectId, ResolveError> {
        match point.tracked.get(index) {
            Some(TrackedRef::Object(object)) => Ok(*object),
            _ => Err(ResolveError::MalformedRefs(self)),
        }
    }

    fn resolve_offset(self, point: &Point, scene: &dyn SceneQuery) -> Result<Vec3, ResolveError> {
        let object = self.object_at(point, 0)?;
        let offset = match point.tracked.get(1) {
            Some(TrackedRef::Offset(offset)) => *offset,
            _ => return Err(ResolveError::MalformedRefs(self)),
        };

        // Joints move independently of their body root; read the live transform every tick
        let transform = match self {
            Self::SkeletalOffset => scene
                .joint_transform(object)
                .ok_or(ResolveError::MissingJoint(object))?,
            _ => scene
                .body_transform(object)
                .ok_or(ResolveError::MissingBody(object))?,
        };
        Ok(transform.transform_point(offset))
    }

    fn paired_positions(self, point: &Point, scene: &dyn SceneQuery) -> Result<(Vec3, Vec3), ResolveError> {
        let from = marker_position(scene, self.object_at(point, 0)?)?;
        let to = marker_position(scene, self.object_at(point, 1)?)?;
        Ok((from, to))
    }
}

fn marker_position(scene: &dyn SceneQuery, marker: ObjectId) -> Result<Vec3, ResolveError> {
    scene
        .marker_position(marker)
        .ok_or(ResolveError::MissingMarker(marker))
}
