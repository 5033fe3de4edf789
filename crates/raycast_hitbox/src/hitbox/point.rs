//! Ray source points owned by a hitbox

use super::solver::SolverKind;
use crate::foundation::math::Vec3;
use crate::scene::ObjectId;

/// One entry of a point's tracked references
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackedRef {
    /// An object in the host scene (body, joint or marker)
    Object(ObjectId),
    /// A fixed local-space offset
    Offset(Vec3),
}

/// Where a point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSource {
    /// Added explicitly by the caller; survives recalibration
    Manual,
    /// Discovered by scanning the target's descendants; replaced on recalibration
    Attachment,
}

/// A trackable ray source owned by exactly one hitbox
#[derive(Debug, Clone)]
pub struct Point {
    pub(crate) kind: SolverKind,
    pub(crate) group: Option<String>,
    pub(crate) last_position: Option<Vec3>,
    pub(crate) resolved_world_space: Option<Vec3>,
    pub(crate) tracked: Vec<TrackedRef>,
    pub(crate) source: PointSource,
}

impl Point {
    fn new(kind: SolverKind, tracked: Vec<TrackedRef>, group: Option<String>, source: PointSource) -> Self {
        Self {
            kind,
            group,
            last_position: None,
            resolved_world_space: None,
            tracked,
            source,
        }
    }

    /// Local offset attached to a rigid body
    pub fn rigid_offset(body: ObjectId, offset: Vec3, group: Option<String>) -> Self {
        Self::new(
            SolverKind::RigidOffset,
            vec![TrackedRef::Object(body), TrackedRef::Offset(offset)],
            group,
            PointSource::Manual,
        )
    }

    /// Local offset attached to an animated skeletal joint
    pub fn skeletal_offset(joint: ObjectId, offset: Vec3, group: Option<String>) -> Self {
        Self::new(
            SolverKind::SkeletalOffset,
            vec![TrackedRef::Object(joint), TrackedRef::Offset(offset)],
            group,
            PointSource::Manual,
        )
    }

    /// Ray spanning two live markers, recomputed every tick
    pub fn paired_markers(from: ObjectId, to: ObjectId, group: Option<String>) -> Self {
        Self::new(
            SolverKind::PairedMarkers,
            vec![TrackedRef::Object(from), TrackedRef::Object(to)],
            group,
            PointSource::Manual,
        )
    }

    /// Single marker tracked from frame to frame
    pub fn tracked_marker(marker: ObjectId, group: Option<String>) -> Self {
        Self::new(
            SolverKind::TrackedMarker,
            vec![TrackedRef::Object(marker)],
            group,
            PointSource::Manual,
        )
    }

    pub(crate) fn attachment(marker: ObjectId, group: Option<String>) -> Self {
        Self {
            source: PointSource::Attachment,
            ..Self::tracked_marker(marker, group)
        }
    }

    /// Solver strategy of this point
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    /// Hit-group label carried into hit notifications
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Position resolved at the end of the previous tick, if any
    pub fn last_position(&self) -> Option<Vec3> {
        self.last_position
    }

    /// Tracked references, interpreted according to [`Point::kind`]
    pub fn tracked_refs(&self) -> &[TrackedRef] {
        &self.tracked
    }

    /// Whether the point was added manually or discovered
    pub fn source(&self) -> PointSource {
        self.source
    }

    /// Forget motion history so the next solve starts with a zero-length ray
    pub fn reset_history(&mut self) {
        self.last_position = None;
        self.resolved_world_space = None;
    }

    /// Object the point is attached to (body, joint, or first marker)
    pub fn anchor(&self) -> Option<ObjectId> {
        match self.tracked.first() {
            Some(TrackedRef::Object(object)) => Some(*object),
            _ => None,
        }
    }

    /// Local offset for offset-based points
    pub fn offset(&self) -> Option<Vec3> {
        self.tracked.iter().find_map(|tracked| match tracked {
            TrackedRef::Offset(offset) => Some(*offset),
            TrackedRef::Object(_) => None,
        })
    }

    pub(crate) fn matches_offset(&self, object: ObjectId, offset: Vec3) -> bool {
        self.kind.is_offset_based() && self.anchor() == Some(object) && self.offset() == Some(offset)
    }
}
