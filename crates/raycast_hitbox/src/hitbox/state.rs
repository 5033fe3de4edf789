//! Hitbox state and point management

use super::point::{Point, PointSource};
use super::signal::Signal;
use super::solver::SolverKind;
use crate::config::HitboxSettings;
use crate::foundation::collections::{HitboxId, PointId, SlotMap};
use crate::foundation::math::Vec3;
use crate::scene::{MarkerInfo, ObjectId, RayFilter, RayHit, SceneQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a raw geometric hit becomes a reportable target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Report only surfaces whose owning entity exposes an actor; each actor
    /// at most once per arming
    Entity,
    /// Report the struck surface itself; each surface at most once per arming
    #[default]
    Object,
    /// Report the struck surface every time it is struck
    Bypass,
}

impl DetectionMode {
    /// Classify a hit into `(debounce key, actor)`; `None` drops the hit
    fn classify(self, hit: &RayHit, scene: &dyn SceneQuery) -> Option<(ObjectId, Option<ObjectId>)> {
        match self {
            Self::Entity => {
                let entity = scene.owning_entity(hit.surface)?;
                let actor = scene.actor_of(entity)?;
                Some((actor, Some(actor)))
            }
            Self::Object | Self::Bypass => Some((hit.surface, None)),
        }
    }
}

/// Fired when a point's ray strikes a reportable target
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    /// Hitbox that cast the ray
    pub hitbox: HitboxId,
    /// Point whose ray struck
    pub point: PointId,
    /// Surface that was struck
    pub surface: ObjectId,
    /// Actor resolved in entity mode, `None` otherwise
    pub actor: Option<ObjectId>,
    /// Raw scene hit
    pub hit: RayHit,
    /// Group label of the point
    pub group: Option<String>,
}

/// Fired for every point of an armed hitbox every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateEvent {
    /// Hitbox owning the point
    pub hitbox: HitboxId,
    /// The point that advanced
    pub point: PointId,
    /// Its new world position
    pub position: Vec3,
}

/// A set of ray-casting points attached to one scene object
#[derive(Debug)]
pub struct Hitbox {
    id: HitboxId,
    target: ObjectId,
    pub(crate) points: SlotMap<PointId, Point>,
    armed: bool,
    deadline: Option<f64>,
    /// Clamped duration waiting for the first tick to fix its start time
    pending_duration: Option<f64>,
    pending_destruction: bool,
    hit_list: HashSet<ObjectId>,

    /// Hit classification mode
    pub detection_mode: DetectionMode,
    /// Passed to the scene ray cast unmodified
    pub filter: RayFilter,
    /// Draw a debug ray for every cast
    pub visualize: bool,
    /// Log state changes and hits at info level
    pub debug_log: bool,

    /// Classified hits
    pub on_hit: Signal<HitEvent>,
    /// Per-point position updates
    pub on_update: Signal<UpdateEvent>,
}

impl Hitbox {
    pub(crate) fn new(id: HitboxId, target: ObjectId, settings: &HitboxSettings) -> Self {
        Self {
            id,
            target,
            points: SlotMap::with_key(),
            armed: false,
            deadline: None,
            pending_duration: None,
            pending_destruction: false,
            hit_list: HashSet::new(),
            detection_mode: settings.detection_mode,
            filter: settings.filter.clone(),
            visualize: settings.visualize,
            debug_log: settings.debug_log,
            on_hit: Signal::new(),
            on_update: Signal::new(),
        }
    }

    /// Handle of this hitbox in its engine
    pub fn id(&self) -> HitboxId {
        self.id
    }

    /// Scene object this hitbox is attached to
    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// Whether rays are being cast
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Absolute auto-disarm time, if any
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Duration armed without a start time, resolved by the next tick
    pub fn pending_duration(&self) -> Option<f64> {
        self.pending_duration
    }

    /// Whether the hitbox is waiting to be reclaimed
    pub fn is_pending_destruction(&self) -> bool {
        self.pending_destruction
    }

    /// Point histories restart so the first ray after arming has zero length.
    ///
    /// Without `now` the deadline stays pending until [`Self::start_timing`].
    pub(crate) fn arm(&mut self, duration: Option<f64>, now: Option<f64>, min_duration: f64) {
        if self.armed {
            self.disarm();
        }
        for point in self.points.values_mut() {
            point.reset_history();
        }
        let duration = duration.map(|seconds| seconds.max(min_duration));
        match now {
            Some(now) => self.deadline = duration.map(|seconds| now + seconds),
            None => self.pending_duration = duration,
        }
        self.armed = true;
        if self.debug_log {
            log::info!(
                "Hitbox {:?} on {} armed (deadline {:?}, pending {:?})",
                self.id,
                self.target,
                self.deadline,
                self.pending_duration
            );
        }
    }

    /// Turn a pending duration into an absolute deadline
    pub(crate) fn start_timing(&mut self, now: f64) {
        if let Some(seconds) = self.pending_duration.take() {
            self.deadline = Some(now + seconds);
        }
    }

    /// Points are reset lazily by the engine on its next visit
    pub(crate) fn disarm(&mut self) {
        if self.debug_log && self.armed {
            log::info!("Hitbox {:?} on {} disarmed", self.id, self.target);
        }
        self.armed = false;
        self.deadline = None;
        self.pending_duration = None;
        self.hit_list.clear();
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.disarm();
        self.pending_destruction = true;
        self.on_hit.disconnect_all();
        self.on_update.disconnect_all();
    }

    pub(crate) fn deadline_passed(&self, now: f64) -> bool {
        self.armed && self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Classify a hit and apply the per-arming debounce.
    ///
    /// Returns the actor (if any) when the hit should be reported.
    pub(crate) fn register_hit(&mut self, hit: &RayHit, scene: &dyn SceneQuery) -> Option<Option<ObjectId>> {
        let (key, actor) = self.detection_mode.classify(hit, scene)?;
        if self.detection_mode != DetectionMode::Bypass && !self.hit_list.insert(key) {
            return None;
        }
        Some(actor)
    }

    /// Add an existing point
    pub fn add_point(&mut self, point: Point) -> PointId {
        self.points.insert(point)
    }

    /// Add fixed local offsets on a rigid body
    pub fn add_offset_points(&mut self, body: ObjectId, offsets: &[Vec3], group: Option<&str>) -> Vec<PointId> {
        offsets
            .iter()
            .map(|&offset| self.add_point(Point::rigid_offset(body, offset, group.map(str::to_string))))
            .collect()
    }

    /// Add fixed local offsets on an animated skeletal joint
    pub fn add_joint_points(&mut self, joint: ObjectId, offsets: &[Vec3], group: Option<&str>) -> Vec<PointId> {
        offsets
            .iter()
            .map(|&offset| self.add_point(Point::skeletal_offset(joint, offset, group.map(str::to_string))))
            .collect()
    }

    /// Remove offset points matching `object` and any of `offsets`.
    ///
    /// Offsets with no matching point are ignored. Returns how many points went away.
    pub fn remove_offset_points(&mut self, object: ObjectId, offsets: &[Vec3]) -> usize {
        let before = self.points.len();
        self.points
            .retain(|_, point| !offsets.iter().any(|&offset| point.matches_offset(object, offset)));
        before - self.points.len()
    }

    /// Link two markers so a ray runs between them every tick.
    ///
    /// Returns `None` (and changes nothing) if `from` is already linked.
    pub fn link_markers(&mut self, from: ObjectId, to: ObjectId, group: Option<&str>) -> Option<PointId> {
        if self.linked_point(from).is_some() {
            return None;
        }
        Some(self.add_point(Point::paired_markers(from, to, group.map(str::to_string))))
    }

    /// Remove the link starting at `from`; false if there was none
    pub fn unlink_marker(&mut self, from: ObjectId) -> bool {
        match self.linked_point(from) {
            Some(id) => self.points.remove(id).is_some(),
            None => false,
        }
    }

    fn linked_point(&self, from: ObjectId) -> Option<PointId> {
        self.points.iter().find_map(|(id, point)| {
            (point.kind == SolverKind::PairedMarkers && point.anchor() == Some(from)).then_some(id)
        })
    }

    /// Replace all attachment-derived points with freshly discovered markers.
    ///
    /// Manual points are left untouched. Returns the number of new points.
    pub fn replace_attachment_points(&mut self, markers: Vec<MarkerInfo>) -> usize {
        self.points
            .retain(|_, point| point.source != PointSource::Attachment);
        let count = markers.len();
        for info in markers {
            self.points.insert(Point::attachment(info.marker, info.group));
        }
        count
    }

    /// Remove a single point by handle
    pub fn remove_point(&mut self, id: PointId) -> Option<Point> {
        self.points.remove(id)
    }

    /// Look up a point
    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(id)
    }

    /// Iterate all points
    pub fn points(&self) -> impl Iterator<Item = (PointId, &Point)> {
        self.points.iter()
    }

    /// Number of owned points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}
