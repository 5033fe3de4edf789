//! Hitbox registry and frame scheduler
//!
//! The engine owns every hitbox and the debug ray pool. A driver calls
//! [`HitboxEngine::tick`] once per simulation step:
//!
//! ```text
//! tick(now)
//!   1. reclaim hitboxes marked for destruction
//!   2. for each hitbox: start a pending arm countdown at `now`
//!      for each point:
//!        unarmed -> reset history, skip
//!        solve -> cast ray -> draw debug ray -> advance history
//!        classify hit -> on_hit -> deadline check -> on_update
//!   3. retract idle debug rays
//! ```
//!
//! Listeners cannot borrow the engine while it iterates, so they queue
//! [`HitboxCommands`] that are applied right after each notification.

use crate::config::{ConfigError, EngineConfig};
use crate::debug::{DebugRayPool, HIT_COLOR, RAY_COLOR};
use crate::foundation::collections::{HitboxId, PointId, SlotMap};
use crate::hitbox::{HitEvent, Hitbox, HitboxCommand, HitboxCommands, Point, UpdateEvent};
use crate::scene::{ObjectId, SceneQuery};
use std::collections::HashMap;
use thiserror::Error;

/// Errors returned by engine operations on a handle
#[derive(Error, Debug)]
pub enum EngineError {
    /// The handle never existed or its hitbox was already reclaimed
    #[error("unknown hitbox {0:?}")]
    UnknownHitbox(HitboxId),

    /// The hitbox is waiting to be reclaimed and accepts no further changes
    #[error("hitbox {0:?} is pending destruction")]
    HitboxDestroyed(HitboxId),

    /// The hitbox has no such point
    #[error("hitbox {hitbox:?} has no point {point:?}")]
    UnknownPoint {
        /// Owning hitbox
        hitbox: HitboxId,
        /// Missing point
        point: PointId,
    },

    /// Engine configuration failed validation
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Counters collected during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Rays handed to the scene
    pub rays_cast: usize,
    /// Hit notifications fired
    pub hits: usize,
    /// Points skipped because they could not be resolved
    pub skipped_points: usize,
    /// Hitboxes removed from the registry
    pub reclaimed_hitboxes: usize,
    /// Debug rays returned to reserve
    pub expired_debug_rays: usize,
}

/// Registry of hitboxes plus the per-frame scheduler
#[derive(Debug)]
pub struct HitboxEngine {
    config: EngineConfig,
    hitboxes: SlotMap<HitboxId, Hitbox>,
    /// Live hitbox per target object
    tags: HashMap<ObjectId, HitboxId>,
    debug_rays: DebugRayPool,
    current_time: f64,
    commands: HitboxCommands,
}

impl HitboxEngine {
    /// Create an engine after validating its configuration
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        log::debug!(
            "Creating hitbox engine ({} Hz, debug rays idle {}s)",
            config.tick_rate,
            config.debug_ray_duration
        );
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: EngineConfig) -> Self {
        let debug_rays = DebugRayPool::new(config.debug_ray_duration, config.park_position());
        Self {
            config,
            hitboxes: SlotMap::with_key(),
            tags: HashMap::new(),
            debug_rays,
            current_time: 0.0,
            commands: HitboxCommands::new(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time passed to the most recent tick
    pub fn now(&self) -> f64 {
        self.current_time
    }

    /// Create a hitbox for `target`, or return the live one already attached to it.
    ///
    /// A new hitbox starts unarmed with the configured defaults and its
    /// attachment points discovered from the scene.
    pub fn create_hitbox(&mut self, target: ObjectId, scene: &dyn SceneQuery) -> HitboxId {
        if let Some(existing) = self.find_hitbox(target) {
            return existing;
        }

        let settings = &self.config.hitbox_defaults;
        let id = self
            .hitboxes
            .insert_with_key(|id| Hitbox::new(id, target, settings));
        self.tags.insert(target, id);
        log::debug!("Created hitbox {id:?} for {target}");

        if let Some(hitbox) = self.hitboxes.get_mut(id) {
            let found = hitbox.replace_attachment_points(scene.find_markers(target, &self.config.marker_name));
            log::trace!("Hitbox {id:?} discovered {found} attachment points");
        }
        id
    }

    /// Live hitbox attached to `target`
    pub fn find_hitbox(&self, target: ObjectId) -> Option<HitboxId> {
        self.tags
            .get(&target)
            .copied()
            .filter(|&id| self.hitboxes.get(id).is_some_and(|hitbox| !hitbox.is_pending_destruction()))
    }

    /// Look up a hitbox (including one pending destruction)
    pub fn hitbox(&self, id: HitboxId) -> Option<&Hitbox> {
        self.hitboxes.get(id)
    }

    /// Mutable access for point management and settings.
    ///
    /// Fails for hitboxes pending destruction.
    pub fn hitbox_mut(&mut self, id: HitboxId) -> Result<&mut Hitbox, EngineError> {
        let hitbox = self.hitboxes.get_mut(id).ok_or(EngineError::UnknownHitbox(id))?;
        if hitbox.is_pending_destruction() {
            return Err(EngineError::HitboxDestroyed(id));
        }
        Ok(hitbox)
    }

    /// Iterate all registered hitboxes
    pub fn hitboxes(&self) -> impl Iterator<Item = (HitboxId, &Hitbox)> {
        self.hitboxes.iter()
    }

    /// Number of registered hitboxes, including ones not yet reclaimed
    pub fn hitbox_count(&self) -> usize {
        self.hitboxes.len()
    }

    /// Start casting rays, optionally disarming after `duration` seconds.
    ///
    /// The engine has no clock between ticks, so the countdown starts at the
    /// `now` of the next tick. Use [`Self::arm_at`] when the caller knows the
    /// current time. Durations shorter than one tick are stretched to one
    /// tick. Re-arming an armed hitbox restarts its timing and hit history.
    pub fn arm(&mut self, id: HitboxId, duration: Option<f64>) -> Result<(), EngineError> {
        let min_duration = self.config.tick_duration();
        self.hitbox_mut(id)?.arm(duration, None, min_duration);
        Ok(())
    }

    /// Like [`Self::arm`], with the countdown starting at `now`
    pub fn arm_at(&mut self, id: HitboxId, duration: Option<f64>, now: f64) -> Result<(), EngineError> {
        let min_duration = self.config.tick_duration();
        self.hitbox_mut(id)?.arm(duration, Some(now), min_duration);
        Ok(())
    }

    /// Stop casting rays
    pub fn disarm(&mut self, id: HitboxId) -> Result<(), EngineError> {
        self.hitbox_mut(id)?.disarm();
        Ok(())
    }

    /// Mark a hitbox for destruction.
    ///
    /// Listeners are dropped immediately; storage is reclaimed at the start of
    /// the next tick. Destroying twice is a no-op.
    pub fn destroy(&mut self, id: HitboxId) -> Result<(), EngineError> {
        let hitbox = self.hitboxes.get_mut(id).ok_or(EngineError::UnknownHitbox(id))?;
        if hitbox.is_pending_destruction() {
            return Ok(());
        }

        hitbox.mark_destroyed();
        let target = hitbox.target();
        if self.tags.get(&target) == Some(&id) {
            self.tags.remove(&target);
        }
        log::debug!("Hitbox {id:?} on {target} marked for destruction");
        Ok(())
    }

    /// Rediscover attachment points under the hitbox target.
    ///
    /// Manually added points are kept. Returns the number of attachment points found.
    pub fn recalibrate(&mut self, id: HitboxId, scene: &dyn SceneQuery) -> Result<usize, EngineError> {
        let hitbox = self.hitboxes.get_mut(id).ok_or(EngineError::UnknownHitbox(id))?;
        if hitbox.is_pending_destruction() {
            return Err(EngineError::HitboxDestroyed(id));
        }
        let markers = scene.find_markers(hitbox.target(), &self.config.marker_name);
        Ok(hitbox.replace_attachment_points(markers))
    }

    /// Remove one point from a hitbox
    pub fn remove_point(&mut self, id: HitboxId, point: PointId) -> Result<Point, EngineError> {
        self.hitbox_mut(id)?
            .remove_point(point)
            .ok_or(EngineError::UnknownPoint { hitbox: id, point })
    }

    /// The host scene removed `object`; destroy the hitbox attached to it.
    ///
    /// Returns the destroyed hitbox, if there was one.
    pub fn on_object_removed(&mut self, object: ObjectId) -> Option<HitboxId> {
        let id = self.find_hitbox(object)?;
        self.destroy(id).ok()?;
        Some(id)
    }

    /// Debug ray pool, for rendering
    pub fn debug_rays(&self) -> &DebugRayPool {
        &self.debug_rays
    }

    /// Run one scheduler step at time `now`
    pub fn tick(&mut self, now: f64, scene: &dyn SceneQuery) -> TickReport {
        self.current_time = now;
        let mut report = TickReport {
            reclaimed_hitboxes: self.reclaim(),
            ..TickReport::default()
        };

        // Snapshot; hitboxes created by listeners wait for the next tick
        let ids: Vec<HitboxId> = self.hitboxes.keys().collect();
        for id in ids {
            self.tick_hitbox(id, now, scene, &mut report);
        }

        report.expired_debug_rays = self.debug_rays.release_expired(now);
        report
    }

    fn reclaim(&mut self) -> usize {
        let before = self.hitboxes.len();
        self.hitboxes.retain(|id, hitbox| {
            let keep = !hitbox.is_pending_destruction();
            if !keep {
                log::debug!("Reclaimed hitbox {id:?} ({} points)", hitbox.point_count());
            }
            keep
        });
        before - self.hitboxes.len()
    }

    fn tick_hitbox(&mut self, id: HitboxId, now: f64, scene: &dyn SceneQuery, report: &mut TickReport) {
        let point_ids: Vec<PointId> = match self.hitboxes.get_mut(id) {
            Some(hitbox) if !hitbox.is_pending_destruction() => {
                hitbox.start_timing(now);
                hitbox.points.keys().collect()
            }
            _ => return,
        };

        for point_id in point_ids {
            let Some(hitbox) = self.hitboxes.get_mut(id) else {
                return;
            };
            // A listener may have destroyed this hitbox partway through its points
            if hitbox.is_pending_destruction() {
                return;
            }
            let armed = hitbox.is_armed();
            let Some(point) = hitbox.points.get_mut(point_id) else {
                continue;
            };

            if !armed {
                point.reset_history();
                continue;
            }

            let kind = point.kind();
            let ray = match kind.solve(point, scene) {
                Ok(ray) => ray,
                Err(err) => {
                    log::debug!("Skipping point {point_id:?} of hitbox {id:?}: {err}");
                    report.skipped_points += 1;
                    continue;
                }
            };

            let hit = scene.cast_ray(ray.origin, ray.direction, &hitbox.filter);
            report.rays_cast += 1;

            if hitbox.visualize {
                match kind.visualize(point, scene) {
                    Ok(orientation) => {
                        let color = if hit.is_some() { HIT_COLOR } else { RAY_COLOR };
                        let ray_id = self.debug_rays.acquire(now);
                        self.debug_rays
                            .place(ray_id, orientation, ray.direction.magnitude(), color);
                    }
                    Err(err) => log::debug!("No debug ray for point {point_id:?}: {err}"),
                }
            }

            let position = match kind.update_to_next_position(point, scene) {
                Ok(position) => position,
                Err(err) => {
                    log::debug!("Point {point_id:?} of hitbox {id:?} lost its position: {err}");
                    report.skipped_points += 1;
                    continue;
                }
            };
            point.last_position = Some(position);
            let group = point.group.clone();

            if let Some(hit) = hit {
                if let Some(actor) = hitbox.register_hit(&hit, scene) {
                    if hitbox.debug_log {
                        log::info!(
                            "Hitbox {id:?} hit {} (actor {actor:?}, group {group:?}) at {:?}",
                            hit.surface,
                            hit.point
                        );
                    }
                    let event = HitEvent {
                        hitbox: id,
                        point: point_id,
                        surface: hit.surface,
                        actor,
                        hit,
                        group,
                    };
                    report.hits += 1;
                    hitbox.on_hit.emit(&event, &mut self.commands, id);
                    self.apply_commands();
                }
            }

            let Some(hitbox) = self.hitboxes.get_mut(id) else {
                return;
            };
            if hitbox.is_pending_destruction() {
                return;
            }
            if hitbox.deadline_passed(now) {
                hitbox.disarm();
            }

            let event = UpdateEvent {
                hitbox: id,
                point: point_id,
                position,
            };
            hitbox.on_update.emit(&event, &mut self.commands, id);
            self.apply_commands();
        }

        // Covers hitboxes with no resolvable points
        if let Some(hitbox) = self.hitboxes.get_mut(id) {
            if hitbox.deadline_passed(now) {
                hitbox.disarm();
            }
        }
    }

    fn apply_commands(&mut self) {
        for command in self.commands.take_all() {
            let result = match command {
                HitboxCommand::Arm { hitbox, duration } => self.arm_at(hitbox, duration, self.current_time),
                HitboxCommand::Disarm(hitbox) => self.disarm(hitbox),
                HitboxCommand::Destroy(hitbox) => self.destroy(hitbox),
            };
            if let Err(err) = result {
                log::debug!("Dropped deferred {command:?}: {err}");
            }
        }
    }
}

impl Default for HitboxEngine {
    fn default() -> Self {
        Self::with_validated(EngineConfig::default())
    }
}
