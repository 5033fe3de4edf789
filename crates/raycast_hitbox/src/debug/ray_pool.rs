//! Pooled debug ray lines
//!
//! Based on Game Engine Architecture 3rd Edition, Section 10.2:
//! "Debug rendering systems typically support both temporary shapes
//! (which expire after a certain time) and persistent shapes."
//!
//! Every armed point can draw one ray per tick, so rays are recycled instead
//! of allocated. An entry stays in use until it has been idle for the
//! configured duration, then is retracted and parked in reserve.

use crate::foundation::collections::{DebugRayId, SecondaryMap, SlotMap};
use crate::foundation::math::{Transform, Vec3, Vec4};

/// Default color for rays that struck nothing
pub const RAY_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// Default color for rays that struck scene geometry
pub const HIT_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

/// A single debug line resource
#[derive(Debug, Clone, PartialEq)]
pub struct DebugRay {
    /// Placement; the line starts at `transform.position` and runs along its forward axis
    pub transform: Transform,
    /// Visible length of the line
    pub length: f32,
    /// RGBA color
    pub color: Vec4,
    /// Whether the renderer should draw it
    pub visible: bool,
}

impl DebugRay {
    fn parked(park_position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(park_position),
            length: 0.0,
            color: RAY_COLOR,
            visible: false,
        }
    }

    fn retract(&mut self, park_position: Vec3) {
        *self = Self::parked(park_position);
    }

    /// World-space end point of the line
    pub fn end(&self) -> Vec3 {
        self.transform.position + self.transform.forward() * self.length
    }
}

/// Recycling allocator for debug rays
#[derive(Debug)]
pub struct DebugRayPool {
    rays: SlotMap<DebugRayId, DebugRay>,
    /// Last-use timestamp of every ray currently out of reserve
    in_use: SecondaryMap<DebugRayId, f64>,
    reserve: Vec<DebugRayId>,
    idle_duration: f64,
    park_position: Vec3,
}

impl DebugRayPool {
    /// Create an empty pool
    pub fn new(idle_duration: f64, park_position: Vec3) -> Self {
        Self {
            rays: SlotMap::with_key(),
            in_use: SecondaryMap::new(),
            reserve: Vec::new(),
            idle_duration,
            park_position,
        }
    }

    /// Take a ray out of reserve (or allocate one) and stamp it with `now`.
    ///
    /// Never fails; the pool grows on demand.
    pub fn acquire(&mut self, now: f64) -> DebugRayId {
        let id = match self.reserve.pop() {
            Some(id) => id,
            None => self.rays.insert(DebugRay::parked(self.park_position)),
        };
        debug_assert!(!self.rays[id].visible, "reserve handed out a visible ray");
        self.in_use.insert(id, now);
        id
    }

    /// Orient and show an acquired ray
    pub fn place(&mut self, id: DebugRayId, orientation: Transform, length: f32, color: Vec4) {
        if let Some(ray) = self.rays.get_mut(id) {
            ray.transform = orientation;
            ray.length = length;
            ray.color = color;
            ray.visible = true;
        }
    }

    /// Retract every ray idle longer than the configured duration.
    ///
    /// Returns how many rays went back to reserve.
    pub fn release_expired(&mut self, now: f64) -> usize {
        let expired: Vec<DebugRayId> = self
            .in_use
            .iter()
            .filter(|(_, &last_used)| now - last_used > self.idle_duration)
            .map(|(id, _)| id)
            .collect();

        for &id in &expired {
            self.in_use.remove(id);
            if let Some(ray) = self.rays.get_mut(id) {
                ray.retract(self.park_position);
            }
            self.reserve.push(id);
        }
        expired.len()
    }

    /// Look up a ray
    pub fn get(&self, id: DebugRayId) -> Option<&DebugRay> {
        self.rays.get(id)
    }

    /// Rays a renderer should currently draw
    pub fn visible_rays(&self) -> impl Iterator<Item = (DebugRayId, &DebugRay)> {
        self.rays.iter().filter(|(_, ray)| ray.visible)
    }

    /// Number of rays out of reserve
    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Number of rays waiting for reuse
    pub fn reserve_count(&self) -> usize {
        self.reserve.len()
    }

    /// Total rays ever allocated
    pub fn total_count(&self) -> usize {
        self.rays.len()
    }

    /// Where retracted rays are parked
    pub fn park_position(&self) -> Vec3 {
        self.park_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    const PARK: Vec3 = Vec3::new(0.0, -10_000.0, 0.0);

    #[test]
    fn test_rays_in_one_tick_never_share_an_entry() {
        let mut pool = DebugRayPool::new(0.25, PARK);

        let ids: HashSet<_> = (0..5).map(|_| pool.acquire(0.0)).collect();

        assert_eq!(ids.len(), 5);
        assert_eq!(pool.in_use_count(), 5);
    }

    #[test]
    fn test_idle_rays_expire_after_duration_not_immediately() {
        let mut pool = DebugRayPool::new(0.25, PARK);
        let id = pool.acquire(1.0);
        pool.place(id, Transform::looking_at(Vec3::zeros(), Vec3::x()), 2.0, RAY_COLOR);

        assert_eq!(pool.release_expired(1.2), 0);
        assert!(pool.get(id).unwrap().visible);

        assert_eq!(pool.release_expired(1.3), 1);
        assert_eq!(pool.reserve_count(), 1);
        assert_eq!(pool.visible_rays().count(), 0);
    }

    #[test]
    fn test_reused_ray_is_retracted_and_parked() {
        let mut pool = DebugRayPool::new(0.25, PARK);
        let id = pool.acquire(0.0);
        pool.place(id, Transform::looking_at(Vec3::zeros(), Vec3::x()), 3.0, HIT_COLOR);
        assert_relative_eq!(pool.get(id).unwrap().end(), Vec3::new(3.0, 0.0, 0.0), epsilon = 1.0e-5);
        pool.release_expired(1.0);

        let reused = pool.acquire(2.0);

        assert_eq!(reused, id);
        let ray = pool.get(reused).unwrap();
        assert_eq!(ray.length, 0.0);
        assert!(!ray.visible);
        assert_relative_eq!(ray.transform.position, PARK);
        assert_eq!(pool.total_count(), 1);
    }

    #[test]
    fn test_pool_grows_only_with_concurrent_demand() {
        let mut pool = DebugRayPool::new(0.1, PARK);

        // Two rays per tick, ticks far enough apart for everything to expire
        for tick in 0..10 {
            let now = f64::from(tick);
            pool.release_expired(now);
            pool.acquire(now);
            pool.acquire(now);
        }

        assert_eq!(pool.total_count(), 2);
    }
}
