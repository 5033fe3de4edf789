//! Specialized collection types
//!
//! Generation-checked handles for everything the engine owns. A handle
//! to a removed slot never aliases a later allocation, so stale handles
//! are detected instead of silently addressing someone else's data.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Handle to a hitbox registered with a [`crate::engine::HitboxEngine`]
    pub struct HitboxId;

    /// Handle to a point owned by one hitbox
    pub struct PointId;

    /// Handle to a pooled debug ray resource
    pub struct DebugRayId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_is_detected() {
        let mut map: SlotMap<HitboxId, &str> = SlotMap::with_key();

        let first = map.insert("first");
        map.remove(first);
        let second = map.insert("second");

        // Slot is reused but the generation differs
        assert!(map.get(first).is_none());
        assert_eq!(map.get(second), Some(&"second"));
        assert_ne!(first, second);
    }
}
