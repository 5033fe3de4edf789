//! Deferred hitbox commands
//!
//! Listeners run while the engine is iterating its registry, so they cannot
//! borrow the engine. They queue commands here instead; the engine applies the
//! queue right after each notification returns.

use crate::foundation::collections::HitboxId;

/// A state change requested from inside a listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitboxCommand {
    /// Arm (or re-arm) a hitbox, optionally for a limited duration in seconds
    Arm {
        /// Target hitbox
        hitbox: HitboxId,
        /// Seconds until auto-disarm
        duration: Option<f64>,
    },
    /// Stop casting rays
    Disarm(HitboxId),
    /// Mark for destruction; reclaimed at the start of the next tick
    Destroy(HitboxId),
}

/// Command buffer handed to every listener
#[derive(Debug, Default)]
pub struct HitboxCommands {
    queue: Vec<HitboxCommand>,
}

impl HitboxCommands {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arm request.
    ///
    /// The countdown starts at the current tick time. Arming resets every
    /// point's history, including the point whose notification is running, so
    /// that point casts a zero-length ray on the next tick. Its hit list is
    /// cleared too.
    pub fn arm(&mut self, hitbox: HitboxId, duration: Option<f64>) {
        self.queue.push(HitboxCommand::Arm { hitbox, duration });
    }

    /// Queue a disarm request
    pub fn disarm(&mut self, hitbox: HitboxId) {
        self.queue.push(HitboxCommand::Disarm(hitbox));
    }

    /// Queue a destroy request
    pub fn destroy(&mut self, hitbox: HitboxId) {
        self.queue.push(HitboxCommand::Destroy(hitbox));
    }

    /// Whether a destroy for `hitbox` is waiting in the queue
    pub fn is_destroying(&self, hitbox: HitboxId) -> bool {
        self.queue
            .iter()
            .any(|command| *command == HitboxCommand::Destroy(hitbox))
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take_all(&mut self) -> Vec<HitboxCommand> {
        std::mem::take(&mut self.queue)
    }
}
