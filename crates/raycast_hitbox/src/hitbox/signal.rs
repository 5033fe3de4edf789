//! Multi-listener notification channel
//!
//! Listeners are invoked synchronously in subscription order. Each receives
//! the event and the engine's [`HitboxCommands`] buffer.

use super::commands::HitboxCommands;
use crate::foundation::collections::HitboxId;

/// Handle returned by [`Signal::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Listener<T> = Box<dyn FnMut(&T, &mut HitboxCommands)>;

/// Event stream with any number of listeners
pub struct Signal<T> {
    listeners: Vec<(ConnectionId, Listener<T>)>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> Signal<T> {
    /// Create a signal with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe a listener; it is called after all earlier subscribers
    pub fn connect<F>(&mut self, listener: F) -> ConnectionId
    where
        F: FnMut(&T, &mut HitboxCommands) + 'static,
    {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove one listener; returns false if it was already gone
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Remove every listener
    pub fn disconnect_all(&mut self) {
        self.listeners.clear();
    }

    /// Number of connected listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// Delivery stops as soon as a listener queues destruction of `owner`.
    pub(crate) fn emit(&mut self, event: &T, commands: &mut HitboxCommands, owner: HitboxId) {
        for (_, listener) in &mut self.listeners {
            if commands.is_destroying(owner) {
                break;
            }
            listener(event, commands);
        }
    }
}
