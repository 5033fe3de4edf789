//! Hitboxes, their points, and the solving strategies behind them
//!
//! A [`Hitbox`] owns a set of [`Point`]s. Each point carries a [`SolverKind`]
//! that turns the point's tracked references into a world-space ray every
//! tick. The engine drives all of this; nothing here performs a ray cast.

pub mod commands;
pub mod point;
pub mod signal;
pub mod solver;
mod state;

pub use commands::{HitboxCommand, HitboxCommands};
pub use point::{Point, PointSource, TrackedRef};
pub use signal::{ConnectionId, Signal};
pub use solver::{ResolveError, SolvedRay, SolverKind};
pub use state::{DetectionMode, HitEvent, Hitbox, UpdateEvent};
