//! Time management utilities

use std::time::{Duration, Instant};

/// Fixed-step simulation clock
///
/// Produces the monotonically increasing `now` values fed to
/// [`crate::engine::HitboxEngine::tick`]. Time only advances through
/// [`FrameClock::step`], so simulated runs are reproducible regardless of
/// wall-clock speed.
#[derive(Debug, Clone)]
pub struct FrameClock {
    tick_duration: f64,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock stepping at `tick_rate` ticks per second
    pub fn new(tick_rate: f64) -> Self {
        Self {
            tick_duration: 1.0 / tick_rate,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Advance one fixed step and return the new current time
    pub fn step(&mut self) -> f64 {
        self.elapsed += self.tick_duration;
        self.frame_count += 1;
        self.elapsed
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f64 {
        self.elapsed
    }

    /// Duration of one fixed step in seconds
    pub fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    /// Number of steps taken so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring wall-clock time spent in a tick
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_steps_fixed_duration() {
        let mut clock = FrameClock::new(60.0);

        for _ in 0..60 {
            clock.step();
        }

        assert_eq!(clock.frame_count(), 60);
        assert!((clock.now() - 1.0).abs() < 1.0e-9);
    }
}
