//! Frame timing

use std::time::{Duration, Instant};

/// Frame clock driven by the render loop
///
/// Tracks the elapsed time since start, the elapsed time at the previous
/// tick and the delta between the two.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    prev_elapsed: Duration,
    elapsed: Duration,
    delta: Duration,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            prev_elapsed: Duration::ZERO,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance the clock to the current instant (once per frame)
    pub fn tick(&mut self) {
        self.advance_to(self.start.elapsed());
    }

    /// Advance the clock to an explicit elapsed time
    ///
    /// Going backwards is clamped to a zero delta.
    pub fn advance_to(&mut self, elapsed: Duration) {
        self.prev_elapsed = self.elapsed;
        self.elapsed = elapsed.max(self.prev_elapsed);
        self.delta = self.elapsed - self.prev_elapsed;
        self.frame_count += 1;
    }

    /// Time since the clock was created, as of the last tick
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time at the previous tick
    pub const fn prev_elapsed(&self) -> Duration {
        self.prev_elapsed
    }

    /// Time between the last two ticks
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Time between the last two ticks in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Number of ticks so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
