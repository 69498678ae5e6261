//! Frame timing for the redraw loop.

use std::time::Instant;

/// Timing for one display tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTick {
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous tick.
    pub delta: f32,
}

impl FrameTick {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        Self { elapsed, delta }
    }
}

/// Wall clock that hands out one [`FrameTick`] per redraw.
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Advances the clock and returns the timing for this tick.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        FrameTick {
            elapsed: now.duration_since(self.start).as_secs_f32(),
            delta,
        }
    }
}
