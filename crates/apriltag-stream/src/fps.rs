//! Frame-rate measurement for the capture loop.

use std::time::{Duration, Instant};

/// Counts frames and reports the rate once per reporting window.
pub struct FpsCounter {
    window: Duration,
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Record one frame. Returns the measured rate when a full window has
    /// elapsed, `None` otherwise.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
