// Keeps the loop at (no faster than) a fixed frame rate.
// Slow frames are not made up for: the loop just runs behind.

use std::thread;
use std::time::{Duration, Instant};

pub const TARGET_FPS: u64 = 30;
/// 1000 / 30 in whole milliseconds.
pub const FRAME_TIME: Duration = Duration::from_millis(1000 / TARGET_FPS);

pub struct Pacer {
    interval: Duration,
    frame_start: Instant,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, frame_start: Instant::now() }
    }

    /// Mark the start of an iteration.
    pub fn begin(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Sleep out whatever is left of the interval. Returns how long we slept.
    pub fn finish(&self) -> Duration {
        let remaining = self.remaining(self.frame_start.elapsed());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        remaining
    }

    /// Time still owed after `elapsed`; zero once the interval is used up.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(FRAME_TIME)
    }
}
