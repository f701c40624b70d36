//! Playback clock

use std::time::{Duration, Instant};

use visemic_core::PlaybackTime;

/// Largest step a single tick may take
pub const MAX_TICK: Duration = Duration::from_millis(100);

/// Monotonic playback clock driven by the OS clock.
/// INVARIANT: never goes backwards, never jumps more than [`MAX_TICK`]
#[derive(Debug)]
pub struct PlaybackClock {
    value: PlaybackTime,
    last_update: Instant,
}

impl PlaybackClock {
    pub fn new() -> Self {
        PlaybackClock {
            value: PlaybackTime::ZERO,
            last_update: Instant::now(),
        }
    }

    /// Advance by real elapsed time since the previous tick.
    /// Returns the step taken.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);

        // Clamp so a suspended process does not flush every timer at once
        let step = elapsed.min(MAX_TICK);

        self.value = self.value.saturating_add(step);
        self.last_update = now;
        step
    }

    /// Current playback time without advancing
    pub fn now(&self) -> PlaybackTime {
        self.value
    }

    /// Forget elapsed real time (e.g. after a pause)
    pub fn resync(&mut self) {
        self.last_update = Instant::now();
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
