//! Playback time
//!
//! Lip-sync runs on a single monotonic playback clock. Time is kept as
//! integer microseconds so deadlines compare exactly; keyframe times on the
//! wire are plain seconds (`f64`).

use std::ops::{Add, Sub};
use std::time::Duration;

/// Playback time - monotonic, microseconds since the service started
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlaybackTime(pub u64);

impl PlaybackTime {
    pub const ZERO: PlaybackTime = PlaybackTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        PlaybackTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        PlaybackTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        PlaybackTime((secs.max(0.0) * 1_000_000.0) as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        PlaybackTime(self.0.saturating_add(duration.as_micros() as u64))
    }
}

impl Add<Duration> for PlaybackTime {
    type Output = PlaybackTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<PlaybackTime> for PlaybackTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: PlaybackTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for PlaybackTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "τ({:.3}ms)", self.0 as f64 / 1000.0)
    }
}

/// Convert whole milliseconds to keyframe seconds.
///
/// All keyframe times go through this one conversion so adjacent events
/// share bit-identical boundary times.
#[inline]
pub fn ms_to_secs(ms: f64) -> f64 {
    ms / 1000.0
}
