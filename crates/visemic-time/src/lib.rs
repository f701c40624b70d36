//! Visemic Time - Playback clock and timers
//!
//! Lip-sync has no threads and no runtime timers. Time moves only when the
//! caller advances it, either from wall-clock deltas ([`PlaybackClock`]) or
//! explicitly in tests. Cleanup work hangs off a [`TimerQueue`] whose
//! tokens can be cancelled deterministically.

pub mod clock;
pub mod timer;

pub use clock::*;
pub use timer::*;
