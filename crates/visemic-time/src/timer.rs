//! Cancellable one-shot timers
//!
//! Deadlines live on the queue's own playback time, which only moves
//! through [`TimerQueue::advance`] / [`TimerQueue::advance_to`]. Expired
//! payloads are returned to the caller in deadline order.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use visemic_core::PlaybackTime;

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// One-shot timers keyed by deadline. Ties fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: PlaybackTime,
    next_id: u64,
    pending: BTreeMap<(PlaybackTime, u64), T>,
    deadlines: HashMap<u64, PlaybackTime>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: PlaybackTime::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn now(&self) -> PlaybackTime {
        self.now
    }

    /// Fire `payload` after `delay`
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerToken {
        self.schedule_at(self.now + delay, payload)
    }

    /// Fire `payload` at `deadline`. A deadline already in the past fires
    /// on the next advance.
    pub fn schedule_at(&mut self, deadline: PlaybackTime, payload: T) -> TimerToken {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        TimerToken(id)
    }

    /// Cancel a timer. Returns its payload if it had not fired yet.
    pub fn cancel(&mut self, token: TimerToken) -> Option<T> {
        let deadline = self.deadlines.remove(&token.0)?;
        self.pending.remove(&(deadline, token.0))
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.deadlines.contains_key(&token.0)
    }

    pub fn deadline(&self, token: TimerToken) -> Option<PlaybackTime> {
        self.deadlines.get(&token.0).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<PlaybackTime> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move time forward by `dt` and collect expired payloads
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.advance_to(self.now + dt)
    }

    /// Move time to `t` (never backwards) and collect expired payloads
    pub fn advance_to(&mut self, t: PlaybackTime) -> Vec<T> {
        if t > self.now {
            self.now = t;
        }

        let mut fired = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            let ((_, id), payload) = entry.remove_entry();
            self.deadlines.remove(&id);
            fired.push(payload);
        }
        fired
    }

    /// Cancel everything, returning payloads in deadline order
    pub fn drain(&mut self) -> Vec<T> {
        self.deadlines.clear();
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
