//! End-to-end speech scenarios
//!
//! Drives a [`LipSyncService`] against a [`RecordingHost`] the way an
//! application would: start, feed words, end, tick until quiet.

use std::time::Duration;

use visemic_runtime::{CompletedSnippet, LipSyncConfig, LipSyncService, SpeechStatus};

use crate::RecordingHost;

// ============================================================================
// SCENARIO
// ============================================================================

/// A service wired to a recording host
pub struct Scenario {
    pub host: RecordingHost,
    pub service: LipSyncService<RecordingHost>,
}

impl Scenario {
    pub fn new(config: LipSyncConfig) -> Self {
        Self::with_host(RecordingHost::new(), config)
    }

    pub fn with_host(host: RecordingHost, config: LipSyncConfig) -> Self {
        let service = LipSyncService::new(host.clone(), config);
        Self { host, service }
    }

    /// Start, speak every word of `text`, then end
    pub fn speak(&mut self, text: &str) -> usize {
        self.service.start();
        let scheduled = self.service.process_text(text).len();
        self.service.end();
        scheduled
    }

    /// Tick in `step` increments for `total`, collecting completions
    pub fn run_for(&mut self, total: Duration, step: Duration) -> Vec<CompletedSnippet> {
        let mut completed = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            completed.extend(self.service.tick(step));
            elapsed += step;
        }
        completed
    }

    /// Tick until the service is idle with nothing tracked, up to `limit`.
    /// Returns false on timeout.
    pub fn settle(&mut self, limit: Duration) -> bool {
        let step = Duration::from_millis(10);
        let mut elapsed = Duration::ZERO;
        while elapsed <= limit {
            if self.is_quiet() {
                return true;
            }
            self.service.tick(step);
            elapsed += step;
        }
        self.is_quiet()
    }

    pub fn is_quiet(&self) -> bool {
        self.service.status() == SpeechStatus::Idle && self.service.scheduler().tracked_count() == 0
    }
}
