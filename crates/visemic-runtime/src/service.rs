//! Lip-sync service
//!
//! A three-state speech machine (idle → speaking → ending → idle) in front
//! of the [`Scheduler`]. [`transition`] is pure; [`LipSyncService`] runs
//! the actions it returns.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use visemic_time::PlaybackClock;
use visemic_voice::{EmotionKind, EmotionalContext};

use crate::{AnimationHost, CompletedSnippet, LipSyncConfig, ScheduledSnippet, Scheduler, SnippetKind};

/// Observable speech state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechStatus {
    #[default]
    Idle,
    Speaking,
    /// Neutral return in flight
    Ending,
}

impl SpeechStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SpeechStatus::Idle => "idle",
            SpeechStatus::Speaking => "speaking",
            SpeechStatus::Ending => "ending",
        }
    }
}

impl fmt::Display for SpeechStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the speech machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    StartSpeech,
    ProcessWord { word: String },
    EndSpeech,
    NeutralReturnComplete,
    StopImmediate,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ResetWordCount,
    ScheduleWord(String),
    ScheduleNeutralReturn,
    DisposeScheduler,
}

/// Result of an accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SpeechStatus,
    pub actions: Vec<Action>,
}

impl Transition {
    fn to(next: SpeechStatus, actions: Vec<Action>) -> Self {
        Self { next, actions }
    }
}

/// Next state and actions for `event` in `status`.
/// `None` when the event is not valid in that state.
pub fn transition(status: SpeechStatus, event: &SpeechEvent) -> Option<Transition> {
    use SpeechStatus::*;

    match (status, event) {
        (_, SpeechEvent::StopImmediate) => Some(Transition::to(Idle, vec![Action::DisposeScheduler])),
        (Idle, SpeechEvent::StartSpeech) => Some(Transition::to(Speaking, vec![Action::ResetWordCount])),
        (Speaking, SpeechEvent::ProcessWord { word }) => {
            Some(Transition::to(Speaking, vec![Action::ScheduleWord(word.clone())]))
        }
        (Speaking, SpeechEvent::EndSpeech) => {
            Some(Transition::to(Ending, vec![Action::ScheduleNeutralReturn]))
        }
        (Ending, SpeechEvent::NeutralReturnComplete) => Some(Transition::to(Idle, Vec::new())),
        _ => None,
    }
}

/// What dispatching an event did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dispatch {
    /// False when the event was ignored
    pub handled: bool,
    /// Snippet scheduled by the event's actions, if any
    pub scheduled: Option<ScheduledSnippet>,
}

/// Speech state machine driving a [`Scheduler`]
pub struct LipSyncService<H> {
    scheduler: Scheduler<H>,
    status: SpeechStatus,
    word_count: usize,
    neutral_return: Option<String>,
    clock: PlaybackClock,
}

impl<H: AnimationHost> LipSyncService<H> {
    pub fn new(host: H, config: LipSyncConfig) -> Self {
        Self::from_scheduler(Scheduler::new(host, config))
    }

    pub fn from_scheduler(scheduler: Scheduler<H>) -> Self {
        Self {
            scheduler,
            status: SpeechStatus::Idle,
            word_count: 0,
            neutral_return: None,
            clock: PlaybackClock::new(),
        }
    }

    pub fn status(&self) -> SpeechStatus {
        self.status
    }

    /// Words processed since the last start
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn scheduler(&self) -> &Scheduler<H> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<H> {
        &mut self.scheduler
    }

    pub fn set_emotion(&mut self, kind: EmotionKind, intensity: f64) {
        self.scheduler.set_emotion(kind, intensity);
    }

    pub fn set_emotional_context(&mut self, context: EmotionalContext) {
        self.scheduler.set_emotional_context(context);
    }

    /// Feed one event through the machine and run its actions
    pub fn dispatch(&mut self, event: SpeechEvent) -> Dispatch {
        let Some(Transition { next, actions }) = transition(self.status, &event) else {
            debug!(status = %self.status, ?event, "ignoring event");
            return Dispatch::default();
        };

        let from = self.status;
        self.status = next;
        if from != next {
            info!(%from, to = %next, "speech status changed");
        }

        let mut outcome = Dispatch {
            handled: true,
            scheduled: None,
        };
        for action in actions {
            if let Some(scheduled) = self.run(action) {
                outcome.scheduled = Some(scheduled);
            }
        }
        outcome
    }

    fn run(&mut self, action: Action) -> Option<ScheduledSnippet> {
        match action {
            Action::ResetWordCount => {
                self.word_count = 0;
                None
            }
            Action::ScheduleWord(word) => {
                let index = self.word_count;
                self.word_count += 1;
                self.scheduler.process_unit(&word, index)
            }
            Action::ScheduleNeutralReturn => match self.scheduler.schedule_neutral_return() {
                Some(scheduled) => {
                    self.neutral_return = Some(scheduled.name.clone());
                    Some(scheduled)
                }
                None => {
                    // Nothing will ever complete; settle now
                    self.neutral_return = None;
                    self.status = SpeechStatus::Idle;
                    None
                }
            },
            Action::DisposeScheduler => {
                self.neutral_return = None;
                self.scheduler.dispose();
                None
            }
        }
    }

    /// Idle → speaking
    pub fn start(&mut self) -> bool {
        self.dispatch(SpeechEvent::StartSpeech).handled
    }

    /// Schedule one word while speaking
    pub fn process_word(&mut self, word: &str) -> Option<ScheduledSnippet> {
        self.dispatch(SpeechEvent::ProcessWord {
            word: word.to_string(),
        })
        .scheduled
    }

    /// Schedule every whitespace-separated word of `text` while speaking
    pub fn process_text(&mut self, text: &str) -> Vec<ScheduledSnippet> {
        text.split_whitespace()
            .filter_map(|word| self.process_word(word))
            .collect()
    }

    /// Speaking → ending, easing the mouth closed
    pub fn end(&mut self) -> bool {
        self.dispatch(SpeechEvent::EndSpeech).handled
    }

    /// Any state → idle. Every tracked snippet is removed before this
    /// returns and no cleanup fires afterwards.
    pub fn stop(&mut self) {
        self.dispatch(SpeechEvent::StopImmediate);
    }

    /// Advance time by `dt`, running due cleanups
    pub fn tick(&mut self, dt: Duration) -> Vec<CompletedSnippet> {
        let completed = self.scheduler.tick(dt);

        let neutral_done = completed.iter().any(|c| {
            c.kind == SnippetKind::NeutralReturn && self.neutral_return.as_deref() == Some(c.name.as_str())
        });
        if neutral_done {
            self.neutral_return = None;
            self.dispatch(SpeechEvent::NeutralReturnComplete);
        }
        completed
    }

    /// Advance by wall-clock time since the previous update
    pub fn update(&mut self) -> Vec<CompletedSnippet> {
        let dt = self.clock.tick();
        self.tick(dt)
    }
}
