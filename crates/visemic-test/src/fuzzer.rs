//! Text Fuzzer - Random input against pipeline invariants
//!
//! Generates adversarial text (mixed scripts, digits, stray punctuation,
//! runs of whitespace) and checks that every stage stays total and its
//! output well-formed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use visemic_core::{VisemeId, VISEME_CHANNEL_COUNT};
use visemic_runtime::{LipSyncConfig, Scheduler};
use visemic_text::PhonemeExtractor;
use visemic_visual::{CoarticulationModel, VisemeEvent, VisemeMapper};

use crate::RecordingHost;

const FRAGMENTS: &[&str] = &[
    "hello", "world", "the", "thought", "rhythm", "xylophone", "queue", "knight", "psst",
    "can't", "I'm", "ñandú", "straße", "日本語", "🙂", "42", "3.14", ",", ".", "?", "!", ";",
    ":", "-", "\"", "(", ")", "'", "   ", "\t", "\n", "",
];

/// A broken invariant and the input that broke it
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub input: String,
    pub reason: String,
}

/// Outcome of a fuzzing run
#[derive(Debug, Clone, Default)]
pub struct FuzzReport {
    pub cases: usize,
    pub phonemes: usize,
    pub snippets: usize,
    pub violations: Vec<Violation>,
}

impl FuzzReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Seeded generator plus the pipeline under test
pub struct TextFuzzer {
    rng: StdRng,
    extractor: PhonemeExtractor,
    mapper: VisemeMapper,
    model: CoarticulationModel,
}

impl TextFuzzer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            extractor: PhonemeExtractor::new(),
            mapper: VisemeMapper::new(),
            model: CoarticulationModel::new(),
        }
    }

    /// Random text of up to `max_fragments` pieces
    pub fn generate(&mut self, max_fragments: usize) -> String {
        let count = self.rng.gen_range(0..=max_fragments);
        let mut text = String::new();
        for _ in 0..count {
            if self.rng.gen_bool(0.2) {
                // Random scalar value, any plane
                let c = char::from_u32(self.rng.gen_range(0x20..0x2_FFFF)).unwrap_or('?');
                text.push(c);
            } else {
                let idx = self.rng.gen_range(0..FRAGMENTS.len());
                text.push_str(FRAGMENTS[idx]);
            }
            if self.rng.gen_bool(0.6) {
                text.push(' ');
            }
        }
        text
    }

    /// Run `cases` random inputs through the pure pipeline and a scheduler
    pub fn run(&mut self, cases: usize) -> FuzzReport {
        let mut report = FuzzReport::default();
        let host = RecordingHost::new();
        let mut scheduler = Scheduler::new(
            host.clone(),
            LipSyncConfig {
                randomness: 0.3,
                rng_seed: Some(0),
                ..Default::default()
            },
        );

        for _ in 0..cases {
            let text = self.generate(12);
            report.cases += 1;

            if let Err(reason) = self.check_pure(&text, &mut report) {
                report.violations.push(Violation {
                    input: text.clone(),
                    reason,
                });
            }

            if let Some(scheduled) = scheduler.process_unit(&text, report.cases) {
                report.snippets += 1;
                let log = host.log();
                if let Some(snippet) = log.last_scheduled() {
                    if snippet.max_time < snippet.latest_keyframe_time() {
                        report.violations.push(Violation {
                            input: text.clone(),
                            reason: format!("{} ends before its last keyframe", scheduled.name),
                        });
                    }
                }
            }
        }

        scheduler.dispose();
        report
    }

    fn check_pure(&self, text: &str, report: &mut FuzzReport) -> Result<(), String> {
        let phonemes = self.extractor.extract_phonemes(text);
        if phonemes != self.extractor.extract_phonemes(text) {
            return Err("extraction is not deterministic".into());
        }
        report.phonemes += phonemes.len();

        let mut offset = 0.0;
        let mut events = Vec::with_capacity(phonemes.len());
        for timing in self.mapper.map_phonemes_to_visemes(&phonemes) {
            if timing.viseme.index() as usize >= VISEME_CHANNEL_COUNT {
                return Err(format!("viseme {} out of range", timing.viseme));
            }
            events.push(VisemeEvent::new(timing.viseme, offset, timing.duration_ms));
            offset += timing.duration_ms;
        }

        let curves = self.model.apply_coarticulation(&events, 90.0);
        for (id, curve) in &curves {
            if !curve.is_well_formed() {
                return Err(format!("curve on channel {} is malformed", id));
            }
        }
        if curves.keys().any(|id| *id != VisemeId::new(id.index())) {
            return Err("curve keyed by invalid channel".into());
        }
        Ok(())
    }
}
