//! Phoneme → viseme mapping
//!
//! Two-stage lookup: phoneme to the 22-entry intermediate set, then the
//! fixed remap to output channels. Every stage is total.

use std::collections::HashMap;

use visemic_core::{remap_intermediate, IntermediateViseme, VisemeId, CLOSED_MOUTH};
use visemic_text::{normalize_phone, PauseKind, PhonemeToken};

/// Base hold for a vowel
pub const VOWEL_DURATION_MS: f64 = 140.0;
/// Base hold for a consonant
pub const CONSONANT_DURATION_MS: f64 = 80.0;

/// Vowel phones (ARPAbet)
pub const VOWELS: &[&str] = &[
    "AA", "AE", "AH", "AO", "AW", "AX", "AY", "EH", "ER", "EY", "IH", "IX", "IY", "OW", "OY",
    "UH", "UW",
];

/// Phone → intermediate viseme
const PHONEME_TABLE: &[(&str, IntermediateViseme)] = &[
    ("AE", IntermediateViseme::AE_AX_AH),
    ("AX", IntermediateViseme::AE_AX_AH),
    ("AH", IntermediateViseme::AE_AX_AH),
    ("AA", IntermediateViseme::AA),
    ("AO", IntermediateViseme::AO),
    ("EY", IntermediateViseme::EY_EH_UH),
    ("EH", IntermediateViseme::EY_EH_UH),
    ("UH", IntermediateViseme::EY_EH_UH),
    ("ER", IntermediateViseme::ER),
    ("Y", IntermediateViseme::Y_IY_IH_IX),
    ("IY", IntermediateViseme::Y_IY_IH_IX),
    ("IH", IntermediateViseme::Y_IY_IH_IX),
    ("IX", IntermediateViseme::Y_IY_IH_IX),
    ("W", IntermediateViseme::W_UW),
    ("UW", IntermediateViseme::W_UW),
    ("OW", IntermediateViseme::OW),
    ("AW", IntermediateViseme::AW),
    ("OY", IntermediateViseme::OY),
    ("AY", IntermediateViseme::AY),
    ("HH", IntermediateViseme::H),
    ("H", IntermediateViseme::H),
    ("R", IntermediateViseme::R),
    ("L", IntermediateViseme::L),
    ("EL", IntermediateViseme::L),
    ("S", IntermediateViseme::S_Z),
    ("Z", IntermediateViseme::S_Z),
    ("SH", IntermediateViseme::SH_CH_JH_ZH),
    ("CH", IntermediateViseme::SH_CH_JH_ZH),
    ("JH", IntermediateViseme::SH_CH_JH_ZH),
    ("ZH", IntermediateViseme::SH_CH_JH_ZH),
    ("TH", IntermediateViseme::TH_DH),
    ("DH", IntermediateViseme::TH_DH),
    ("F", IntermediateViseme::F_V),
    ("V", IntermediateViseme::F_V),
    ("D", IntermediateViseme::D_T_N),
    ("T", IntermediateViseme::D_T_N),
    ("N", IntermediateViseme::D_T_N),
    ("EN", IntermediateViseme::D_T_N),
    ("NX", IntermediateViseme::D_T_N),
    ("DX", IntermediateViseme::D_T_N),
    ("K", IntermediateViseme::K_G_NG),
    ("G", IntermediateViseme::K_G_NG),
    ("NG", IntermediateViseme::K_G_NG),
    ("P", IntermediateViseme::P_B_M),
    ("B", IntermediateViseme::P_B_M),
    ("M", IntermediateViseme::P_B_M),
    ("EM", IntermediateViseme::P_B_M),
];

/// Pause length per punctuation class
pub fn pause_duration_ms(kind: PauseKind) -> f64 {
    match kind {
        PauseKind::Space => 50.0,
        PauseKind::Comma => 180.0,
        PauseKind::Semicolon => 250.0,
        PauseKind::Colon => 220.0,
        PauseKind::Period | PauseKind::Question | PauseKind::Exclamation => 400.0,
    }
}

/// Output channel plus base duration for one phoneme
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisemeTiming {
    pub viseme: VisemeId,
    pub duration_ms: f64,
}

/// Phoneme → viseme lookup
#[derive(Clone, Debug)]
pub struct VisemeMapper {
    table: HashMap<&'static str, IntermediateViseme>,
}

impl VisemeMapper {
    pub fn new() -> Self {
        Self {
            table: PHONEME_TABLE.iter().copied().collect(),
        }
    }

    /// Raw phone → intermediate table
    pub fn mapping_table(&self) -> &HashMap<&'static str, IntermediateViseme> {
        &self.table
    }

    /// First-stage lookup. Pauses and unknown phones give silence.
    pub fn intermediate_viseme(&self, phoneme: &str) -> IntermediateViseme {
        self.table
            .get(phoneme)
            .copied()
            .unwrap_or(IntermediateViseme::SILENCE)
    }

    /// Output channel for a phone or pause spelling
    pub fn get_viseme(&self, phoneme: &str) -> VisemeId {
        match PhonemeToken::parse(phoneme) {
            Some(PhonemeToken::Phone(p)) => remap_intermediate(self.intermediate_viseme(&p)),
            Some(PhonemeToken::Pause(_)) | None => CLOSED_MOUTH,
        }
    }

    /// Vowel check on a raw spelling; case and stress digits are ignored
    pub fn is_vowel(&self, phoneme: &str) -> bool {
        VOWELS.contains(&normalize_phone(phoneme).as_str())
    }

    /// Channel and base duration for a raw spelling (`"AA"`, `"ah0"`,
    /// `"PAUSE_COMMA"`). Never fails.
    pub fn get_viseme_and_duration(&self, phoneme: &str) -> VisemeTiming {
        match PhonemeToken::parse(phoneme) {
            Some(token) => self.timing(&token),
            None => VisemeTiming {
                viseme: CLOSED_MOUTH,
                duration_ms: CONSONANT_DURATION_MS,
            },
        }
    }

    /// Channel and base duration for an extracted token
    pub fn timing(&self, token: &PhonemeToken) -> VisemeTiming {
        match token {
            PhonemeToken::Pause(kind) => VisemeTiming {
                viseme: CLOSED_MOUTH,
                duration_ms: pause_duration_ms(*kind),
            },
            PhonemeToken::Phone(p) => VisemeTiming {
                viseme: remap_intermediate(self.intermediate_viseme(p)),
                duration_ms: if self.is_vowel(p) {
                    VOWEL_DURATION_MS
                } else {
                    CONSONANT_DURATION_MS
                },
            },
        }
    }

    pub fn map_phonemes_to_visemes(&self, phonemes: &[PhonemeToken]) -> Vec<VisemeTiming> {
        phonemes.iter().map(|p| self.timing(p)).collect()
    }

    /// Scale a base duration by speech rate: `round(base / rate)`.
    /// Non-positive or non-finite rates count as 1.
    pub fn adjust_duration(base_ms: f64, speech_rate: f64) -> f64 {
        let rate = if speech_rate > 0.0 && speech_rate.is_finite() {
            speech_rate
        } else {
            1.0
        };
        (base_ms / rate).round()
    }
}

impl Default for VisemeMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use visemic_core::{ArkitViseme, VISEME_CHANNEL_COUNT};
    use visemic_text::PhonemeExtractor;

    #[test]
    fn test_vowel_longer_than_consonant() {
        let mapper = VisemeMapper::new();
        let vowel = mapper.get_viseme_and_duration("AA");
        let consonant = mapper.get_viseme_and_duration("P");
        assert!(vowel.duration_ms > consonant.duration_ms);
    }

    #[test]
    fn test_pause_maps_to_closed_mouth() {
        let mapper = VisemeMapper::new();
        let comma = mapper.get_viseme_and_duration("PAUSE_COMMA");
        assert_eq!(comma.viseme, CLOSED_MOUTH);
        assert!(comma.duration_ms > 0.0);

        let period = mapper.get_viseme_and_duration("PAUSE_PERIOD");
        assert!(period.duration_ms > comma.duration_ms);
    }

    #[test]
    fn test_unknown_maps_to_closed_mouth() {
        let mapper = VisemeMapper::new();
        assert_eq!(mapper.get_viseme("QQQ"), CLOSED_MOUTH);
        assert_eq!(mapper.get_viseme(""), CLOSED_MOUTH);
        assert_eq!(mapper.get_viseme_and_duration("").viseme, CLOSED_MOUTH);
    }

    #[test]
    fn test_bilabials_share_channel() {
        let mapper = VisemeMapper::new();
        let pp = VisemeId::from(ArkitViseme::PP);
        assert_eq!(mapper.get_viseme("P"), pp);
        assert_eq!(mapper.get_viseme("B"), pp);
        assert_eq!(mapper.get_viseme("M"), pp);
        assert_eq!(mapper.get_viseme("s"), VisemeId::from(ArkitViseme::SS));
    }

    #[test]
    fn test_stress_markers_ignored() {
        let mapper = VisemeMapper::new();
        assert_eq!(mapper.get_viseme("AA1"), mapper.get_viseme("AA"));
        assert!(mapper.is_vowel("aa1"));
        assert!(!mapper.is_vowel("k"));
        assert_eq!(
            mapper.get_viseme_and_duration("aa1").duration_ms,
            VOWEL_DURATION_MS
        );
    }

    #[test]
    fn test_hello_is_not_monotone() {
        let extractor = PhonemeExtractor::new();
        let mapper = VisemeMapper::new();
        let timings = mapper.map_phonemes_to_visemes(&extractor.extract_phonemes("hello"));

        let mut ids: Vec<VisemeId> = timings.iter().map(|t| t.viseme).collect();
        ids.sort();
        ids.dedup();
        assert!(ids.len() >= 2);
    }

    #[test]
    fn test_adjust_duration() {
        assert_eq!(VisemeMapper::adjust_duration(140.0, 2.0), 70.0);
        assert_eq!(VisemeMapper::adjust_duration(80.0, 3.0), 27.0);
        assert_eq!(VisemeMapper::adjust_duration(80.0, 0.0), 80.0);
    }

    #[test]
    fn test_table_covers_vowels() {
        let mapper = VisemeMapper::new();
        for v in VOWELS {
            assert!(mapper.mapping_table().contains_key(v), "missing {v}");
            assert_ne!(mapper.get_viseme(v), CLOSED_MOUTH);
        }
    }

    proptest! {
        #[test]
        fn prop_any_phoneme_maps_in_range(p in "\\PC{0,12}") {
            let mapper = VisemeMapper::new();
            let timing = mapper.get_viseme_and_duration(&p);
            prop_assert!((timing.viseme.index() as usize) < VISEME_CHANNEL_COUNT);
            prop_assert!(timing.duration_ms > 0.0);
        }
    }
}
