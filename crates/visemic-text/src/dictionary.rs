//! Pronouncing dictionary
//!
//! A word → phone table seeded with common English words. Entries can be
//! added at runtime or loaded from CMUdict-format text.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use visemic_core::{VisemicError, VisemicResult};

use crate::PhonemeToken;

/// Built-in entries (ARPAbet, stress stripped)
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    ("a", "AH"),
    ("about", "AH B AW T"),
    ("after", "AE F T ER"),
    ("again", "AH G EH N"),
    ("all", "AO L"),
    ("am", "AE M"),
    ("an", "AE N"),
    ("and", "AE N D"),
    ("are", "AA R"),
    ("as", "AE Z"),
    ("at", "AE T"),
    ("be", "B IY"),
    ("because", "B IH K AO Z"),
    ("been", "B IH N"),
    ("but", "B AH T"),
    ("by", "B AY"),
    ("can", "K AE N"),
    ("could", "K UH D"),
    ("day", "D EY"),
    ("do", "D UW"),
    ("don't", "D OW N T"),
    ("every", "EH V R IY"),
    ("face", "F EY S"),
    ("for", "F AO R"),
    ("from", "F R AH M"),
    ("get", "G EH T"),
    ("go", "G OW"),
    ("good", "G UH D"),
    ("great", "G R EY T"),
    ("had", "HH AE D"),
    ("has", "HH AE Z"),
    ("have", "HH AE V"),
    ("he", "HH IY"),
    ("hello", "HH EH L OW"),
    ("her", "HH ER"),
    ("here", "HH IH R"),
    ("hi", "HH AY"),
    ("him", "HH IH M"),
    ("his", "HH IH Z"),
    ("how", "HH AW"),
    ("i", "AY"),
    ("i'm", "AY M"),
    ("if", "IH F"),
    ("in", "IH N"),
    ("is", "IH Z"),
    ("it", "IH T"),
    ("it's", "IH T S"),
    ("just", "JH AH S T"),
    ("know", "N OW"),
    ("like", "L AY K"),
    ("look", "L UH K"),
    ("make", "M EY K"),
    ("me", "M IY"),
    ("more", "M AO R"),
    ("mouth", "M AW TH"),
    ("my", "M AY"),
    ("name", "N EY M"),
    ("new", "N UW"),
    ("no", "N OW"),
    ("not", "N AA T"),
    ("now", "N AW"),
    ("of", "AH V"),
    ("oh", "OW"),
    ("okay", "OW K EY"),
    ("on", "AA N"),
    ("one", "W AH N"),
    ("or", "AO R"),
    ("our", "AW ER"),
    ("out", "AW T"),
    ("people", "P IY P AH L"),
    ("please", "P L IY Z"),
    ("really", "R IH L IY"),
    ("right", "R AY T"),
    ("say", "S EY"),
    ("see", "S IY"),
    ("she", "SH IY"),
    ("so", "S OW"),
    ("some", "S AH M"),
    ("speak", "S P IY K"),
    ("talk", "T AO K"),
    ("thank", "TH AE NG K"),
    ("thanks", "TH AE NG K S"),
    ("that", "DH AE T"),
    ("the", "DH AH"),
    ("their", "DH EH R"),
    ("them", "DH EH M"),
    ("then", "DH EH N"),
    ("there", "DH EH R"),
    ("they", "DH EY"),
    ("think", "TH IH NG K"),
    ("this", "DH IH S"),
    ("time", "T AY M"),
    ("to", "T UW"),
    ("today", "T AH D EY"),
    ("up", "AH P"),
    ("us", "AH S"),
    ("very", "V EH R IY"),
    ("voice", "V OY S"),
    ("want", "W AA N T"),
    ("was", "W AA Z"),
    ("we", "W IY"),
    ("well", "W EH L"),
    ("were", "W ER"),
    ("what", "W AH T"),
    ("when", "W EH N"),
    ("where", "W EH R"),
    ("which", "W IH CH"),
    ("who", "HH UW"),
    ("why", "W AY"),
    ("will", "W IH L"),
    ("with", "W IH DH"),
    ("world", "W ER L D"),
    ("would", "W UH D"),
    ("yes", "Y EH S"),
    ("you", "Y UW"),
    ("your", "Y AO R"),
];

/// Word → phone sequence table
#[derive(Clone, Debug, Default)]
pub struct PronouncingDictionary {
    entries: HashMap<String, Vec<PhonemeToken>>,
}

/// Dictionary shared between extractor clones
pub type SharedDictionary = Arc<RwLock<PronouncingDictionary>>;

impl PronouncingDictionary {
    /// Empty dictionary
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary seeded with the built-in common words
    pub fn builtin() -> Self {
        let mut dict = Self::empty();
        for (word, phones) in BUILTIN_ENTRIES {
            dict.insert(word, phones.split_whitespace());
        }
        dict
    }

    pub fn into_shared(self) -> SharedDictionary {
        Arc::new(RwLock::new(self))
    }

    /// Add or replace an entry. The word is lowercased; phones are
    /// normalized and pause spellings are rejected.
    /// Returns false when nothing usable remains.
    pub fn insert<'a>(
        &mut self,
        word: &str,
        phones: impl IntoIterator<Item = &'a str>,
    ) -> bool {
        let key = word.trim().to_lowercase();
        let tokens: Vec<PhonemeToken> = phones
            .into_iter()
            .filter_map(PhonemeToken::parse)
            .filter(|t| !t.is_pause())
            .collect();

        if key.is_empty() || tokens.is_empty() {
            return false;
        }
        self.entries.insert(key, tokens);
        true
    }

    /// Look up a lowercase word
    pub fn lookup(&self, word: &str) -> Option<&[PhonemeToken]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge CMUdict-format text into the dictionary.
    ///
    /// Lines look like `WORD  PH1 PH2 ...`. `;;;` lines are comments,
    /// alternate pronunciations (`WORD(2)`) are skipped. Returns the number
    /// of distinct words loaded.
    ///
    /// All or nothing: on a malformed line the dictionary is left untouched.
    pub fn load_cmudict(&mut self, text: &str) -> VisemicResult<usize> {
        let mut staged = Self::empty();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }

            let mut parts = line.split_whitespace();
            let word = parts.next().unwrap_or_default();
            let phones: Vec<&str> = parts.collect();

            if phones.is_empty() {
                return Err(VisemicError::MalformedDictionaryLine {
                    line: idx + 1,
                    reason: format!("no phones for '{}'", word),
                });
            }
            if word.ends_with(')') && word.contains('(') {
                continue;
            }
            if !staged.insert(word, phones.iter().copied()) {
                return Err(VisemicError::MalformedDictionaryLine {
                    line: idx + 1,
                    reason: format!("unusable pronunciation for '{}'", word),
                });
            }
        }

        let added = staged.len();
        self.entries.extend(staged.entries);
        Ok(added)
    }
}
