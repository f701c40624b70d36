//! Phoneme extraction
//!
//! Text → tokens → phonemes. Each call is a pure function of the text and
//! the dictionary contents at the time of the call.

use tracing::trace;

use crate::{
    graphemes_to_phonemes, PauseKind, PhonemeToken, PronouncingDictionary, SharedDictionary,
};

/// A lexical token in input text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextToken {
    Word(String),
    Punctuation(PauseKind),
}

/// Where a word's phones came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhonemeSource {
    Dictionary,
    Rules,
    /// Nothing spellable; a single neutral vowel stands in
    Neutral,
}

/// Stand-in for words the rules cannot spell (digits, non-Latin scripts)
pub const NEUTRAL_VOWEL: &str = "AH";

/// Per-word extraction result
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordPhonemes {
    pub word: String,
    pub phonemes: Vec<PhonemeToken>,
    pub source: PhonemeSource,
}

/// Split text into words and pause-producing punctuation.
///
/// Words are runs of alphanumerics and apostrophes. Punctuation without a
/// pause class is dropped.
pub fn tokenize(text: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            word.push(ch);
            continue;
        }
        if !word.is_empty() {
            tokens.push(TextToken::Word(std::mem::take(&mut word)));
        }
        if let Some(kind) = PauseKind::from_punctuation(ch) {
            tokens.push(TextToken::Punctuation(kind));
        }
    }
    if !word.is_empty() {
        tokens.push(TextToken::Word(word));
    }

    tokens
}

/// Text → phoneme sequence extractor.
///
/// Clones share one dictionary, so `add_word` on any clone is visible to
/// all of them.
#[derive(Clone, Debug)]
pub struct PhonemeExtractor {
    dictionary: SharedDictionary,
}

impl PhonemeExtractor {
    /// Extractor over a fresh built-in dictionary
    pub fn new() -> Self {
        Self::with_dictionary(PronouncingDictionary::builtin().into_shared())
    }

    pub fn with_dictionary(dictionary: SharedDictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &SharedDictionary {
        &self.dictionary
    }

    /// Register a pronunciation. Affects later calls only.
    pub fn add_word<'a>(&self, word: &str, phones: impl IntoIterator<Item = &'a str>) -> bool {
        self.dictionary.write().insert(word, phones)
    }

    /// Phones for a single word (dictionary first, then rules)
    pub fn word_phonemes(&self, word: &str) -> WordPhonemes {
        let key = word.to_lowercase();

        {
            let dict = self.dictionary.read();
            let hit = dict.lookup(&key).or_else(|| {
                if key.contains('\'') {
                    dict.lookup(&key.replace('\'', ""))
                } else {
                    None
                }
            });
            if let Some(phonemes) = hit {
                return WordPhonemes {
                    word: key,
                    phonemes: phonemes.to_vec(),
                    source: PhonemeSource::Dictionary,
                };
            }
        }

        trace!(word = %key, "dictionary miss, spelling out");
        let phonemes = graphemes_to_phonemes(&key);
        if phonemes.is_empty() && key.chars().any(char::is_alphanumeric) {
            trace!(word = %key, "no rule matched, using neutral vowel");
            return WordPhonemes {
                word: key,
                phonemes: vec![PhonemeToken::phone(NEUTRAL_VOWEL)],
                source: PhonemeSource::Neutral,
            };
        }
        WordPhonemes {
            word: key,
            phonemes,
            source: PhonemeSource::Rules,
        }
    }

    /// Per-word breakdown, punctuation omitted
    pub fn extract_words(&self, text: &str) -> Vec<WordPhonemes> {
        tokenize(text)
            .into_iter()
            .filter_map(|t| match t {
                TextToken::Word(w) => Some(self.word_phonemes(&w)),
                TextToken::Punctuation(_) => None,
            })
            .collect()
    }

    /// Full phoneme sequence for `text`.
    ///
    /// `PAUSE_SPACE` is only emitted between two adjacent words, never next
    /// to punctuation.
    pub fn extract_phonemes(&self, text: &str) -> Vec<PhonemeToken> {
        let mut out = Vec::new();
        let mut prev_was_word = false;

        for token in tokenize(text) {
            match token {
                TextToken::Word(w) => {
                    if prev_was_word {
                        out.push(PhonemeToken::Pause(PauseKind::Space));
                    }
                    out.extend(self.word_phonemes(&w).phonemes);
                    prev_was_word = true;
                }
                TextToken::Punctuation(kind) => {
                    out.push(PhonemeToken::Pause(kind));
                    prev_was_word = false;
                }
            }
        }

        out
    }
}

impl Default for PhonemeExtractor {
    fn default() -> Self {
        Self::new()
    }
}
