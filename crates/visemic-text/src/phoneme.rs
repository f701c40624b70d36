//! Phoneme tokens
//!
//! A token is either an ARPAbet phone (uppercase, stress digits stripped)
//! or a pause tagged by the punctuation that produced it.

use std::fmt;

/// Pause class, one per punctuation kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PauseKind {
    /// Gap between two words
    Space,
    Comma,
    Period,
    Question,
    Exclamation,
    Semicolon,
    Colon,
}

impl PauseKind {
    pub const ALL: [PauseKind; 7] = [
        PauseKind::Space,
        PauseKind::Comma,
        PauseKind::Period,
        PauseKind::Question,
        PauseKind::Exclamation,
        PauseKind::Semicolon,
        PauseKind::Colon,
    ];

    /// Pause produced by a punctuation character, if it produces one
    pub fn from_punctuation(ch: char) -> Option<Self> {
        match ch {
            ',' => Some(PauseKind::Comma),
            '.' => Some(PauseKind::Period),
            '?' => Some(PauseKind::Question),
            '!' => Some(PauseKind::Exclamation),
            ';' => Some(PauseKind::Semicolon),
            ':' => Some(PauseKind::Colon),
            _ => None,
        }
    }

    /// Token spelling (`PAUSE_COMMA`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            PauseKind::Space => "PAUSE_SPACE",
            PauseKind::Comma => "PAUSE_COMMA",
            PauseKind::Period => "PAUSE_PERIOD",
            PauseKind::Question => "PAUSE_QUESTION",
            PauseKind::Exclamation => "PAUSE_EXCLAMATION",
            PauseKind::Semicolon => "PAUSE_SEMICOLON",
            PauseKind::Colon => "PAUSE_COLON",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        PauseKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// One element of an extracted phoneme sequence
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PhonemeToken {
    /// Normalized ARPAbet symbol
    Phone(String),
    Pause(PauseKind),
}

impl PhonemeToken {
    /// Parse a raw symbol. Pause spellings become pauses; anything else is
    /// normalized as a phone. Returns `None` when nothing is left after
    /// normalization.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(kind) = PauseKind::parse(trimmed) {
            return Some(PhonemeToken::Pause(kind));
        }
        let phone = normalize_phone(trimmed);
        if phone.is_empty() {
            None
        } else {
            Some(PhonemeToken::Phone(phone))
        }
    }

    pub fn phone(symbol: &str) -> Self {
        PhonemeToken::Phone(normalize_phone(symbol))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhonemeToken::Phone(p) => p.as_str(),
            PhonemeToken::Pause(kind) => kind.as_str(),
        }
    }

    #[inline]
    pub fn is_pause(&self) -> bool {
        matches!(self, PhonemeToken::Pause(_))
    }
}

impl fmt::Display for PhonemeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercase ASCII letters only. Stress digits and markers are dropped.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
