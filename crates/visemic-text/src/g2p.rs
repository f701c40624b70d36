//! Grapheme-to-phoneme fallback
//!
//! Greedy longest-match over a priority-ordered rule table. Multi-letter
//! patterns sit ahead of single letters so digraphs win. A character that
//! matches no rule is dropped.

use crate::PhonemeToken;

/// A spelling pattern and the phones it produces
#[derive(Clone, Copy, Debug)]
pub struct GraphemeRule {
    pub pattern: &'static str,
    pub phones: &'static [&'static str],
}

const fn rule(pattern: &'static str, phones: &'static [&'static str]) -> GraphemeRule {
    GraphemeRule { pattern, phones }
}

/// Rule table, longest patterns first
pub const GRAPHEME_RULES: &[GraphemeRule] = &[
    // Four letters
    rule("tion", &["SH", "AH", "N"]),
    rule("sion", &["ZH", "AH", "N"]),
    rule("ough", &["OW"]),
    // Three letters
    rule("tch", &["CH"]),
    rule("igh", &["AY"]),
    rule("dge", &["JH"]),
    rule("eau", &["OW"]),
    rule("air", &["EH", "R"]),
    rule("ear", &["IH", "R"]),
    rule("ore", &["AO", "R"]),
    rule("our", &["AW", "R"]),
    // Consonant digraphs
    rule("th", &["TH"]),
    rule("sh", &["SH"]),
    rule("ch", &["CH"]),
    rule("ph", &["F"]),
    rule("ck", &["K"]),
    rule("qu", &["K", "W"]),
    rule("wh", &["W"]),
    rule("ng", &["NG"]),
    rule("gh", &[]),
    rule("kn", &["N"]),
    rule("wr", &["R"]),
    // Vowel digraphs
    rule("ee", &["IY"]),
    rule("ea", &["IY"]),
    rule("oo", &["UW"]),
    rule("ou", &["AW"]),
    rule("ow", &["OW"]),
    rule("oi", &["OY"]),
    rule("oy", &["OY"]),
    rule("ai", &["EY"]),
    rule("ay", &["EY"]),
    rule("au", &["AO"]),
    rule("aw", &["AO"]),
    rule("ie", &["IY"]),
    rule("ei", &["EY"]),
    // R-colored
    rule("er", &["ER"]),
    rule("ir", &["ER"]),
    rule("ur", &["ER"]),
    rule("ar", &["AA", "R"]),
    rule("or", &["AO", "R"]),
    // Doubled consonants
    rule("ll", &["L"]),
    rule("ss", &["S"]),
    rule("tt", &["T"]),
    rule("ff", &["F"]),
    rule("mm", &["M"]),
    rule("nn", &["N"]),
    rule("pp", &["P"]),
    rule("bb", &["B"]),
    rule("dd", &["D"]),
    rule("gg", &["G"]),
    rule("rr", &["R"]),
    rule("zz", &["Z"]),
    rule("cc", &["K"]),
    // Single letters
    rule("a", &["AE"]),
    rule("b", &["B"]),
    rule("c", &["K"]),
    rule("d", &["D"]),
    rule("e", &["EH"]),
    rule("f", &["F"]),
    rule("g", &["G"]),
    rule("h", &["HH"]),
    rule("i", &["IH"]),
    rule("j", &["JH"]),
    rule("k", &["K"]),
    rule("l", &["L"]),
    rule("m", &["M"]),
    rule("n", &["N"]),
    rule("o", &["AA"]),
    rule("p", &["P"]),
    rule("q", &["K"]),
    rule("r", &["R"]),
    rule("s", &["S"]),
    rule("t", &["T"]),
    rule("u", &["AH"]),
    rule("v", &["V"]),
    rule("w", &["W"]),
    rule("x", &["K", "S"]),
    rule("y", &["Y"]),
    rule("z", &["Z"]),
];

fn is_vowel_letter(ch: u8) -> bool {
    matches!(ch, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Spell out a lowercase word with [`GRAPHEME_RULES`].
///
/// A trailing `e` after a consonant (`make`, `hope`) is treated as silent.
pub fn graphemes_to_phonemes(word: &str) -> Vec<PhonemeToken> {
    let bytes = word.as_bytes();
    let silent_e = bytes.len() > 2
        && bytes[bytes.len() - 1] == b'e'
        && !is_vowel_letter(bytes[bytes.len() - 2]);
    let body = if silent_e {
        &word[..word.len() - 1]
    } else {
        word
    };

    let mut phonemes = Vec::new();
    let mut rest = body;

    while let Some(ch) = rest.chars().next() {
        match GRAPHEME_RULES.iter().find(|r| rest.starts_with(r.pattern)) {
            Some(r) => {
                phonemes.extend(r.phones.iter().map(|p| PhonemeToken::phone(p)));
                rest = &rest[r.pattern.len()..];
            }
            None => {
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    phonemes
}
