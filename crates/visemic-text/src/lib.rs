//! Visemic Text - From written words to phoneme sequences
//!
//! Extraction is heuristic, not a text-to-speech front end:
//! - Tokenize on whitespace, keep punctuation as pause tokens
//! - Look each word up in a pronouncing dictionary
//! - Fall back to greedy grapheme rules on a miss
//!
//! Nothing here fails on unknown input. Unmatched characters are dropped.

pub mod dictionary;
pub mod extractor;
pub mod g2p;
pub mod phoneme;

pub use dictionary::*;
pub use extractor::*;
pub use g2p::*;
pub use phoneme::*;
