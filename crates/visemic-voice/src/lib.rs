//! Visemic Voice - How feeling changes articulation
//!
//! An emotional context (emotion, intensity, arousal, valence) becomes a
//! small set of scalar modulators that the scheduler applies on top of the
//! base viseme curves: louder or softer mouth shapes, a wider jaw, slower
//! or faster segments, more or less blending between neighbours.

pub mod emotion;

pub use emotion::*;
