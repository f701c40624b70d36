//! Visemic Visual - Mouth shapes as curves
//!
//! Phonemes become visemes, visemes become overlapping intensity curves.
//!
//! # Stages
//!
//! - Mapping: phoneme → intermediate viseme → output channel, plus a base
//!   duration (vowels hold longer than consonants)
//! - Coarticulation: neighbouring visemes bleed into each other through
//!   dominance-weighted anticipatory and carryover windows
//!
//! Both stages are pure. Identical input yields identical curves.

pub mod coarticulation;
pub mod dominance;
pub mod mapper;

pub use coarticulation::*;
pub use dominance::*;
pub use mapper::*;
