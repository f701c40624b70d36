//! Visemic Test Harness - Pipeline validation
//!
//! This crate provides:
//! - A recording animation host
//! - End-to-end speech scenarios
//! - Random text fuzzing against pipeline invariants

pub mod fuzzer;
pub mod host;
pub mod scenarios;

pub use fuzzer::*;
pub use host::*;
pub use scenarios::*;
