//! Visemic Core - Fundamental types for text-driven lip sync
//!
//! This crate defines the types shared by every stage of the pipeline:
//! - Viseme channel sets (15-channel output set, 22-entry intermediate set)
//! - Keyframes, curves and snippets (the wire shape handed to a host)
//! - Playback time
//! - Error types for the few edges that can fail

pub mod error;
pub mod snippet;
pub mod time;
pub mod viseme;

pub use error::*;
pub use snippet::*;
pub use time::*;
pub use viseme::*;
