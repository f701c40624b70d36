//! Visemic Runtime - Text in, scheduled mouth animation out
//!
//! Per unit of input (usually one word) the runtime runs:
//! 1. Extract phonemes
//! 2. Map to visemes and scale durations by speech rate and emotion
//! 3. Build curves (coarticulated or snap)
//! 4. Apply intensity and jaw scaling
//! 5. Hand the snippet to the host
//! 6. Arm a cleanup timer
//!
//! [`LipSyncService`] wraps the [`Scheduler`] in an idle → speaking →
//! ending state machine. Nothing here spawns threads; time advances only
//! through `tick`.

pub mod config;
pub mod curves;
pub mod host;
pub mod logging;
pub mod scheduler;
pub mod service;

pub use config::*;
pub use curves::*;
pub use host::*;
pub use logging::*;
pub use scheduler::*;
pub use service::*;
