//! Error types for Visemic
//!
//! The lip-sync pipeline itself is total over its inputs. These errors only
//! appear at the edges that read or write external data.

use thiserror::Error;

/// Core Visemic errors
#[derive(Error, Debug)]
pub enum VisemicError {
    // Dictionary errors
    #[error("Malformed dictionary line {line}: {reason}")]
    MalformedDictionaryLine { line: usize, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Visemic operations
pub type VisemicResult<T> = Result<T, VisemicError>;
