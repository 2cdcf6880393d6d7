//! Error types for the hfile engine
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HfileError
pub type Result<T> = std::result::Result<T, HfileError>;

/// Unified error type for hfile operations
///
/// "Key not found" is deliberately *not* represented here: point lookups
/// report absence through `Ok(None)` / empty vectors, and cursor moves
/// through `Ok(false)`.
#[derive(Debug, Error)]
pub enum HfileError {
    // -------------------------------------------------------------------------
    // Open Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Structural Errors
    // -------------------------------------------------------------------------
    #[error("bad file format: {0}")]
    BadFormat(String),

    #[error("snappy decode failed: {0}")]
    Snappy(#[from] snap::Error),

    #[error("hfile '{0}' has no data blocks")]
    Empty(String),

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("keys out of order: probe {requested:02x?} precedes {last:02x?}")]
    OutOfOrderKey { last: Vec<u8>, requested: Vec<u8> },

    #[error("not configured with reader for collection '{0}'")]
    NotConfigured(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
