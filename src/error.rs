//! Error types for kvbatch
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for kvbatch operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// The synchronous dial performed at construction failed.
    ///
    /// The client stays usable; the background worker keeps redialing.
    #[error("initial dial failed: {addr} unreachable after {attempts} attempts: {source}")]
    InitialDial {
        addr: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// Dialing was abandoned because the client is shutting down.
    #[error("dial interrupted by shutdown")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Queue Errors
    // -------------------------------------------------------------------------
    #[error("pending queue is full")]
    QueueFull,

    #[error("client is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// True for the non-fatal construction-time dial failure
    pub fn is_initial_dial(&self) -> bool {
        matches!(self, KvError::InitialDial { .. })
    }
}
