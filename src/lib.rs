//! # kvbatch
//!
//! A write-optimized client for RESP key-value stores:
//! - Non-blocking `set ... ex` enqueue from any number of threads
//! - One background worker coalescing commands into batched writes
//! - Hybrid flush policy: timer, buffer high-water, queue low-water
//! - Transparent reconnect with bounded linear backoff
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Callers (threads)                        │
//! │                  Client::set(key, val, ttl)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  bounded MPSC queue of Cmd
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Background Worker                         │
//! │        encode → append to buffer → flush decision            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  whole-buffer writes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Connection                             │
//! │          (dial / CLIENT REPLY OFF / redial on failure)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use kvbatch::{Client, Config};
//!
//! let client = Client::new(Config::with_addr("localhost")).unwrap();
//! if let Some(err) = client.last_error() {
//!     eprintln!("store not reachable yet: {}", err);
//! }
//! client.set("session:42", "alive", Duration::from_secs(300)).unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Backpressure, Config, RetryPolicy};
pub use client::{Client, ClientStats};
pub use protocol::{Cmd, ReplyMode};
pub use network::{Dialer, TcpDialer, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbatch
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
