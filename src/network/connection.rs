//! Connection Handle
//!
//! Owns the single live stream of a client and knows how to replace it.

use std::io::{self, Write};
use std::sync::Arc;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::config::RetryPolicy;
use crate::error::{KvError, Result};
use crate::protocol::{Cmd, ReplyMode};

use super::{Dialer, Transport, NETWORK_TCP};

/// Exclusively-owned, replaceable handle to a store connection
///
/// ## Invariants
/// - At most one live stream at any time
/// - A failed write drops the stream; the next `ensure_connected` redials
pub struct Connection {
    /// Normalized `host:port`
    addr: String,

    /// How streams are opened
    dialer: Arc<dyn Dialer>,

    /// Attempt bound and backoff unit for one redial round
    retry: RetryPolicy,

    /// Send `CLIENT REPLY OFF` before handing out a fresh stream
    disable_server_reply: bool,

    /// The live stream, if any
    stream: Option<Box<dyn Transport>>,
}

impl Connection {
    /// Create a disconnected handle
    pub fn new(
        addr: impl Into<String>,
        dialer: Arc<dyn Dialer>,
        retry: RetryPolicy,
        disable_server_reply: bool,
    ) -> Self {
        Self {
            addr: addr.into(),
            dialer,
            retry,
            disable_server_reply,
            stream: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Make sure a live stream exists
    ///
    /// Idempotent when already connected. Otherwise runs one bounded dial
    /// round. Backoff sleeps wait on `interrupt`; a message or a hang-up
    /// there aborts the round with `KvError::Interrupted`.
    ///
    /// Returns `true` when a new stream was opened.
    pub fn ensure_connected(&mut self, interrupt: &Receiver<()>) -> Result<bool> {
        if self.stream.is_some() {
            return Ok(false);
        }
        let stream = self.dial(interrupt)?;
        self.stream = Some(stream);
        Ok(true)
    }

    /// Write the whole of `buf` to the live stream
    ///
    /// Any failure invalidates the stream.
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            KvError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "no live connection",
            ))
        })?;

        let written = stream.write_all(buf).and_then(|_| stream.flush());
        if let Err(e) = written {
            self.invalidate();
            return Err(e.into());
        }
        Ok(())
    }

    /// Drop the live stream, closing it
    pub fn invalidate(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Dropped connection to {}", self.addr);
        }
    }

    /// One bounded round of dial attempts with linear backoff
    ///
    /// Attempt `i` (zero-based) first sleeps `i * base_delay`.
    fn dial(&self, interrupt: &Receiver<()>) -> Result<Box<dyn Transport>> {
        tracing::debug!("Dialing new connection to {}", self.addr);

        let mut last_err = None;
        for attempt in 0..self.retry.attempts {
            let delay = self.retry.delay_for(attempt);
            if !delay.is_zero() && interrupted(interrupt, delay) {
                return Err(KvError::Interrupted);
            }

            match self.open() {
                Ok(stream) => {
                    tracing::info!(
                        "Connected to {} (attempt {}/{})",
                        self.addr,
                        attempt + 1,
                        self.retry.attempts
                    );
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::warn!(
                        "Dial {} failed (attempt {}/{}): {}",
                        self.addr,
                        attempt + 1,
                        self.retry.attempts,
                        e
                    );
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "no dial attempts configured")
        });
        Err(KvError::Io(err))
    }

    /// Dial once and prepare the stream for reply-less writes
    fn open(&self) -> io::Result<Box<dyn Transport>> {
        let mut stream = self.dialer.dial(NETWORK_TCP, &self.addr)?;
        if self.disable_server_reply {
            Cmd::new().client_reply(ReplyMode::Off).write_to(&mut stream)?;
        }
        Ok(stream)
    }
}

/// Sleep for `delay` unless `interrupt` fires or hangs up first
fn interrupted(interrupt: &Receiver<()>, delay: std::time::Duration) -> bool {
    !matches!(interrupt.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
}
