//! Delivery counters
//!
//! Written by callers (enqueue side) and the worker (delivery side); read
//! as a point-in-time snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters behind `Client::stats`
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) enqueued: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) written: AtomicU64,
    pub(crate) flushes: AtomicU64,
    pub(crate) bytes_written: AtomicU64,
    pub(crate) connects: AtomicU64,
    pub(crate) write_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn incr(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Release);
    }

    pub(crate) fn decr(counter: &AtomicU64, by: u64) {
        counter.fetch_sub(by, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> ClientStats {
        // `written` first: every command it counts was counted in `enqueued`
        // before it was sent, so the later load sees it too
        let written = self.written.load(Ordering::Acquire);
        ClientStats {
            enqueued: self.enqueued.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Relaxed),
            written,
            flushes: self.flushes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a client's delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Commands accepted onto the pending queue (includes sends still
    /// blocked on a full queue)
    pub enqueued: u64,

    /// Commands rejected by the backpressure policy
    pub dropped: u64,

    /// Commands whose bytes reached the transport
    pub written: u64,

    /// Successful buffer flushes
    pub flushes: u64,

    /// Payload bytes written, excluding connection setup
    pub bytes_written: u64,

    /// Connections opened, including the initial one
    pub connects: u64,

    /// Writes that failed and forced a redial
    pub write_failures: u64,
}

impl ClientStats {
    /// Commands accepted but not yet written
    pub fn in_flight(&self) -> u64 {
        self.enqueued.saturating_sub(self.written)
    }
}
