//! Background Worker
//!
//! Drains the pending queue into the output buffer and flushes the buffer
//! to the connection.
//!
//! ## State Machine
//! ```text
//!            tick / cmd            buffer non-empty
//!   ┌──────┐ ─────────► ┌──────────┐ ─────────► ┌──────────┐
//!   │ Idle │            │ Draining │            │ Flushing │
//!   └──────┘ ◄───────── └──────────┘            └────┬─────┘
//!      ▲     below marks                             │ no stream /
//!      │                                             │ write failed
//!      │          write ok                           ▼
//!      └──────────────────────────────────────  ┌──────────┐
//!                                               │ Dialing  │
//!   shutdown (any state) ──► Stopped            └──────────┘
//! ```
//!
//! ## Flush Triggers
//! - Timer tick, when the buffer is non-empty
//! - Buffer grew past the high-water mark
//! - Queue depth dropped to the low-water mark or below

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use crossbeam::channel::{self, Receiver, TryRecvError};
use crossbeam::select;

use crate::config::Config;
use crate::error::KvError;
use crate::network::Connection;
use crate::protocol::Cmd;

use super::stats::Counters;

/// Everything the worker thread owns
///
/// The connection and the buffer never leave this struct; callers reach the
/// worker only through the two channels.
pub(crate) struct Worker {
    /// Live connection and its redial logic
    conn: Connection,

    /// Encoded commands awaiting a flush
    buf: BytesMut,

    /// Number of commands currently encoded in `buf`
    buffered: u64,

    /// Pending queue (consumer side)
    commands: Receiver<Cmd>,

    /// Fires (or hangs up) when the client shuts down
    shutdown: Receiver<()>,

    flush_interval: Duration,
    high_water: usize,
    low_water: usize,

    /// Pause between exhausted dial rounds
    redial_pause: Duration,

    stats: Arc<Counters>,
}

impl Worker {
    pub(crate) fn new(
        config: &Config,
        conn: Connection,
        commands: Receiver<Cmd>,
        shutdown: Receiver<()>,
        stats: Arc<Counters>,
    ) -> Self {
        Self {
            conn,
            buf: BytesMut::with_capacity(config.buffer_capacity),
            buffered: 0,
            commands,
            shutdown,
            flush_interval: config.flush_interval,
            high_water: config.buffer_high_water(),
            low_water: config.queue_low_water,
            redial_pause: config.retry.base_delay,
            stats,
        }
    }

    /// Run until shutdown
    ///
    /// Unflushed buffer content is dropped on exit.
    pub(crate) fn run(mut self) {
        tracing::info!("Worker started for {}", self.conn.addr());

        let ticker = channel::tick(self.flush_interval);
        let shutdown = self.shutdown.clone();
        let commands = self.commands.clone();

        loop {
            // Shutdown wins over anything else that is ready
            if self.stopping() {
                break;
            }

            let flow = select! {
                recv(shutdown) -> _ => ControlFlow::Break(()),
                recv(ticker) -> _ => self.flush(),
                recv(commands) -> msg => match msg {
                    Ok(cmd) => self.drain(cmd),
                    // Every sender is gone; nothing more can arrive
                    Err(_) => ControlFlow::Break(()),
                },
            };

            if flow.is_break() {
                break;
            }
        }

        if !self.buf.is_empty() {
            tracing::warn!(
                "Worker stopped with {} unflushed commands ({} bytes) discarded",
                self.buffered,
                self.buf.len()
            );
        }
        tracing::info!("Worker stopped for {}", self.conn.addr());
    }

    /// Append one command and flush if a mark was crossed
    fn drain(&mut self, cmd: Cmd) -> ControlFlow<()> {
        cmd.encode_into(&mut self.buf);
        self.buffered += 1;

        if self.buf.len() > self.high_water || self.commands.len() <= self.low_water {
            return self.flush();
        }
        ControlFlow::Continue(())
    }

    /// Write the whole buffer, redialing until it succeeds
    ///
    /// Breaks only when shutdown is signalled mid-flush.
    fn flush(&mut self) -> ControlFlow<()> {
        if self.buf.is_empty() {
            return ControlFlow::Continue(());
        }

        loop {
            if self.stopping() {
                return ControlFlow::Break(());
            }

            // Step 1: Obtain a stream
            match self.conn.ensure_connected(&self.shutdown) {
                Ok(true) => Counters::incr(&self.stats.connects, 1),
                Ok(false) => {}
                Err(KvError::Interrupted) => return ControlFlow::Break(()),
                Err(e) => {
                    tracing::warn!("Flush: could not reconnect ({}), trying again", e);
                    if self.pause() {
                        return ControlFlow::Break(());
                    }
                    continue;
                }
            }

            // Step 2: Write everything; on failure the stream is already gone
            match self.conn.write_all(&self.buf) {
                Ok(()) => break,
                Err(e) => {
                    Counters::incr(&self.stats.write_failures, 1);
                    tracing::warn!("Flush: write of {} bytes failed: {}", self.buf.len(), e);
                }
            }
        }

        // Step 3: Clear, keeping capacity
        tracing::debug!(
            "Flushed {} commands ({} bytes)",
            self.buffered,
            self.buf.len()
        );
        Counters::incr(&self.stats.flushes, 1);
        Counters::incr(&self.stats.bytes_written, self.buf.len() as u64);
        Counters::incr(&self.stats.written, self.buffered);
        self.buf.clear();
        self.buffered = 0;

        ControlFlow::Continue(())
    }

    /// Wait out the gap between dial rounds; `true` if shutdown arrived
    fn pause(&self) -> bool {
        if self.redial_pause.is_zero() {
            return self.stopping();
        }
        !matches!(
            self.shutdown.recv_timeout(self.redial_pause),
            Err(channel::RecvTimeoutError::Timeout)
        )
    }

    fn stopping(&self) -> bool {
        !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty))
    }
}
