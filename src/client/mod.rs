//! Client Module
//!
//! The batching client facade and its background worker.
//!
//! ## Architecture
//! ```text
//! caller ─┐
//! caller ─┼─► bounded queue ─► Worker ─► buffer ─► Connection ─► store
//! caller ─┘   (MPSC, FIFO)     (one thread, owns buffer + connection)
//! ```
//!
//! Callers never touch the connection or the buffer. The only shared
//! state is the queue, the shutdown channel and the delivery counters.

mod stats;
mod worker;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, SendTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use crate::config::{Backpressure, Config};
use crate::error::{KvError, Result};
use crate::network::{Connection, Dialer, TcpDialer};
use crate::protocol::Cmd;

pub use stats::ClientStats;

use stats::Counters;
use worker::Worker;

/// Interval between counter checks in `wait_idle`
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Handle to the running worker thread
struct WorkerHandle {
    /// Dropping this hangs up the worker's shutdown channel
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

/// Write-optimized batching client
///
/// `set` only enqueues; a dedicated worker thread encodes, batches and
/// writes commands, reconnecting transparently. Share across threads with
/// `Arc<Client>`.
///
/// Unflushed commands are discarded when the client is closed or dropped.
/// Use [`Client::wait_idle`] first when that matters.
pub struct Client {
    /// Normalized configuration
    config: Config,

    /// Pending queue (producer side)
    commands: Sender<Cmd>,

    /// Error observed during construction, if any
    last_error: Option<KvError>,

    stats: Arc<Counters>,

    /// `None` once closed
    worker: Mutex<Option<WorkerHandle>>,
}

impl Client {
    /// Start a client
    ///
    /// 1. Validate and normalize the config
    /// 2. Dial once synchronously (one bounded retry round)
    /// 3. Hand the connection to a new worker thread
    ///
    /// A failed initial dial does not fail construction: it is recorded as
    /// `KvError::InitialDial` in [`Client::last_error`] and the worker keeps
    /// redialing. Only an invalid config or a failed thread spawn is an
    /// `Err` here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let config = config.ensure();

        let (cmd_tx, cmd_rx) = channel::bounded(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        let stats = Arc::new(Counters::default());

        let dialer: Arc<dyn Dialer> = match &config.dialer {
            Some(dialer) => Arc::clone(dialer),
            None => Arc::new(TcpDialer::new(config.connect_timeout, config.write_timeout)),
        };
        let mut conn = Connection::new(
            config.addr.clone(),
            dialer,
            config.retry,
            config.disable_server_reply,
        );

        let last_error = match conn.ensure_connected(&shutdown_rx) {
            Ok(_) => {
                Counters::incr(&stats.connects, 1);
                None
            }
            Err(KvError::Io(source)) => {
                tracing::warn!(
                    "Initial dial to {} failed; worker will keep retrying",
                    config.addr
                );
                Some(KvError::InitialDial {
                    addr: config.addr.clone(),
                    attempts: config.retry.attempts,
                    source,
                })
            }
            Err(e) => Some(e),
        };

        let worker = Worker::new(&config, conn, cmd_rx, shutdown_rx, Arc::clone(&stats));
        let thread = thread::Builder::new()
            .name("kvbatch-worker".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            config,
            commands: cmd_tx,
            last_error,
            stats,
            worker: Mutex::new(Some(WorkerHandle {
                shutdown: shutdown_tx,
                thread,
            })),
        })
    }

    /// Start a client for `addr` with default settings
    pub fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::new(Config::with_addr(addr))
    }

    /// Enqueue `set key value ex <ttl>`
    ///
    /// Never touches the network. When the queue is full the configured
    /// [`Backpressure`] policy decides between waiting and
    /// `KvError::QueueFull`. Fails with `KvError::Closed` after shutdown.
    ///
    /// A zero `ttl` means the configured default; anything shorter than a
    /// second is sent as one second, since the store rejects `ex 0`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Result<()> {
        let cmd = Cmd::new().set(key, value).ex(self.expiry_secs(ttl));

        // Counted before the send so the worker can never report a command
        // written that is not yet counted as enqueued
        Counters::incr(&self.stats.enqueued, 1);

        let sent = match self.config.backpressure {
            Backpressure::Block => self.commands.send(cmd).map_err(|_| KvError::Closed),
            Backpressure::Drop => self.commands.try_send(cmd).map_err(|e| match e {
                TrySendError::Full(_) => KvError::QueueFull,
                TrySendError::Disconnected(_) => KvError::Closed,
            }),
            Backpressure::Timeout(timeout) => {
                self.commands.send_timeout(cmd, timeout).map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => KvError::QueueFull,
                    SendTimeoutError::Disconnected(_) => KvError::Closed,
                })
            }
        };

        if let Err(e) = &sent {
            Counters::decr(&self.stats.enqueued, 1);
            if matches!(e, KvError::QueueFull) {
                Counters::incr(&self.stats.dropped, 1);
                tracing::debug!("Pending queue full, command dropped");
            }
        }
        sent
    }

    /// Whole seconds for `ex`, never zero
    fn expiry_secs(&self, ttl: Duration) -> u64 {
        let ttl = if ttl.is_zero() { self.config.ttl } else { ttl };
        ttl.as_secs().max(1)
    }

    /// Enqueue a set with the configured default TTL
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.set(key, value, self.config.ttl)
    }

    /// The error recorded at construction, if the initial dial failed
    ///
    /// Steady-state reconnect failures are retried silently and never show
    /// up here.
    pub fn last_error(&self) -> Option<&KvError> {
        self.last_error.as_ref()
    }

    /// Snapshot of the delivery counters
    pub fn stats(&self) -> ClientStats {
        self.stats.snapshot()
    }

    /// Commands currently waiting in the pending queue
    pub fn queued(&self) -> usize {
        self.commands.len()
    }

    /// Block until every enqueued command has been written, or `timeout`
    ///
    /// Returns `true` when nothing is left in flight.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.stats.snapshot().in_flight() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    /// Stop the worker and wait for it to exit
    ///
    /// Anything still buffered or queued is discarded. Idempotent. A write
    /// already in progress is waited for, so with a custom dialer whose
    /// streams can block forever, so can this (and `Drop`). The default TCP
    /// dialer bounds writes with `Config::write_timeout`.
    pub fn close(&self) {
        let handle = self.worker.lock().take();
        if let Some(WorkerHandle { shutdown, thread }) = handle {
            drop(shutdown);
            if thread.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.worker.lock().is_none()
    }

    /// Default TTL from the normalized config
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// The normalized configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}
