//! Configuration for kvbatch
//!
//! Centralized configuration with sensible defaults. A `Config` is
//! normalized exactly once by [`Config::ensure`] when a client starts and is
//! never revisited afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{KvError, Result};
use crate::network::Dialer;

// =============================================================================
// Defaults
// =============================================================================

/// Port appended to addresses that do not name one
pub const DEFAULT_PORT: u16 = 6379;

/// Host used when the address is empty
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Expiry applied by `Client::set_default` (seconds)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Read deadline handed to inspection tooling
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_millis(500);

/// Socket write timeout for the default TCP dialer
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Flush cadence: one and one-seventh seconds
pub const DEFAULT_FLUSH_INTERVAL: Duration =
    Duration::from_nanos(1_000_000_000 + 1_000_000_000 / 7);

/// Output buffer capacity in bytes; the high-water mark is half of this
pub const DEFAULT_BUFFER_CAPACITY: usize = 32 * 1024;

/// Pending queue capacity in commands
pub const DEFAULT_QUEUE_CAPACITY: usize = 32 * 1024;

/// Queue depth at or below which the worker flushes eagerly
pub const DEFAULT_QUEUE_LOW_WATER: usize = 32;

/// Dial attempts per redial round
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 15;

/// Backoff unit; attempt `i` sleeps `i * base_delay` first
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

// =============================================================================
// Policies
// =============================================================================

/// Bounded linear-backoff dial schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of dial attempts in one round
    pub attempts: u32,

    /// Attempt `i` (zero-based) waits `i * base_delay` before dialing
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Delay to sleep before the zero-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY)
    }
}

/// What `Client::set` does when the pending queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Wait for the worker to make room
    #[default]
    Block,

    /// Reject immediately with `KvError::QueueFull`
    Drop,

    /// Wait up to the given duration, then reject with `KvError::QueueFull`
    Timeout(Duration),
}

// =============================================================================
// Config
// =============================================================================

/// Main configuration for a batching client
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------
    /// Store address, `host` or `host:port`
    pub addr: String,

    /// Custom dial strategy; `None` dials plain TCP
    pub dialer: Option<Arc<dyn Dialer>>,

    /// Connect timeout used by the default TCP dialer
    pub connect_timeout: Option<Duration>,

    /// Write timeout used by the default TCP dialer. A timed-out write
    /// counts as a failed write: the connection is redialed and the whole
    /// buffer is sent again.
    pub write_timeout: Option<Duration>,

    /// Redial schedule
    pub retry: RetryPolicy,

    /// Send `CLIENT REPLY OFF` on every fresh connection
    pub disable_server_reply: bool,

    // -------------------------------------------------------------------------
    // Command Defaults
    // -------------------------------------------------------------------------
    /// Expiry used when callers do not pass one (zero means "use default")
    pub ttl: Duration,

    /// Read deadline for inspection tooling (zero means "use default").
    /// The write path never reads.
    pub read_deadline: Duration,

    // -------------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------------
    /// Periodic flush cadence
    pub flush_interval: Duration,

    /// Output buffer capacity in bytes
    pub buffer_capacity: usize,

    /// Pending queue capacity in commands
    pub queue_capacity: usize,

    /// Remaining queue depth that triggers an eager flush
    pub queue_low_water: usize,

    /// Full-queue policy for `Client::set`
    pub backpressure: Backpressure,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            dialer: None,
            connect_timeout: None,
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            retry: RetryPolicy::default(),
            disable_server_reply: true,
            ttl: DEFAULT_TTL,
            read_deadline: DEFAULT_READ_DEADLINE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_low_water: DEFAULT_QUEUE_LOW_WATER,
            backpressure: Backpressure::Block,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("dialer", &self.dialer.as_ref().map(|_| "custom"))
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("retry", &self.retry)
            .field("disable_server_reply", &self.disable_server_reply)
            .field("ttl", &self.ttl)
            .field("read_deadline", &self.read_deadline)
            .field("flush_interval", &self.flush_interval)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("queue_capacity", &self.queue_capacity)
            .field("queue_low_water", &self.queue_low_water)
            .field("backpressure", &self.backpressure)
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Shorthand for a default config pointed at `addr`
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    /// Fill in defaults
    ///
    /// 1. Append `DEFAULT_PORT` when the address has none
    /// 2. Replace a zero TTL with `DEFAULT_TTL`
    /// 3. Replace a zero read deadline with `DEFAULT_READ_DEADLINE`
    pub fn ensure(mut self) -> Self {
        if !has_port(&self.addr) {
            self.addr = join_host_port(&self.addr, DEFAULT_PORT);
        }
        if self.ttl.is_zero() {
            self.ttl = DEFAULT_TTL;
        }
        if self.read_deadline.is_zero() {
            self.read_deadline = DEFAULT_READ_DEADLINE;
        }
        self
    }

    /// Reject tuning values the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.attempts == 0 {
            return Err(KvError::Config("retry attempts must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(KvError::Config("queue capacity must be at least 1".to_string()));
        }
        if self.buffer_capacity == 0 {
            return Err(KvError::Config("buffer capacity must be at least 1".to_string()));
        }
        if self.flush_interval.is_zero() {
            return Err(KvError::Config("flush interval must be non-zero".to_string()));
        }
        if self.write_timeout == Some(Duration::ZERO) {
            return Err(KvError::Config("write timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Buffer size above which a flush is forced
    pub fn buffer_high_water(&self) -> usize {
        self.buffer_capacity / 2
    }
}

/// Whether `addr` already names a port (`host:port` or `[v6]:port`)
fn has_port(addr: &str) -> bool {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.contains("]:");
    }
    addr.matches(':').count() == 1
}

fn join_host_port(host: &str, port: u16) -> String {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        format!("{}:{}", DEFAULT_HOST, port)
    } else if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store address
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    /// Use a custom dial strategy
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.config.dialer = Some(dialer);
        self
    }

    /// Set the TCP connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the TCP write timeout; `None` disables it
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Set the redial schedule
    pub fn retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.config.retry = RetryPolicy::new(attempts, base_delay);
        self
    }

    pub fn disable_server_reply(mut self, disable: bool) -> Self {
        self.config.disable_server_reply = disable;
        self
    }

    /// Set the default expiry
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    pub fn read_deadline(mut self, deadline: Duration) -> Self {
        self.config.read_deadline = deadline;
        self
    }

    /// Set the periodic flush cadence
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the output buffer capacity (in bytes)
    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.buffer_capacity = bytes;
        self
    }

    /// Set the pending queue capacity (in commands)
    pub fn queue_capacity(mut self, commands: usize) -> Self {
        self.config.queue_capacity = commands;
        self
    }

    pub fn queue_low_water(mut self, commands: usize) -> Self {
        self.config.queue_low_water = commands;
        self
    }

    /// Set the full-queue policy
    pub fn backpressure(mut self, policy: Backpressure) -> Self {
        self.config.backpressure = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
