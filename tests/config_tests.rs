//! Config Tests
//!
//! Tests for defaults, normalization and validation.

use std::time::Duration;

use kvbatch::config::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_QUEUE_LOW_WATER, DEFAULT_READ_DEADLINE, DEFAULT_TTL, DEFAULT_WRITE_TIMEOUT,
};
use kvbatch::{Backpressure, Config, KvError, RetryPolicy};

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.addr, "127.0.0.1:6379");
    assert!(config.dialer.is_none());
    assert!(config.disable_server_reply);
    assert_eq!(config.ttl, Duration::from_secs(300));
    assert_eq!(config.read_deadline, Duration::from_millis(500));
    assert_eq!(config.retry, RetryPolicy::new(15, Duration::from_secs(1)));
    assert_eq!(config.buffer_capacity, 32768);
    assert_eq!(config.buffer_high_water(), 16384);
    assert_eq!(config.queue_capacity, 32768);
    assert_eq!(config.queue_low_water, 32);
    assert_eq!(config.backpressure, Backpressure::Block);
    assert_eq!(config.write_timeout, Some(DEFAULT_WRITE_TIMEOUT));
    assert_eq!(DEFAULT_WRITE_TIMEOUT, Duration::from_secs(5));
}

#[test]
fn test_flush_interval_is_one_and_a_seventh_seconds() {
    assert!(DEFAULT_FLUSH_INTERVAL > Duration::from_millis(1142));
    assert!(DEFAULT_FLUSH_INTERVAL < Duration::from_millis(1143));
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .addr("store.local")
        .ttl(Duration::from_secs(60))
        .retry(3, Duration::from_millis(10))
        .flush_interval(Duration::from_millis(50))
        .buffer_capacity(1024)
        .queue_capacity(16)
        .queue_low_water(2)
        .backpressure(Backpressure::Drop)
        .disable_server_reply(false)
        .connect_timeout(Duration::from_secs(1))
        .write_timeout(None)
        .build();

    assert_eq!(config.addr, "store.local");
    assert_eq!(config.ttl, Duration::from_secs(60));
    assert_eq!(config.retry.attempts, 3);
    assert_eq!(config.flush_interval, Duration::from_millis(50));
    assert_eq!(config.buffer_high_water(), 512);
    assert_eq!(config.queue_capacity, 16);
    assert_eq!(config.queue_low_water, 2);
    assert_eq!(config.backpressure, Backpressure::Drop);
    assert!(!config.disable_server_reply);
    assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
    assert_eq!(config.write_timeout, None);
    // Untouched fields keep their defaults
    assert_eq!(config.buffer_capacity, 1024);
    assert_eq!(config.read_deadline, DEFAULT_READ_DEADLINE);
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_ensure_appends_default_port() {
    assert_eq!(Config::with_addr("localhost").ensure().addr, "localhost:6379");
    assert_eq!(Config::with_addr("10.0.0.1").ensure().addr, "10.0.0.1:6379");
    assert_eq!(Config::with_addr("::1").ensure().addr, "[::1]:6379");
    assert_eq!(Config::with_addr("[::1]").ensure().addr, "[::1]:6379");
    assert_eq!(Config::with_addr("").ensure().addr, "127.0.0.1:6379");
}

#[test]
fn test_ensure_keeps_explicit_port() {
    assert_eq!(Config::with_addr("localhost:7000").ensure().addr, "localhost:7000");
    assert_eq!(Config::with_addr("[::1]:7000").ensure().addr, "[::1]:7000");
}

#[test]
fn test_ensure_fills_zero_durations() {
    let config = Config::builder()
        .ttl(Duration::ZERO)
        .read_deadline(Duration::ZERO)
        .build()
        .ensure();

    assert_eq!(config.ttl, DEFAULT_TTL);
    assert_eq!(config.read_deadline, DEFAULT_READ_DEADLINE);
}

#[test]
fn test_ensure_keeps_explicit_durations() {
    let config = Config::builder()
        .ttl(Duration::from_secs(7))
        .read_deadline(Duration::from_secs(2))
        .build()
        .ensure();

    assert_eq!(config.ttl, Duration::from_secs(7));
    assert_eq!(config.read_deadline, Duration::from_secs(2));
}

#[test]
fn test_ensure_is_idempotent() {
    let once = Config::with_addr("::1").ensure();
    let twice = once.clone().ensure();
    assert_eq!(once.addr, twice.addr);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
    assert_eq!(DEFAULT_BUFFER_CAPACITY, 32768);
    assert_eq!(DEFAULT_QUEUE_CAPACITY, 32768);
    assert_eq!(DEFAULT_QUEUE_LOW_WATER, 32);
}

#[test]
fn test_validate_rejects_zero_values() {
    let bad = [
        Config::builder().retry(0, Duration::from_secs(1)).build(),
        Config::builder().queue_capacity(0).build(),
        Config::builder().buffer_capacity(0).build(),
        Config::builder().flush_interval(Duration::ZERO).build(),
        Config::builder().write_timeout(Some(Duration::ZERO)).build(),
    ];

    for config in bad {
        match config.validate() {
            Err(KvError::Config(_)) => {}
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}

// =============================================================================
// Retry Schedule
// =============================================================================

#[test]
fn test_retry_delay_is_linear() {
    let retry = RetryPolicy::new(4, Duration::from_millis(250));

    assert_eq!(retry.delay_for(0), Duration::ZERO);
    assert_eq!(retry.delay_for(1), Duration::from_millis(250));
    assert_eq!(retry.delay_for(2), Duration::from_millis(500));
    assert_eq!(retry.delay_for(3), Duration::from_millis(750));
}
