//! kvbatch CLI Client
//!
//! Command-line front end that pushes writes through the batching client.

use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use kvbatch::{Backpressure, Client, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// kvbatch CLI
#[derive(Parser, Debug)]
#[command(name = "kvbatch-cli")]
#[command(about = "Batched, reply-less writes to a RESP key-value store")]
#[command(version)]
struct Args {
    /// Store address (host or host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    addr: String,

    /// Expiry for written keys, in seconds
    #[arg(short, long, default_value = "300")]
    ttl: u64,

    /// Dial attempts per redial round
    #[arg(long, default_value = "3")]
    attempts: u32,

    /// Backoff unit between dial attempts, in milliseconds
    #[arg(long, default_value = "200")]
    backoff_ms: u64,

    /// Seconds to wait for queued writes to drain before exiting
    #[arg(long, default_value = "10")]
    drain_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set a single key
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Write many keys as fast as the queue accepts them
    Load {
        /// Number of keys to write
        #[arg(short, long, default_value = "10000")]
        count: u64,

        /// Key prefix; keys are `<prefix><n>`
        #[arg(short, long, default_value = "key:")]
        prefix: String,

        /// Value written for every key
        #[arg(short, long, default_value = "value")]
        value: String,

        /// Drop writes instead of blocking when the queue is full
        #[arg(long)]
        drop_when_full: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvbatch=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kvbatch CLI v{}", kvbatch::VERSION);

    let backpressure = match &args.command {
        Commands::Load { drop_when_full: true, .. } => Backpressure::Drop,
        _ => Backpressure::Block,
    };

    let config = Config::builder()
        .addr(&args.addr)
        .ttl(Duration::from_secs(args.ttl))
        .retry(args.attempts, Duration::from_millis(args.backoff_ms))
        .backpressure(backpressure)
        .build();

    let client = match Client::new(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to start client: {}", e);
            process::exit(1);
        }
    };

    if let Some(e) = client.last_error() {
        tracing::warn!("{}; writes will be queued until the store is reachable", e);
    }

    let started = Instant::now();
    match args.command {
        Commands::Set { key, value } => {
            if let Err(e) = client.set_default(key, value) {
                tracing::error!("Set failed: {}", e);
                process::exit(1);
            }
        }
        Commands::Load {
            count,
            prefix,
            value,
            ..
        } => {
            for n in 0..count {
                if let Err(e) = client.set_default(format!("{}{}", prefix, n), value.as_str()) {
                    tracing::debug!("Write {} not queued: {}", n, e);
                }
            }
        }
    }

    let drained = client.wait_idle(Duration::from_secs(args.drain_secs));
    let stats = client.stats();
    client.close();

    tracing::info!(
        "Done in {:?}: enqueued={} written={} dropped={} flushes={} bytes={} connects={} write_failures={}",
        started.elapsed(),
        stats.enqueued,
        stats.written,
        stats.dropped,
        stats.flushes,
        stats.bytes_written,
        stats.connects,
        stats.write_failures
    );

    if !drained {
        tracing::error!("{} writes were still in flight at exit", stats.in_flight());
        process::exit(2);
    }
}
