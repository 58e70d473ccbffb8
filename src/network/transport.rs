//! Transport boundary
//!
//! Anything writable and sendable across threads can carry commands;
//! closing a stream is dropping it.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Network name passed to dialers for plain TCP
pub const NETWORK_TCP: &str = "tcp";

/// A writable byte stream owned by the worker
pub trait Transport: Write + Send {}

impl<T: Write + Send> Transport for T {}

/// Strategy for opening a transport
pub trait Dialer: Send + Sync {
    /// Open a stream to `addr` over `network`
    fn dial(&self, network: &str, addr: &str) -> io::Result<Box<dyn Transport>>;
}

impl<F> Dialer for F
where
    F: Fn(&str, &str) -> io::Result<Box<dyn Transport>> + Send + Sync,
{
    fn dial(&self, network: &str, addr: &str) -> io::Result<Box<dyn Transport>> {
        self(network, addr)
    }
}

/// Default dialer backed by `std::net::TcpStream`
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    /// Per-address connect timeout; `None` uses the OS default
    pub connect_timeout: Option<Duration>,

    /// Socket write timeout; `None` lets a write block indefinitely
    pub write_timeout: Option<Duration>,
}

impl TcpDialer {
    pub fn new(connect_timeout: Option<Duration>, write_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            write_timeout,
        }
    }

    fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        let timeout = match self.connect_timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect(addr),
        };

        let mut last_err = None;
        for sock_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&sock_addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} resolved to no addresses", addr),
            )
        }))
    }
}

impl Dialer for TcpDialer {
    fn dial(&self, network: &str, addr: &str) -> io::Result<Box<dyn Transport>> {
        if network != NETWORK_TCP {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported network: {}", network),
            ));
        }

        let stream = self.connect(addr)?;

        // Batches are already coalesced; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        // A store that stops reading must not wedge the worker
        if let Some(timeout) = self.write_timeout {
            stream.set_write_timeout(Some(timeout))?;
        }

        Ok(Box::new(stream))
    }
}
