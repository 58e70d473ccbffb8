//! Network Module
//!
//! Transport boundary and connection lifecycle.
//!
//! ## Architecture
//! - `Dialer` opens a byte stream for `(network, address)`; `TcpDialer` is
//!   the default, tests plug in their own
//! - `Connection` exclusively owns at most one live stream and redials it
//!   with bounded linear backoff

mod transport;
mod connection;

pub use transport::{Dialer, TcpDialer, Transport, NETWORK_TCP};
pub use connection::Connection;
