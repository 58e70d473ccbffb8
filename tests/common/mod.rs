//! Shared test helpers
//!
//! An in-memory `Dialer` that records every byte written across every
//! connection it hands out, with scriptable dial refusals and write
//! failures.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use kvbatch::{Dialer, Transport};

#[derive(Debug, Default)]
pub struct WireState {
    /// Dial calls seen
    pub dials: usize,
    /// Successful dials
    pub connections: usize,
    /// Refuse this many upcoming dials (`usize::MAX` refuses forever)
    pub refuse_dials: usize,
    /// Fail this many upcoming writes, writing nothing
    pub fail_writes: usize,
    /// Writes block while this is set
    pub held: bool,
    /// Everything successfully written, in order
    pub written: Vec<u8>,
}

/// Recording dialer; clones share state
#[derive(Debug, Clone, Default)]
pub struct Wire {
    state: Arc<Mutex<WireState>>,
}

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing(dials: usize) -> Self {
        let wire = Self::new();
        wire.state().refuse_dials = dials;
        wire
    }

    pub fn state(&self) -> MutexGuard<'_, WireState> {
        self.state.lock().unwrap()
    }

    pub fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    pub fn dialer(&self) -> Arc<dyn Dialer> {
        Arc::new(self.clone())
    }
}

impl Dialer for Wire {
    fn dial(&self, network: &str, _addr: &str) -> io::Result<Box<dyn Transport>> {
        assert_eq!(network, "tcp");
        let mut state = self.state();
        state.dials += 1;
        if state.refuse_dials > 0 {
            if state.refuse_dials != usize::MAX {
                state.refuse_dials -= 1;
            }
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        state.connections += 1;
        Ok(Box::new(WireStream { wire: self.clone() }))
    }
}

struct WireStream {
    wire: Wire,
}

impl Write for WireStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.wire.state();
        while state.held {
            drop(state);
            thread::sleep(Duration::from_millis(1));
            state = self.wire.state();
        }
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        state.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Poll `cond` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Split a stream of array-of-bulk-string commands back into tokens
///
/// Panics on malformed input; length prefixes must match the data.
pub fn parse_commands(mut bytes: &[u8]) -> Vec<Vec<String>> {
    fn line<'a>(bytes: &mut &'a [u8]) -> &'a [u8] {
        let end = bytes
            .windows(2)
            .position(|w| w == b"\r\n")
            .expect("missing CRLF");
        let (head, rest) = bytes.split_at(end);
        *bytes = &rest[2..];
        head
    }

    fn number(raw: &[u8]) -> usize {
        std::str::from_utf8(raw).unwrap().parse().unwrap()
    }

    let mut commands = Vec::new();
    while !bytes.is_empty() {
        let header = line(&mut bytes);
        assert_eq!(header[0], b'*', "expected array header");
        let count = number(&header[1..]);

        let mut tokens = Vec::with_capacity(count);
        for _ in 0..count {
            let bulk = line(&mut bytes);
            assert_eq!(bulk[0], b'$', "expected bulk header");
            let len = number(&bulk[1..]);
            let (data, rest) = bytes.split_at(len);
            assert_eq!(&rest[..2], b"\r\n", "bulk length mismatch");
            tokens.push(String::from_utf8(data.to_vec()).unwrap());
            bytes = &rest[2..];
        }
        commands.push(tokens);
    }
    commands
}
