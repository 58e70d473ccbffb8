//! Command definitions
//!
//! `Cmd` is an immutable token list built through a fluent chain:
//!
//! ```
//! use kvbatch::protocol::Cmd;
//!
//! let cmd = Cmd::new().set("a", "foo").ex(300);
//! assert_eq!(cmd.tokens(), ["set", "a", "foo", "ex", "300"]);
//! ```

use std::io::Write;

use bytes::BytesMut;

use super::codec;

/// Server acknowledgment mode selected with `CLIENT REPLY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    On,
    Off,
    Skip,
}

impl ReplyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyMode::On => "ON",
            ReplyMode::Off => "OFF",
            ReplyMode::Skip => "SKIP",
        }
    }
}

/// One protocol operation as an ordered list of string tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    line: Vec<String>,
}

impl Cmd {
    /// Create an empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command from raw tokens
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Append arbitrary tokens
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.line.push(token.into());
        self
    }

    /// `get <key>`
    pub fn get(self, key: impl Into<String>) -> Self {
        self.arg("get").arg(key)
    }

    /// `set <key> <value>`
    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arg("set").arg(key).arg(value)
    }

    /// `ex <seconds>` expiry option
    pub fn ex(self, seconds: u64) -> Self {
        self.arg("ex").arg(seconds.to_string())
    }

    /// `client reply <mode>`
    pub fn client_reply(self, mode: ReplyMode) -> Self {
        self.arg("client").arg("reply").arg(mode.as_str())
    }

    pub fn tokens(&self) -> &[String] {
        &self.line
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Exact size of the encoded form
    pub fn encoded_len(&self) -> usize {
        codec::encoded_len(self.line.as_slice())
    }

    /// Append the encoded form to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        codec::encode_into(self.line.as_slice(), buf);
    }

    /// Encoded form as an owned byte vector
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self.line.as_slice())
    }

    /// Stream the encoded form into `writer`, returning the bytes written
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<usize> {
        codec::write_cmd(writer, self)
    }
}
