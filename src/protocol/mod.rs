//! Protocol Module
//!
//! Encodes commands into the store's request format: an array of bulk
//! strings.
//!
//! ## Wire Format
//! ```text
//! *<N>\r\n
//! $<len(tok_0)>\r\n<tok_0>\r\n
//! ...
//! $<len(tok_N-1)>\r\n<tok_N-1>\r\n
//! ```
//!
//! Lengths are byte lengths of the UTF-8 token. Encoding is total: every
//! token sequence, including the empty one, has exactly one encoding.
//! Replies are never parsed here.

mod command;
mod codec;

pub use command::{Cmd, ReplyMode};
pub use codec::{encode, encode_into, encoded_len, write_cmd};
