//! Protocol codec
//!
//! Pure encoding functions. No state, no validation of token content.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use super::Cmd;

const CRLF: &[u8] = b"\r\n";

/// Number of decimal digits needed to print `n`
fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Exact encoded size of `tokens`
pub fn encoded_len<S: AsRef<str>>(tokens: &[S]) -> usize {
    // "*" + N + CRLF
    let header = 1 + digits(tokens.len()) + 2;
    tokens.iter().fold(header, |acc, tok| {
        let len = tok.as_ref().len();
        // "$" + len + CRLF + data + CRLF
        acc + 1 + digits(len) + 2 + len + 2
    })
}

/// Append the array-of-bulk-strings encoding of `tokens` to `buf`
pub fn encode_into<S: AsRef<str>>(tokens: &[S], buf: &mut BytesMut) {
    buf.reserve(encoded_len(tokens));

    buf.put_u8(b'*');
    buf.put_slice(tokens.len().to_string().as_bytes());
    buf.put_slice(CRLF);

    for tok in tokens {
        let tok = tok.as_ref().as_bytes();
        buf.put_u8(b'$');
        buf.put_slice(tok.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(tok);
        buf.put_slice(CRLF);
    }
}

/// Encode `tokens` into a fresh byte vector
pub fn encode<S: AsRef<str>>(tokens: &[S]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(encoded_len(tokens));
    encode_into(tokens, &mut buf);
    buf.to_vec()
}

/// Write a command to a stream
pub fn write_cmd<W: Write>(writer: &mut W, cmd: &Cmd) -> std::io::Result<usize> {
    let bytes = cmd.to_bytes();
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}
