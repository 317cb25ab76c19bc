//! Strict percent-decoding of header values.
//!
//! [`percent_encoding::percent_decode`] is lenient: a `%` that does not start
//! a valid escape is passed through as-is. A `User` value with a broken
//! escape is rejected here instead, before the octets are decoded.

use std::str::Utf8Error;

use percent_encoding::percent_decode;

/// Why a raw header value could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A `%` at `offset` is not followed by two hex digits.
    #[error("malformed percent-escape at offset {offset}")]
    MalformedEscape { offset: usize },
    /// The unescaped octets are not UTF-8.
    #[error("decoded value is not UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}

/// Resolves every `%XX` escape in `raw` and interprets the result as UTF-8.
pub fn decode(raw: &[u8]) -> Result<String, DecodeError> {
    check_escapes(raw)?;
    let decoded = percent_decode(raw).decode_utf8()?;
    Ok(decoded.into_owned())
}

fn check_escapes(raw: &[u8]) -> Result<(), DecodeError> {
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let well_formed = raw
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return Err(DecodeError::MalformedEscape { offset: i });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
