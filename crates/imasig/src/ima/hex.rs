//! Hex decoding for manifest signature tokens
//!
//! Signature tokens are case-insensitive hex strings. Whitespace may appear
//! between any two digits (not only at byte boundaries), which lets a
//! manifest writer wrap or group long signatures. Decoding is pure: it never
//! logs and never touches the filesystem.

use thiserror::Error;

/// Reason a signature token could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    /// The token is empty or contains only whitespace.
    #[error("signature is empty")]
    Empty,
    /// The token ends half-way through a byte.
    #[error("signature has an odd number of hex digits")]
    OddDigitCount,
    /// A character outside `[0-9A-Fa-f]` where a digit was expected.
    #[error("invalid hex digit {found:?} at offset {offset}")]
    InvalidDigit {
        /// Byte offset of the offending character within the token
        offset: usize,
        /// The offending character
        found: char,
    },
}

/// Error returned by [`decode_hex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed signature: {0}")]
    Malformed(Malformed),
}

impl From<Malformed> for DecodeError {
    fn from(value: Malformed) -> Self {
        Self::Malformed(value)
    }
}

/// Decode a hex signature token into raw bytes.
///
/// Whitespace runs before each digit are skipped. Every other character
/// must be a hex digit, and the digits must pair up into whole bytes.
///
/// # Errors
///
/// Returns `DecodeError::Malformed` for an empty (or whitespace-only) token,
/// an odd digit count, or a non-hex character.
pub fn decode_hex(token: &str) -> Result<Vec<u8>, DecodeError> {
    let mut decoded = Vec::with_capacity(token.len() / 2);
    let mut digits = token
        .bytes()
        .enumerate()
        .filter(|(_, b)| !is_space(*b));

    while let Some((hi_offset, hi)) = digits.next() {
        let (lo_offset, lo) = digits.next().ok_or(Malformed::OddDigitCount)?;
        let hi = hex_digit(hi).ok_or_else(|| invalid_digit(token, hi_offset))?;
        let lo = hex_digit(lo).ok_or_else(|| invalid_digit(token, lo_offset))?;
        decoded.push((hi << 4) | lo);
    }

    if decoded.is_empty() {
        return Err(Malformed::Empty.into());
    }
    Ok(decoded)
}

/// Encode bytes as a lowercase hex string.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// C-locale whitespace, including vertical tab and form feed.
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn invalid_digit(token: &str, offset: usize) -> Malformed {
    let found = token
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Malformed::InvalidDigit { offset, found }
}
