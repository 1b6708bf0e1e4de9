//! Token codec for packed `data` attributes
//!
//! Packed strings omit the `0x` prefix, so a bare token is read as hex only
//! when it carries a letter A-F. A letter-free token is always decimal.

use crate::error::{Error, Result};

/// Parse one numeric token
///
/// - `0x3c` / `0X3C` -> base 16 after the prefix
/// - `3C`, `c` -> base 16 (contains a hex letter)
/// - `12`, `60` -> base 10
///
/// Values must fit in an `i64`; longer numerals are rejected rather than
/// masked. A sign is allowed in front of bare tokens but not after `0x`.
pub fn parse_token(text: &str) -> Result<i64> {
    let token = text.trim();
    if token.is_empty() {
        return Err(Error::EmptyToken);
    }

    let parsed = if let Some(digits) = strip_hex_prefix(token) {
        if digits.starts_with(['+', '-']) {
            return Err(Error::TokenParse {
                token: token.to_string(),
                reason: "sign after 0x prefix".to_string(),
            });
        }
        i64::from_str_radix(digits, 16)
    } else if token.chars().any(|c| matches!(c, 'a'..='f' | 'A'..='F')) {
        i64::from_str_radix(token, 16)
    } else {
        token.parse::<i64>()
    };

    parsed.map_err(|e| Error::TokenParse {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

fn strip_hex_prefix(token: &str) -> Option<&str> {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
}

/// Format a value for storage: low 8 bits, uppercase hex, no prefix or padding
pub fn format_token(value: i64) -> String {
    format!("{:X}", value & 0xFF)
}

/// Split a packed attribute string on whitespace runs
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Decode a whole packed string into values
pub fn decode_packed(text: &str) -> Result<Vec<i64>> {
    tokenize(text).into_iter().map(parse_token).collect()
}

/// Encode values as a single-space separated packed string
pub fn encode_packed(values: &[i64]) -> String {
    values
        .iter()
        .map(|&v| format_token(v))
        .collect::<Vec<_>>()
        .join(" ")
}
