use std::fmt::Write;

use crate::error::{CodecError, Result};

/// Encode bytes as `0x` followed by two uppercase hex digits per byte.
pub fn serialize_hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Decode a `0x`/`0X` prefixed hex string. Digits may be either case.
pub fn deserialize_hex_bytes(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = strip_hex_prefix(text).ok_or(CodecError::InvalidHex("missing 0x prefix"))?;
    if digits.len() % 2 != 0 {
        return Err(CodecError::InvalidHex("odd number of digits"));
    }

    digits
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}

/// The digits after a `0x`/`0X` prefix, if present.
pub(crate) fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn nibble(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(CodecError::InvalidHex("non-hex digit")),
    }
}
