//! Byte-at-a-time UTF-8 decoding.
//!
//! [`read_utf8`] pulls one lead byte from a [`ByteSource`], classifies the
//! sequence length from its leading 1-bits and validates every continuation
//! byte. There is no resynchronisation: a byte that breaks a sequence is
//! consumed, and the next call starts at whatever byte follows it.

use crate::queue::{ByteSource, ReadFault};

/// Why a character could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeFault {
    /// The underlying source failed (drained or closed).
    #[error("read failed: {0}")]
    Read(#[from] ReadFault),
    /// The first byte is a continuation byte or a 5+ byte lead.
    #[error("invalid lead byte 0x{0:02X}")]
    InvalidLead(u8),
    /// A byte following a lead did not match `10xxxxxx`.
    #[error("invalid continuation byte 0x{0:02X}")]
    InvalidContinuation(u8),
    /// The sequence encodes a value with more bytes than necessary.
    #[error("overlong encoding of U+{0:04X}")]
    Overlong(u32),
    /// The value is a surrogate or lies beyond U+10FFFF.
    #[error("invalid scalar value 0x{0:X}")]
    InvalidScalar(u32),
}

impl DecodeFault {
    /// True when the source itself is closed and no more input will come.
    pub fn is_closed(&self) -> bool {
        matches!(self, DecodeFault::Read(ReadFault::Closed))
    }
}

/// Decode the next character from `source`.
pub fn read_utf8<S: ByteSource + ?Sized>(source: &mut S) -> Result<char, DecodeFault> {
    let lead = source.read_byte()?;

    let (continuations, initial, min) = match lead.leading_ones() {
        0 => return Ok(char::from(lead)),
        2 => (1, u32::from(lead & 0x1F), 0x80),
        3 => (2, u32::from(lead & 0x0F), 0x800),
        4 => (3, u32::from(lead & 0x07), 0x1_0000),
        _ => return Err(DecodeFault::InvalidLead(lead)),
    };

    let mut value = initial;
    for _ in 0..continuations {
        let byte = source.read_byte()?;
        if byte & 0xC0 != 0x80 {
            return Err(DecodeFault::InvalidContinuation(byte));
        }
        value = (value << 6) | u32::from(byte & 0x3F);
    }

    if value < min {
        return Err(DecodeFault::Overlong(value));
    }
    char::from_u32(value).ok_or(DecodeFault::InvalidScalar(value))
}
