//! Stateless codecs for the wire format's primitive encodings.
//!
//! The decoders here work on a plain byte slice and never touch cursor state:
//! they report how many bytes a value occupied and leave it to the caller to
//! advance. The reader uses them as its fast path once it has checked that
//! the window holds enough lookahead for the widest encoding, and falls back
//! to a byte-at-a-time path (which can refill) otherwise.
//!
//! Varint semantics
//! - 64-bit varints are at most ten bytes; a tenth byte with its continuation
//!   bit set is `MalformedVarint`.
//! - 32-bit reads consume up to ten bytes but keep only the low 32 bits, so a
//!   value written as a 64-bit varint reads back truncated rather than
//!   failing.
//! - A slice that ends mid-varint reports `TruncatedMessage`.

use alloc::vec::Vec;

use crate::ErrorKind;

/// Maximum encoded length of any varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes that carry payload bits for a 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;

/// Decodes a 64-bit varint from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
///
/// # Errors
///
/// `MalformedVarint` if ten bytes pass without a terminator,
/// `TruncatedMessage` if `bytes` ends first.
#[inline]
pub fn decode_varint64(bytes: &[u8]) -> Result<(u64, usize), ErrorKind> {
    let mut result = 0u64;
    for (i, &b) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        result |= u64::from(b & 0x7f) << (7 * i);
        if b < 0x80 {
            return Ok((result, i + 1));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err(ErrorKind::MalformedVarint)
    } else {
        Err(ErrorKind::TruncatedMessage)
    }
}

/// Decodes a varint from the start of `bytes`, discarding bits above 31.
///
/// # Errors
///
/// As [`decode_varint64`].
#[inline]
pub fn decode_varint32(bytes: &[u8]) -> Result<(u32, usize), ErrorKind> {
    let mut result = 0u32;
    for (i, &b) in bytes.iter().take(MAX_VARINT32_LEN).enumerate() {
        result |= u32::from(b & 0x7f) << (7 * i);
        if b < 0x80 {
            return Ok((result, i + 1));
        }
    }
    // Discard upper 32 bits.
    for (i, &b) in bytes
        .iter()
        .enumerate()
        .take(MAX_VARINT_LEN)
        .skip(MAX_VARINT32_LEN)
    {
        if b < 0x80 {
            return Ok((result, i + 1));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err(ErrorKind::MalformedVarint)
    } else {
        Err(ErrorKind::TruncatedMessage)
    }
}

/// Reads four little-endian bytes, or `None` if fewer are available.
#[inline]
#[must_use]
pub fn decode_fixed32(bytes: &[u8]) -> Option<u32> {
    bytes.first_chunk::<4>().map(|b| u32::from_le_bytes(*b))
}

/// Reads eight little-endian bytes, or `None` if fewer are available.
#[inline]
#[must_use]
pub fn decode_fixed64(bytes: &[u8]) -> Option<u64> {
    bytes.first_chunk::<8>().map(|b| u64::from_le_bytes(*b))
}

/// Reinterprets a fixed32 bit pattern as an IEEE-754 single.
#[inline]
#[must_use]
pub fn float_from_bits(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Reinterprets a fixed64 bit pattern as an IEEE-754 double.
#[inline]
#[must_use]
pub fn double_from_bits(bits: u64) -> f64 {
    f64::from_bits(bits)
}

/// Number of bytes `value` occupies as a varint.
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Appends `value` to `out` as a varint.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads a varint directly from `input` one byte at a time, so nothing past
/// the varint is consumed. Suitable for reading the length prefix of a
/// delimited message before wrapping the stream in a reader.
///
/// Bits above 31 are discarded, as for [`decode_varint32`].
///
/// # Errors
///
/// `TruncatedMessage` on end of stream, `MalformedVarint` after ten bytes
/// without a terminator, `Io` if the stream fails.
#[cfg(feature = "std")]
pub fn read_varint32_from<R: std::io::Read + ?Sized>(input: &mut R) -> Result<u32, ErrorKind> {
    let mut result = 0u32;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        match input.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ErrorKind::TruncatedMessage);
            }
            Err(e) => return Err(ErrorKind::Io(e.kind())),
        }
        let b = byte[0];
        if i < MAX_VARINT32_LEN {
            result |= u32::from(b & 0x7f) << (7 * i);
        }
        if b < 0x80 {
            return Ok(result);
        }
    }
    Err(ErrorKind::MalformedVarint)
}
