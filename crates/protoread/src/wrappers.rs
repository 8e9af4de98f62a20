//! Readers for the well-known wrapper messages (`FloatValue`, `Int32Value`,
//! ...).
//!
//! A wrapper is a message with a single field numbered 1. Nearly every
//! encoder writes it in one canonical shape: a one-byte length, the field's
//! one-byte tag, then the value. When that whole shape is visible in the
//! window it is recognised by a pure match on the bytes and consumed in one
//! step. Anything else (a duplicated field, an unknown field, a value split
//! across refills) goes through the general path: a length-delimited scope
//! and a tag loop where the last occurrence of field 1 wins.
//!
//! An empty wrapper reads as the type's default value.

use crate::{
    CodedReader, ErrorKind, Result,
    primitives::{decode_fixed32, decode_fixed64, decode_varint32, decode_varint64},
    source::Source,
    wire::{WireType, make_tag},
};

const FIXED32_TAG: u32 = make_tag(1, WireType::Fixed32);
const FIXED64_TAG: u32 = make_tag(1, WireType::Fixed64);
const VARINT_TAG: u32 = make_tag(1, WireType::Varint);

/// A canonical wrapper encoding recognised in the window: the value and the
/// number of bytes it spans, length prefix included.
type Matched<T> = Option<(T, usize)>;

fn match_fixed32(window: &[u8]) -> Matched<u32> {
    match window {
        [0, ..] => Some((0, 1)),
        [5, tag, rest @ ..] if u32::from(*tag) == FIXED32_TAG => {
            decode_fixed32(rest).map(|v| (v, 6))
        }
        _ => None,
    }
}

fn match_fixed64(window: &[u8]) -> Matched<u64> {
    match window {
        [0, ..] => Some((0, 1)),
        [9, tag, rest @ ..] if u32::from(*tag) == FIXED64_TAG => {
            decode_fixed64(rest).map(|v| (v, 10))
        }
        _ => None,
    }
}

/// Splits a one-byte length prefix and a body that starts with field 1's
/// varint tag. Lengths of 128 or more need a second length byte and are
/// left to the general path.
fn varint_body(window: &[u8]) -> Option<(usize, &[u8])> {
    let (&len, rest) = window.split_first()?;
    if len >= 0x80 {
        return None;
    }
    let len = usize::from(len);
    let body = rest.get(..len)?;
    match body.split_first() {
        Some((&tag, value)) if u32::from(tag) == VARINT_TAG => Some((len, value)),
        _ => None,
    }
}

fn match_varint32(window: &[u8]) -> Matched<u32> {
    if window.first() == Some(&0) {
        return Some((0, 1));
    }
    let (len, value) = varint_body(window)?;
    let (v, n) = decode_varint32(value).ok()?;
    (n == value.len()).then_some((v, 1 + len))
}

fn match_varint64(window: &[u8]) -> Matched<u64> {
    if window.first() == Some(&0) {
        return Some((0, 1));
    }
    let (len, value) = varint_body(window)?;
    let (v, n) = decode_varint64(value).ok()?;
    (n == value.len()).then_some((v, 1 + len))
}

impl<S: Source> CodedReader<S> {
    fn read_wrapper<T: Default>(
        &mut self,
        fast: fn(&[u8]) -> Matched<T>,
        tag: u32,
        read: fn(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if let Some((value, len)) = fast(self.window()) {
            self.pos += len;
            return Ok(value);
        }
        self.read_wrapper_slow(tag, read)
    }

    fn read_wrapper_slow<T: Default>(
        &mut self,
        expected: u32,
        read: fn(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let len = self.read_length()?;
        self.with_limit(len, |r| {
            let mut value = T::default();
            loop {
                match r.read_tag()? {
                    0 => break,
                    tag if tag == expected => value = read(r)?,
                    _ => r.skip_last_field()?,
                }
            }
            r.check_last_tag_was_end()?;
            if !r.reached_limit() {
                return Err(r.error(ErrorKind::TruncatedMessage));
            }
            Ok(value)
        })
    }

    /// Reads a `google.protobuf.FloatValue`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    pub fn read_float_wrapper(&mut self) -> Result<f32> {
        self.read_wrapper(match_fixed32, FIXED32_TAG, Self::read_fixed32)
            .map(f32::from_bits)
    }

    /// Reads a `google.protobuf.DoubleValue`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    pub fn read_double_wrapper(&mut self) -> Result<f64> {
        self.read_wrapper(match_fixed64, FIXED64_TAG, Self::read_fixed64)
            .map(f64::from_bits)
    }

    /// Reads a `google.protobuf.BoolValue`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    pub fn read_bool_wrapper(&mut self) -> Result<bool> {
        self.read_uint64_wrapper().map(|v| v != 0)
    }

    /// Reads a `google.protobuf.UInt32Value`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    pub fn read_uint32_wrapper(&mut self) -> Result<u32> {
        self.read_wrapper(match_varint32, VARINT_TAG, Self::read_uint32)
    }

    /// Reads a `google.protobuf.Int32Value`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_int32_wrapper(&mut self) -> Result<i32> {
        self.read_uint32_wrapper().map(|v| v as i32)
    }

    /// Reads a `google.protobuf.UInt64Value`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    pub fn read_uint64_wrapper(&mut self) -> Result<u64> {
        self.read_wrapper(match_varint64, VARINT_TAG, Self::read_uint64)
    }

    /// Reads a `google.protobuf.Int64Value`.
    ///
    /// # Errors
    ///
    /// As [`read_message`](Self::read_message).
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_int64_wrapper(&mut self) -> Result<i64> {
        self.read_uint64_wrapper().map(|v| v as i64)
    }
}
