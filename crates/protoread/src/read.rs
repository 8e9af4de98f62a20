//! Field-level reads used by generated message decoders.
//!
//! Every method here reads one field value, assuming its tag was just
//! returned by [`CodedReader::read_tag`]. Nested messages and groups are read
//! by handing the reader to a caller-supplied decode function; the engine
//! owns the framing (limit, depth, end-of-scope checks) and the callback owns
//! the field dispatch.

use alloc::{string::String, vec::Vec};

use bstr::ByteSlice;

use crate::{
    CodedReader, ErrorKind, Result, Utf8Mode,
    source::Source,
    wire::{self, WireType},
};

impl<S: Source> CodedReader<S> {
    /// Reads a `double` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than eight bytes remain in scope.
    pub fn read_double(&mut self) -> Result<f64> {
        self.read_raw_little_endian64().map(f64::from_bits)
    }

    /// Reads a `float` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than four bytes remain in scope.
    pub fn read_float(&mut self) -> Result<f32> {
        self.read_raw_little_endian32().map(f32::from_bits)
    }

    /// Reads a `uint64` field.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_uint64(&mut self) -> Result<u64> {
        self.read_raw_varint64()
    }

    /// Reads an `int64` field.
    ///
    /// # Errors
    ///
    /// Varint errors.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_int64(&mut self) -> Result<i64> {
        self.read_raw_varint64().map(|v| v as i64)
    }

    /// Reads an `int32` field. Negative values are written sign-extended to
    /// ten bytes; the high bits are discarded.
    ///
    /// # Errors
    ///
    /// Varint errors.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_int32(&mut self) -> Result<i32> {
        self.read_raw_varint32().map(|v| v as i32)
    }

    /// Reads a `fixed64` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than eight bytes remain in scope.
    pub fn read_fixed64(&mut self) -> Result<u64> {
        self.read_raw_little_endian64()
    }

    /// Reads a `fixed32` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than four bytes remain in scope.
    pub fn read_fixed32(&mut self) -> Result<u32> {
        self.read_raw_little_endian32()
    }

    /// Reads a `bool` field. Any non-zero varint is `true`.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_raw_varint64().map(|v| v != 0)
    }

    /// Reads a `uint32` field.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_uint32(&mut self) -> Result<u32> {
        self.read_raw_varint32()
    }

    /// Reads an enum field as its raw numeric value.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_enum(&mut self) -> Result<i32> {
        self.read_int32()
    }

    /// Reads an `sfixed32` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than four bytes remain in scope.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_sfixed32(&mut self) -> Result<i32> {
        self.read_raw_little_endian32().map(|v| v as i32)
    }

    /// Reads an `sfixed64` field.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than eight bytes remain in scope.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_sfixed64(&mut self) -> Result<i64> {
        self.read_raw_little_endian64().map(|v| v as i64)
    }

    /// Reads a zigzag-encoded `sint32` field.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_sint32(&mut self) -> Result<i32> {
        self.read_raw_varint32().map(wire::zigzag_decode32)
    }

    /// Reads a zigzag-encoded `sint64` field.
    ///
    /// # Errors
    ///
    /// Varint errors.
    pub fn read_sint64(&mut self) -> Result<i64> {
        self.read_raw_varint64().map(wire::zigzag_decode64)
    }

    /// Reads the length prefix of a length-delimited field.
    ///
    /// The value is returned as written; a length of 2^31 or more comes back
    /// negative and is rejected by whichever operation consumes it.
    ///
    /// # Errors
    ///
    /// Varint errors.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_length(&mut self) -> Result<i32> {
        self.read_raw_varint32().map(|v| v as i32)
    }

    /// Reads a `bytes` field.
    ///
    /// # Errors
    ///
    /// `NegativeSize` or `TruncatedMessage` for a bad length.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_length()?;
        self.read_raw_bytes(len)
    }

    /// Reads a `string` field, validating or repairing UTF-8 according to
    /// [`ReaderOptions::utf8_mode`](crate::ReaderOptions::utf8_mode).
    ///
    /// # Errors
    ///
    /// As [`read_bytes`](Self::read_bytes), plus `InvalidUtf8` in strict mode.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let n = self.checked_len(len)?;
        let mode = self.options.utf8_mode;

        let decoded = if let Some(bytes) = self.window().get(..n) {
            let decoded = decode_text(bytes, mode);
            self.pos += n;
            decoded
        } else {
            let bytes = self.read_raw_bytes(len)?;
            decode_text(&bytes, mode)
        };
        decoded.map_err(|valid_up_to| self.error(ErrorKind::InvalidUtf8 { valid_up_to }))
    }

    /// Reads an embedded message.
    ///
    /// Reads the length prefix, then runs `decode` one nesting level deeper
    /// inside a scope of exactly that many bytes. `decode` must loop over
    /// [`read_tag`](Self::read_tag) until it returns 0.
    ///
    /// The enclosing limit and the depth are restored whether `decode`
    /// succeeds or fails.
    ///
    /// # Errors
    ///
    /// `RecursionLimitExceeded` if already at the depth limit.
    /// `UnexpectedTrailingData` if `decode` returned before seeing the end of
    /// the scope. `TruncatedMessage` if the input ended before the declared
    /// length. Otherwise whatever `decode` returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protoread::CodedReader;
    ///
    /// // Field 1: a message whose field 1 is the varint 150.
    /// let mut reader = CodedReader::from_slice(&[0x0a, 0x03, 0x08, 0x96, 0x01]);
    /// assert_eq!(reader.read_tag().unwrap(), 0x0a);
    /// let inner = reader
    ///     .read_message(|r| {
    ///         let mut value = 0;
    ///         loop {
    ///             match r.read_tag()? {
    ///                 0 => return Ok(value),
    ///                 8 => value = r.read_uint32()?,
    ///                 _ => r.skip_last_field()?,
    ///             }
    ///         }
    ///     })
    ///     .unwrap();
    /// assert_eq!(inner, 150);
    /// ```
    pub fn read_message<T>(&mut self, decode: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let len = self.read_length()?;
        self.with_recursion(|r| {
            let start = r.position();
            let value = r.with_limit(len, decode)?;
            r.check_last_tag_was_end()?;
            if r.position() != start + u64::from(len.unsigned_abs()) {
                return Err(r.error(ErrorKind::TruncatedMessage));
            }
            Ok(value)
        })
    }

    /// Reads a group whose start-group tag was just returned by
    /// [`read_tag`](Self::read_tag).
    ///
    /// `decode` runs one nesting level deeper and must return once
    /// `read_tag` yields the group's end-group tag.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the last tag was not a start-group tag, or if
    /// `decode` returned while a regular field tag was pending.
    /// `TruncatedMessage` if the scope ended before the group closed.
    /// `MismatchedEndGroup` if it closed with a different field number.
    /// `RecursionLimitExceeded` if already at the depth limit.
    pub fn read_group<T>(&mut self, decode: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start_tag = self.last_tag;
        if wire::tag_wire_type(start_tag) != Some(WireType::StartGroup) {
            return Err(self.error(ErrorKind::InvalidState(
                "read_group called without a pending start-group tag",
            )));
        }
        self.with_recursion(|r| {
            let value = decode(r)?;
            let end_tag = r.last_tag;
            if end_tag == 0 {
                return Err(r.error(ErrorKind::TruncatedMessage));
            }
            if wire::tag_wire_type(end_tag) != Some(WireType::EndGroup) {
                return Err(r.error(ErrorKind::InvalidState(
                    "group decoder returned before its end-group tag",
                )));
            }
            r.check_group_end(start_tag, end_tag)?;
            Ok(value)
        })
    }
}

/// Turns a `string` field's bytes into text, or reports how many leading
/// bytes were valid.
fn decode_text(bytes: &[u8], mode: Utf8Mode) -> core::result::Result<String, usize> {
    match mode {
        Utf8Mode::Strict => bytes
            .to_str()
            .map(String::from)
            .map_err(|e| e.valid_up_to()),
        Utf8Mode::Lossy => Ok(bytes.to_str_lossy().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};

    use rstest::rstest;

    use crate::{CodedReader, ErrorKind, ReaderOptions, Utf8Mode};

    #[rstest]
    #[case::sint32_neg(&[0x03], -2)]
    #[case::sint32_pos(&[0x04], 2)]
    #[case::sint32_min(&[0xff, 0xff, 0xff, 0xff, 0x0f], i32::MIN)]
    fn sint32_values(#[case] bytes: &[u8], #[case] expected: i32) {
        let mut reader = CodedReader::from_slice(bytes);
        assert_eq!(reader.read_sint32().unwrap(), expected);
    }

    #[test]
    fn negative_int32_reads_from_ten_bytes() {
        let bytes = [0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_int32().unwrap(), -2);
        assert!(reader.is_at_end().unwrap());

        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_int64().unwrap(), -2);
        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_enum().unwrap(), -2);
    }

    #[test]
    fn fixed_width_scalars() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f64.to_le_bytes());
        bytes.extend_from_slice(&(-0.25f32).to_le_bytes());
        bytes.extend_from_slice(&(-7i32).to_le_bytes());
        bytes.extend_from_slice(&(-9i64).to_le_bytes());
        bytes.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());

        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_double().unwrap(), 1.5);
        assert_eq!(reader.read_float().unwrap(), -0.25);
        assert_eq!(reader.read_sfixed32().unwrap(), -7);
        assert_eq!(reader.read_sfixed64().unwrap(), -9);
        assert_eq!(reader.read_fixed32().unwrap(), 0xdead_beef);
        assert_eq!(reader.read_fixed64().unwrap(), u64::MAX);
        assert!(reader.is_at_end().unwrap());
    }

    #[test]
    fn bool_is_any_nonzero_varint() {
        let mut reader = CodedReader::from_slice(&[0x00, 0x01, 0x80, 0x01]);
        assert!(!reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
    }

    #[test]
    fn string_fast_and_split_paths() {
        let bytes = [0x05, b'h', b'e', b'l', b'l', b'o', 0x00];
        let mut flat = CodedReader::from_slice(&bytes);
        assert_eq!(flat.read_string().unwrap(), "hello");
        assert_eq!(flat.read_string().unwrap(), "");

        let mut split = CodedReader::from_segments(bytes.chunks(2));
        assert_eq!(split.read_string().unwrap(), "hello");
        assert_eq!(split.read_string().unwrap(), "");
    }

    #[test]
    fn strict_utf8_reports_offset() {
        let bytes = [0x03, b'a', 0xff, b'b'];
        let mut reader = CodedReader::from_slice(&bytes);
        let err = reader.read_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8 { valid_up_to: 1 });
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn lossy_utf8_replaces() {
        let options = ReaderOptions {
            utf8_mode: Utf8Mode::Lossy,
            ..ReaderOptions::default()
        };
        let bytes = [0x03, b'a', 0xff, b'b'];
        let mut reader = CodedReader::from_slice_with_options(&bytes, options);
        assert_eq!(reader.read_string().unwrap(), String::from("a\u{fffd}b"));
    }

    #[test]
    fn bytes_field_rejects_negative_length() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f];
        let mut reader = CodedReader::from_slice(&bytes);
        let err = reader.read_bytes().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NegativeSize);
    }

    #[test]
    fn message_must_consume_its_length() {
        // Declared length 3, callback reads only the first field and stops.
        let bytes = [0x03, 0x08, 0x01, 0x10];
        let mut reader = CodedReader::from_slice(&bytes);
        let err = reader
            .read_message(|r| {
                r.read_tag()?;
                r.read_uint32()
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnexpectedTrailingData);
        assert_eq!(reader.recursion_depth(), 0);
        assert_eq!(reader.bytes_until_limit(), None);
    }

    #[test]
    fn message_truncated_by_end_of_input() {
        let bytes = [0x05, 0x08, 0x01];
        let mut reader = CodedReader::from_segments(vec![&bytes[..2], &bytes[2..]]);
        let err = reader
            .read_message(|r| {
                while r.read_tag()? != 0 {
                    r.skip_last_field()?;
                }
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TruncatedMessage);
        assert_eq!(err.position(), 3);
    }

    /// Field 1 holds a one-byte message whose only byte is a tag, so the tag
    /// ends on the limit with no value after it.
    #[rstest]
    #[case::read_loop(false)]
    #[case::peek_loop(true)]
    fn tag_on_limit_fails_however_the_loop_is_driven(#[case] peek: bool) {
        let mut reader = CodedReader::from_slice(&[0x0a, 0x01, 0x08]);
        assert_eq!(reader.read_tag().unwrap(), 0x0a);
        let err = reader
            .read_message(|r| {
                if peek {
                    while r.peek_tag()? != 0 {
                        r.read_tag()?;
                        r.skip_last_field()?;
                    }
                } else {
                    while r.read_tag()? != 0 {
                        r.skip_last_field()?;
                    }
                }
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnexpectedTrailingData);
        assert_eq!(err.position(), 3);
    }

    #[test]
    fn repeated_field_loop_with_maybe_consume() {
        // Field 1 message: field 2 = 1, 2, 3 then field 3 = 9.
        let bytes = [0x0a, 0x08, 0x10, 0x01, 0x10, 0x02, 0x10, 0x03, 0x18, 0x09];
        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_tag().unwrap(), 0x0a);
        let (values, last) = reader
            .read_message(|r| {
                let mut values = Vec::new();
                let mut last = 0;
                loop {
                    match r.read_tag()? {
                        0 => return Ok((values, last)),
                        0x10 => loop {
                            values.push(r.read_uint32()?);
                            if !r.maybe_consume_tag(0x10)? {
                                break;
                            }
                        },
                        0x18 => last = r.read_uint32()?,
                        _ => r.skip_last_field()?,
                    }
                }
            })
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(last, 9);
        assert!(reader.is_at_end().unwrap());
    }

    #[test]
    fn message_with_peeked_end_is_accepted() {
        let bytes = [0x02, 0x08, 0x07, 0x10, 0x01];
        let mut reader = CodedReader::from_slice(&bytes);
        let value = reader
            .read_message(|r| {
                r.read_tag()?;
                let v = r.read_uint32()?;
                assert_eq!(r.peek_tag()?, 0);
                Ok(v)
            })
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(reader.read_tag().unwrap(), 16);
    }

    #[test]
    fn group_round_trip() {
        // Field 2 group { field 1 = 5 }, then field 3 = 1.
        let bytes = [0x13, 0x08, 0x05, 0x14, 0x18, 0x01];
        let mut reader = CodedReader::from_slice(&bytes);
        assert_eq!(reader.read_tag().unwrap(), 0x13);
        let inner = reader
            .read_group(|r| {
                let mut value = 0;
                loop {
                    match r.read_tag()? {
                        8 => value = r.read_uint32()?,
                        0x14 | 0 => return Ok(value),
                        _ => r.skip_last_field()?,
                    }
                }
            })
            .unwrap();
        assert_eq!(inner, 5);
        assert_eq!(reader.read_tag().unwrap(), 0x18);
    }

    #[test]
    fn group_without_start_tag_is_misuse() {
        let mut reader = CodedReader::from_slice(&[0x08, 0x01]);
        reader.read_tag().unwrap();
        let err = reader.read_group(|_| Ok(())).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidState(_)));
    }

    #[test]
    fn group_closed_by_other_field_is_mismatched() {
        let bytes = [0x13, 0x1c];
        let mut reader = CodedReader::from_slice(&bytes);
        reader.read_tag().unwrap();
        let err = reader
            .read_group(|r| {
                r.read_tag()?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::MismatchedEndGroup { start: 2, end: 3 }
        );
    }
}
