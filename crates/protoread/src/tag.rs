//! Tag lookahead and unknown-field skipping.
//!
//! `read_tag` returns 0 to mean "no more fields in this scope", either at the
//! end of input or at the active limit. Field number 0 is never a valid tag,
//! so the two cannot be confused.
//!
//! Skipping dispatches on the wire type of [`CodedReader::last_tag`]:
//!
//! | wire type        | action                                   |
//! |------------------|------------------------------------------|
//! | varint           | read and discard one varint              |
//! | fixed64, fixed32 | discard 8 or 4 bytes                     |
//! | length-delimited | read a length, discard that many bytes   |
//! | start-group      | skip to the matching end-group tag       |
//! | end-group        | `UnexpectedEndGroup`                     |
//! | 6, 7             | `InvalidWireType`                        |

use crate::{
    CodedReader, ErrorKind, Result,
    reader::PeekedTag,
    source::Source,
    wire::{self, WireType},
};

impl<S: Source> CodedReader<S> {
    /// Reads the next field tag, or returns 0 at the end of the current scope.
    ///
    /// A tag whose last byte lands exactly on the active limit also reports 0,
    /// since no value can follow it; [`last_tag`](Self::last_tag) still holds
    /// what was decoded, so the enclosing message fails its end-of-scope check.
    /// End-group tags are exempt: a group may legitimately close at the end of
    /// a length-delimited scope.
    ///
    /// # Errors
    ///
    /// `InvalidTag` if the decoded field number is 0; varint and refill errors
    /// otherwise.
    pub fn read_tag(&mut self) -> Result<u32> {
        if let Some(peeked) = self.next_tag.take() {
            self.last_tag = peeked.last_tag;
            return Ok(peeked.tag);
        }

        let window = self.window();
        let tag = if window.len() >= 2 {
            let (b0, b1) = (window[0], window[1]);
            if b0 < 0x80 {
                self.pos += 1;
                u32::from(b0)
            } else if b1 < 0x80 {
                self.pos += 2;
                u32::from(b0 & 0x7f) | (u32::from(b1) << 7)
            } else {
                self.read_raw_varint32()?
            }
        } else {
            if self.is_at_end()? {
                self.last_tag = 0;
                return Ok(0);
            }
            self.read_raw_varint32()?
        };

        self.last_tag = tag;
        if wire::tag_field_number(tag) == 0 {
            return Err(self.error(ErrorKind::InvalidTag(tag)));
        }
        if self.reached_limit() && wire::tag_wire_type(tag) != Some(WireType::EndGroup) {
            return Ok(0);
        }
        Ok(tag)
    }

    /// Returns the next tag without consuming it.
    ///
    /// The tag is cached, so a following [`read_tag`](Self::read_tag) returns
    /// it without decoding again and leaves the same
    /// [`last_tag`](Self::last_tag) it would have. Until then `last_tag` is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// As [`read_tag`](Self::read_tag).
    pub fn peek_tag(&mut self) -> Result<u32> {
        if let Some(peeked) = self.next_tag {
            return Ok(peeked.tag);
        }
        let previous = self.last_tag;
        let tag = self.read_tag()?;
        self.next_tag = Some(PeekedTag {
            tag,
            last_tag: self.last_tag,
        });
        self.last_tag = previous;
        Ok(tag)
    }

    /// Consumes the next tag if it equals `expected`.
    ///
    /// # Errors
    ///
    /// As [`read_tag`](Self::read_tag).
    pub fn maybe_consume_tag(&mut self, expected: u32) -> Result<bool> {
        if self.peek_tag()? != expected {
            return Ok(false);
        }
        self.read_tag()?;
        Ok(true)
    }

    /// Consumes a peeked end of scope, leaving `last_tag` as `read_tag`
    /// would have. Called when the scope is closed.
    pub(crate) fn take_peeked_end(&mut self) {
        if let Some(peeked) = self.next_tag.filter(|p| p.tag == 0) {
            self.next_tag = None;
            self.last_tag = peeked.last_tag;
        }
    }

    /// Verifies that the last [`read_tag`](Self::read_tag) reported the end
    /// of the scope.
    ///
    /// # Errors
    ///
    /// `UnexpectedTrailingData` if the last tag was a real field.
    pub fn check_last_tag_was_end(&self) -> Result<()> {
        if self.last_tag == 0 {
            Ok(())
        } else {
            Err(self.error(ErrorKind::UnexpectedTrailingData))
        }
    }

    /// Skips the value of the field whose tag was just read.
    ///
    /// # Errors
    ///
    /// `InvalidState` if no field tag is pending, `UnexpectedEndGroup` for an
    /// end-group tag, `InvalidWireType` for wire types 6 and 7, or any error
    /// from reading the skipped value.
    pub fn skip_last_field(&mut self) -> Result<()> {
        let tag = self.last_tag;
        if tag == 0 {
            return Err(self.error(ErrorKind::InvalidState(
                "skip_last_field called at the end of a scope",
            )));
        }
        match wire::tag_wire_type(tag) {
            Some(WireType::Varint) => self.read_raw_varint64().map(drop),
            Some(WireType::Fixed64) => self.read_raw_little_endian64().map(drop),
            Some(WireType::Fixed32) => self.read_raw_little_endian32().map(drop),
            Some(WireType::LengthDelimited) => {
                let len = self.read_length()?;
                self.skip_raw_bytes(len)
            }
            Some(WireType::StartGroup) => self.skip_group(tag),
            Some(WireType::EndGroup) => Err(self.error(ErrorKind::UnexpectedEndGroup {
                field_number: wire::tag_field_number(tag),
            })),
            None => Err(self.error(ErrorKind::InvalidWireType(wire::tag_wire_bits(tag)))),
        }
    }

    /// Skips the body of a group opened by `start_tag`, up to and including
    /// its end-group tag.
    ///
    /// # Errors
    ///
    /// `RecursionLimitExceeded` when nested too deeply, `TruncatedMessage` if
    /// the scope ends before the group closes, `MismatchedEndGroup` if it
    /// closes with a different field number.
    pub fn skip_group(&mut self, start_tag: u32) -> Result<()> {
        self.with_recursion(|r| {
            let end_tag = loop {
                let tag = r.read_tag()?;
                if tag == 0 {
                    return Err(r.error(ErrorKind::TruncatedMessage));
                }
                if wire::tag_wire_type(tag) == Some(WireType::EndGroup) {
                    break tag;
                }
                r.skip_last_field()?;
            };
            r.check_group_end(start_tag, end_tag)
        })
    }

    pub(crate) fn check_group_end(&self, start_tag: u32, end_tag: u32) -> Result<()> {
        let start = wire::tag_field_number(start_tag);
        let end = wire::tag_field_number(end_tag);
        if start == end {
            Ok(())
        } else {
            Err(self.error(ErrorKind::MismatchedEndGroup { start, end }))
        }
    }
}
