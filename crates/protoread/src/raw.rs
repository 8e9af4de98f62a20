//! Primitive reads on the cursor.
//!
//! Each read first tries the window: if it holds enough bytes for the widest
//! encoding, the pure decoders in [`primitives`](crate::primitives) run
//! directly on it. Otherwise the read goes byte by byte through
//! `read_raw_byte`, which refills as needed.

use alloc::vec::Vec;

use crate::{
    CodedReader, ErrorKind, Result,
    primitives::{self, MAX_VARINT_LEN, MAX_VARINT32_LEN},
    reader::NO_LIMIT,
    source::Source,
};

impl<S: Source> CodedReader<S> {
    #[inline]
    pub(crate) fn read_raw_byte(&mut self) -> Result<u8> {
        if self.pos == self.size {
            self.refill(true)?;
        }
        let byte = self.source.chunk()[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn checked_len(&self, len: i32) -> Result<usize> {
        usize::try_from(len).map_err(|_| self.error(ErrorKind::NegativeSize))
    }

    /// Reads a varint, keeping only its low 32 bits.
    ///
    /// # Errors
    ///
    /// `MalformedVarint` after ten bytes without a terminator,
    /// `TruncatedMessage` if the scope ends first.
    #[inline]
    pub fn read_raw_varint32(&mut self) -> Result<u32> {
        let window = self.window();
        if let Some(&b) = window.first() {
            if b < 0x80 {
                self.pos += 1;
                return Ok(u32::from(b));
            }
        }
        if window.len() >= MAX_VARINT_LEN {
            return match primitives::decode_varint32(window) {
                Ok((value, len)) => {
                    self.pos += len;
                    Ok(value)
                }
                Err(kind) => self.fail_varint(kind),
            };
        }
        self.read_raw_varint32_slow()
    }

    /// Reports the same position as the byte-at-a-time path.
    #[cold]
    fn fail_varint<T>(&mut self, kind: ErrorKind) -> Result<T> {
        self.pos += MAX_VARINT_LEN;
        Err(self.error(kind))
    }

    fn read_raw_varint32_slow(&mut self) -> Result<u32> {
        let mut result = 0u32;
        for i in 0..MAX_VARINT_LEN {
            let b = self.read_raw_byte()?;
            if i < MAX_VARINT32_LEN {
                result |= u32::from(b & 0x7f) << (7 * i);
            }
            if b < 0x80 {
                return Ok(result);
            }
        }
        Err(self.error(ErrorKind::MalformedVarint))
    }

    /// Reads a varint of up to 64 bits.
    ///
    /// # Errors
    ///
    /// As [`read_raw_varint32`](Self::read_raw_varint32).
    #[inline]
    pub fn read_raw_varint64(&mut self) -> Result<u64> {
        let window = self.window();
        if window.len() >= MAX_VARINT_LEN {
            return match primitives::decode_varint64(window) {
                Ok((value, len)) => {
                    self.pos += len;
                    Ok(value)
                }
                Err(kind) => self.fail_varint(kind),
            };
        }
        self.read_raw_varint64_slow()
    }

    fn read_raw_varint64_slow(&mut self) -> Result<u64> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let b = self.read_raw_byte()?;
            result |= u64::from(b & 0x7f) << (7 * i);
            if b < 0x80 {
                return Ok(result);
            }
        }
        Err(self.error(ErrorKind::MalformedVarint))
    }

    /// Reads four little-endian bytes.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if the scope ends first.
    #[inline]
    pub fn read_raw_little_endian32(&mut self) -> Result<u32> {
        if let Some(value) = primitives::decode_fixed32(self.window()) {
            self.pos += 4;
            return Ok(value);
        }
        let mut buf = [0u8; 4];
        self.read_raw_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads eight little-endian bytes.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if the scope ends first.
    #[inline]
    pub fn read_raw_little_endian64(&mut self) -> Result<u64> {
        if let Some(value) = primitives::decode_fixed64(self.window()) {
            self.pos += 8;
            return Ok(value);
        }
        let mut buf = [0u8; 8];
        self.read_raw_into(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_raw_into(&mut self, mut out: &mut [u8]) -> Result<()> {
        while !out.is_empty() {
            if self.pos == self.size {
                self.refill(true)?;
            }
            let window = self.window();
            let n = window.len().min(out.len());
            let (head, tail) = core::mem::take(&mut out).split_at_mut(n);
            head.copy_from_slice(&window[..n]);
            self.pos += n;
            out = tail;
        }
        Ok(())
    }

    /// Reads exactly `len` bytes into a new buffer.
    ///
    /// Values that fit in the window are copied in one go. Longer ones are
    /// accumulated as they arrive, starting from a capacity of at most
    /// `buffer_size`, so a forged length cannot force a large allocation.
    ///
    /// # Errors
    ///
    /// `NegativeSize` if `len < 0`. `TruncatedMessage` if the scope or input
    /// ends first; when the active limit is the cause, the reader is left at
    /// the limit.
    pub fn read_raw_bytes(&mut self, len: i32) -> Result<Vec<u8>> {
        let len = self.checked_len(len)?;
        if let Some(bytes) = self.window().get(..len) {
            let out = bytes.to_vec();
            self.pos += len;
            return Ok(out);
        }
        self.check_fits_limit(len)?;

        let mut out = Vec::with_capacity(len.min(self.options.buffer_size));
        let mut remaining = len;
        while remaining > 0 {
            if self.pos == self.size {
                self.refill(true)?;
            }
            let window = self.window();
            let n = window.len().min(remaining);
            out.extend_from_slice(&window[..n]);
            self.pos += n;
            remaining -= n;
        }
        Ok(out)
    }

    /// Discards exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// As [`read_raw_bytes`](Self::read_raw_bytes).
    pub fn skip_raw_bytes(&mut self, len: i32) -> Result<()> {
        let len = self.checked_len(len)?;
        if len <= self.size - self.pos {
            self.pos += len;
            return Ok(());
        }
        self.check_fits_limit(len)?;
        self.skip_raw(len as u64)
    }

    /// Fails with `TruncatedMessage` if `len` bytes would cross the active
    /// limit, after first advancing to that limit.
    fn check_fits_limit(&mut self, len: usize) -> Result<()> {
        if self.limit == NO_LIMIT || self.position() + len as u64 <= self.limit {
            return Ok(());
        }
        let remaining = self.limit - self.position();
        self.skip_raw(remaining)?;
        Err(self.error(ErrorKind::TruncatedMessage))
    }

    fn skip_raw(&mut self, mut remaining: u64) -> Result<()> {
        while remaining > 0 {
            if self.pos == self.size {
                self.refill(true)?;
            }
            let available = self.size - self.pos;
            let n = usize::try_from(remaining).map_or(available, |r| r.min(available));
            self.pos += n;
            remaining -= n as u64;
        }
        Ok(())
    }
}
