//! Buffer sources: where the reader's window of bytes comes from.
//!
//! A source owns (or borrows) the chunk of bytes the reader currently decodes
//! from and knows how to replace it with the next one. There are three:
//!
//! - [`SliceSource`]: one contiguous buffer, supplied up front. It is never
//!   refilled; running out of it is end of input.
//! - [`SegmentSource`]: an iterator over independently owned segments. Each
//!   refill moves to the next non-empty segment; empty segments are skipped.
//! - [`StreamSource`] (feature `std`): a `Read` paired with one reusable
//!   scratch buffer. Each refill performs one read call.
//!
//! The reader is generic over the source, so the flat case compiles to
//! direct slice indexing and only the refill path differs per source.
//!
//! Invariants
//! - `chunk()` is stable between calls to `advance()`.
//! - After `advance()` returns `Ok(true)`, `chunk()` is non-empty.
//! - Sources never copy bytes; the reader copies only when a value spans a
//!   refill.

use core::fmt;

/// A backing store that hands out one chunk of bytes at a time.
pub trait Source {
    /// The chunk currently loaded.
    fn chunk(&self) -> &[u8];

    /// Drops the current chunk and loads the next non-empty one.
    ///
    /// Returns `Ok(false)` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Only stream sources fail, with the underlying I/O error kind.
    fn advance(&mut self) -> Result<bool, crate::ErrorKind>;

    /// Whether every byte was supplied before decoding began. The size limit
    /// is not applied to preloaded sources.
    const PRELOADED: bool;
}

/// A single contiguous buffer.
#[derive(Clone, Copy)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
}

impl<'a> SliceSource<'a> {
    /// Wraps `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn chunk(&self) -> &[u8] {
        self.bytes
    }

    fn advance(&mut self) -> Result<bool, crate::ErrorKind> {
        Ok(false)
    }

    const PRELOADED: bool = true;
}

impl fmt::Debug for SliceSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceSource")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A sequence of non-contiguous segments.
///
/// Segments may be borrowed (`&[u8]`) or owned (`Vec<u8>`, `Box<[u8]>`, ...);
/// the current one is held until the reader moves past it.
pub struct SegmentSource<I: Iterator> {
    segments: I,
    current: Option<I::Item>,
}

impl<I> SegmentSource<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    /// Wraps an iterator of segments. No segment is pulled until the reader
    /// first needs bytes.
    pub fn new<T>(segments: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            segments: segments.into_iter(),
            current: None,
        }
    }
}

impl<I> Source for SegmentSource<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    #[inline]
    fn chunk(&self) -> &[u8] {
        self.current.as_ref().map_or(&[][..], |s| s.as_ref())
    }

    fn advance(&mut self) -> Result<bool, crate::ErrorKind> {
        for segment in self.segments.by_ref() {
            if !segment.as_ref().is_empty() {
                self.current = Some(segment);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    const PRELOADED: bool = false;
}

impl<I: Iterator> fmt::Debug for SegmentSource<I>
where
    I::Item: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentSource")
            .field(
                "current_len",
                &self.current.as_ref().map(|s| s.as_ref().len()),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "std")]
pub use stream::StreamSource;

#[cfg(feature = "std")]
mod stream {
    use alloc::{boxed::Box, vec};
    use core::fmt;
    use std::io::{self, Read};

    use super::Source;
    use crate::ErrorKind;

    /// A pull-stream read into one reusable scratch buffer.
    pub struct StreamSource<R> {
        input: R,
        buffer: Box<[u8]>,
        filled: usize,
    }

    impl<R: Read> StreamSource<R> {
        /// Wraps `input` with a scratch buffer of `capacity` bytes.
        ///
        /// # Panics
        ///
        /// Panics if `capacity` is zero.
        #[must_use]
        pub fn with_capacity(input: R, capacity: usize) -> Self {
            assert!(capacity > 0, "stream buffer capacity must be non-zero");
            Self {
                input,
                buffer: vec![0u8; capacity].into_boxed_slice(),
                filled: 0,
            }
        }

        /// Returns the wrapped stream. Bytes already read into the scratch
        /// buffer are lost.
        pub fn into_inner(self) -> R {
            self.input
        }
    }

    impl<R: Read> Source for StreamSource<R> {
        #[inline]
        fn chunk(&self) -> &[u8] {
            &self.buffer[..self.filled]
        }

        fn advance(&mut self) -> Result<bool, ErrorKind> {
            self.filled = 0;
            loop {
                match self.input.read(&mut self.buffer) {
                    Ok(n) => {
                        self.filled = n;
                        return Ok(n > 0);
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(ErrorKind::Io(e.kind())),
                }
            }
        }

        const PRELOADED: bool = false;
    }

    impl<R> fmt::Debug for StreamSource<R> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("StreamSource")
                .field("capacity", &self.buffer.len())
                .field("filled", &self.filled)
                .finish_non_exhaustive()
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::*;

    #[test]
    fn slice_source_never_refills() {
        let mut source = SliceSource::new(b"abc");
        assert_eq!(source.chunk(), b"abc");
        assert_eq!(source.advance(), Ok(false));
        assert_eq!(source.chunk(), b"abc");
    }

    #[test]
    fn segment_source_skips_empty_segments() {
        let segments: Vec<&[u8]> = vec![b"", b"ab", b"", b"", b"c", b""];
        let mut source = SegmentSource::new(segments);
        assert_eq!(source.chunk(), b"");
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), b"ab");
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), b"c");
        assert_eq!(source.advance(), Ok(false));
        assert_eq!(source.chunk(), b"");
    }

    #[test]
    fn segment_source_accepts_owned_segments() {
        let mut source = SegmentSource::new(vec![vec![1u8, 2], vec![3]]);
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), &[1, 2]);
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), &[3]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn stream_source_reads_once_per_advance() {
        let data: &[u8] = &[1, 2, 3, 4, 5];
        let mut source = StreamSource::with_capacity(data, 2);
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), &[1, 2]);
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), &[3, 4]);
        assert_eq!(source.advance(), Ok(true));
        assert_eq!(source.chunk(), &[5]);
        assert_eq!(source.advance(), Ok(false));
        assert!(source.chunk().is_empty());
    }
}
