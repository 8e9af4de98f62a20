//! Cursor state: the window, absolute position accounting and refill.
//!
//! Overview
//! - The reader decodes from a window `source.chunk()[pos..size]`. `pos` is
//!   the next unread byte, `size` the end of the bytes the current scope may
//!   see.
//! - `retired` counts bytes that lay before the start of the current chunk,
//!   so the absolute stream position is `retired + pos`.
//! - `limit` is the absolute end of the innermost length-delimited scope, or
//!   [`NO_LIMIT`] at the top level. Bytes of the chunk that lie past it are
//!   held back as `spillover` and excluded from `size`; they reappear when the
//!   limit is popped.
//!
//! Refill
//! - Only called once the window is fully consumed. If the window ends exactly
//!   on the active limit, the scope is finished: a non-mandatory refill
//!   reports `false`, a mandatory one fails with `TruncatedMessage`.
//! - Otherwise the chunk is retired and the source asked for the next one.
//!   Refillable sources are then checked against the size limit.
//!
//! Invariants
//! - `pos <= size` and `size + spillover <= chunk().len()`.
//! - `retired + size <= limit`.

use alloc::sync::Arc;
use core::{any::Any, fmt, ops::Range};

use crate::{
    DecodeError, ErrorKind, ReaderOptions, Result,
    source::{SegmentSource, SliceSource, Source},
};

/// Sentinel limit meaning "not inside any length-delimited scope".
pub(crate) const NO_LIMIT: u64 = u64::MAX;

/// Opaque handle to an extension registry, passed through to generated
/// decoders untouched.
pub type ExtensionRegistry = Arc<dyn Any + Send + Sync>;

/// A tag decoded ahead of time by [`CodedReader::peek_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PeekedTag {
    /// What the next `read_tag` returns.
    pub(crate) tag: u32,
    /// What it leaves in `last_tag`. Differs from `tag` only when a tag
    /// ended exactly on the limit.
    pub(crate) last_tag: u32,
}

/// A streaming decoder for the protocol buffer wire format.
///
/// One reader drives one top-level parse. Generated message decoders call its
/// `read_*` methods for each field and hand it back to the engine for nested
/// messages via [`read_message`](Self::read_message) and
/// [`read_group`](Self::read_group).
///
/// The reader is generic over where its bytes come from; see
/// [`source`](crate::source). It is not meant to be shared: independent
/// parses each use their own reader.
///
/// # Examples
///
/// ```rust
/// use protoread::CodedReader;
///
/// let mut reader = CodedReader::from_slice(&[0x08, 0x96, 0x01]);
/// assert_eq!(reader.read_tag().unwrap(), 8);
/// assert_eq!(reader.read_int32().unwrap(), 150);
/// assert_eq!(reader.read_tag().unwrap(), 0);
/// ```
pub struct CodedReader<S> {
    pub(crate) source: S,
    pub(crate) pos: usize,
    pub(crate) size: usize,
    pub(crate) spillover: usize,
    pub(crate) retired: u64,
    pub(crate) limit: u64,
    pub(crate) depth: u32,
    pub(crate) last_tag: u32,
    pub(crate) next_tag: Option<PeekedTag>,
    pub(crate) options: ReaderOptions,
    extensions: Option<ExtensionRegistry>,
}

impl<'a> CodedReader<SliceSource<'a>> {
    /// Reads from a single in-memory buffer with default options.
    #[must_use]
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(SliceSource::new(bytes), ReaderOptions::default())
    }

    /// Reads from a single in-memory buffer.
    #[must_use]
    pub fn from_slice_with_options(bytes: &'a [u8], options: ReaderOptions) -> Self {
        Self::new(SliceSource::new(bytes), options)
    }

    /// Reads `bytes[range]`. Positions are reported relative to the start of
    /// `bytes`, so the reader starts at `range.start`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds or decreasing.
    #[must_use]
    pub fn from_slice_range(bytes: &'a [u8], range: Range<usize>, options: ReaderOptions) -> Self {
        assert!(
            range.start <= range.end,
            "slice range starts at {} but ends at {}",
            range.start,
            range.end
        );
        let mut reader = Self::new(SliceSource::new(&bytes[..range.end]), options);
        reader.pos = range.start;
        reader
    }
}

impl<I> CodedReader<SegmentSource<I>>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    /// Reads from a sequence of non-contiguous segments with default options.
    pub fn from_segments<T>(segments: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self::new(SegmentSource::new(segments), ReaderOptions::default())
    }

    /// Reads from a sequence of non-contiguous segments.
    pub fn from_segments_with_options<T>(segments: T, options: ReaderOptions) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self::new(SegmentSource::new(segments), options)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> CodedReader<crate::source::StreamSource<R>> {
    /// Reads from a stream through a scratch buffer of the default size.
    #[must_use]
    pub fn from_reader(input: R) -> Self {
        Self::from_reader_with_options(input, ReaderOptions::default())
    }

    /// Reads from a stream through a scratch buffer of
    /// `options.buffer_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `options.buffer_size` is zero.
    #[must_use]
    pub fn from_reader_with_options(input: R, options: ReaderOptions) -> Self {
        Self::new(
            crate::source::StreamSource::with_capacity(input, options.buffer_size),
            options,
        )
    }
}

impl<S: Source> CodedReader<S> {
    /// Starts reading at the beginning of `source`'s current chunk.
    pub fn new(source: S, options: ReaderOptions) -> Self {
        let size = source.chunk().len();
        Self {
            source,
            pos: 0,
            size,
            spillover: 0,
            retired: 0,
            limit: NO_LIMIT,
            depth: 0,
            last_tag: 0,
            next_tag: None,
            options,
            extensions: None,
        }
    }

    /// Attaches an extension registry for generated decoders to look up.
    #[must_use]
    pub fn with_extension_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.extensions = Some(registry);
        self
    }

    /// The extension registry supplied at construction, if any.
    #[must_use]
    pub fn extension_registry(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.extensions.as_deref()
    }

    /// Options this reader was built with.
    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Whether generated decoders should drop unknown fields.
    #[must_use]
    pub fn discard_unknown_fields(&self) -> bool {
        self.options.discard_unknown_fields
    }

    /// Absolute number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.retired + self.pos as u64
    }

    /// The tag most recently returned by [`read_tag`](Self::read_tag), or 0
    /// at the end of a scope.
    #[must_use]
    pub fn last_tag(&self) -> u32 {
        self.last_tag
    }

    /// Current nesting depth of messages and groups.
    #[must_use]
    pub fn recursion_depth(&self) -> u32 {
        self.depth
    }

    /// Consumes the reader and returns its source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Whether the current scope has no more bytes: the window is exhausted
    /// and either the active limit or the end of input has been reached.
    ///
    /// # Errors
    ///
    /// Fails if refilling the window fails.
    pub fn is_at_end(&mut self) -> Result<bool> {
        if let Some(peeked) = self.next_tag {
            return Ok(peeked.tag == 0);
        }
        Ok(self.pos == self.size && !self.refill(false)?)
    }

    /// Unread bytes of the current window that the active scope may see.
    #[inline]
    pub(crate) fn window(&self) -> &[u8] {
        &self.source.chunk()[self.pos..self.size]
    }

    #[cold]
    pub(crate) fn error(&self, kind: ErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position())
    }

    /// Loads the next chunk once the window is exhausted.
    ///
    /// Returns `false` at a clean end of scope or end of input; with
    /// `must_succeed` those cases are `TruncatedMessage` instead.
    pub(crate) fn refill(&mut self, must_succeed: bool) -> Result<bool> {
        if self.pos < self.size {
            return Err(self.error(ErrorKind::InvalidState(
                "refill requested with unread bytes in the window",
            )));
        }

        if self.retired + self.size as u64 == self.limit {
            return self.exhausted(must_succeed);
        }

        self.retired += self.size as u64;
        self.pos = 0;
        self.size = 0;
        self.spillover = 0;

        let more = self.source.advance().map_err(|kind| self.error(kind))?;
        if !more {
            return self.exhausted(must_succeed);
        }

        self.size = self.source.chunk().len();
        self.recompute_spillover();

        if !S::PRELOADED {
            let total = self.retired + (self.size + self.spillover) as u64;
            if total > self.options.size_limit {
                return Err(self.error(ErrorKind::SizeLimitExceeded));
            }
        }
        Ok(true)
    }

    fn exhausted(&self, must_succeed: bool) -> Result<bool> {
        if must_succeed {
            Err(self.error(ErrorKind::TruncatedMessage))
        } else {
            Ok(false)
        }
    }

    /// Re-splits the chunk into visible bytes and spillover after the limit
    /// moves.
    pub(crate) fn recompute_spillover(&mut self) {
        self.size += self.spillover;
        let end = self.retired + self.size as u64;
        if end > self.limit {
            #[allow(clippy::cast_possible_truncation)]
            let over = (end - self.limit) as usize;
            self.spillover = over;
            self.size -= over;
        } else {
            self.spillover = 0;
        }
        self.debug_check_invariants();
    }

    #[inline]
    pub(crate) fn debug_check_invariants(&self) {
        debug_assert!(self.pos <= self.size, "pos {} > size {}", self.pos, self.size);
        debug_assert!(
            self.size + self.spillover <= self.source.chunk().len(),
            "window overruns chunk"
        );
        debug_assert!(
            self.retired + self.size as u64 <= self.limit,
            "window extends past limit"
        );
    }
}

impl<S> fmt::Debug for CodedReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let limit = (self.limit != NO_LIMIT).then_some(self.limit);
        f.debug_struct("CodedReader")
            .field("position", &(self.retired + self.pos as u64))
            .field("window", &(self.size - self.pos))
            .field("spillover", &self.spillover)
            .field("limit", &limit)
            .field("depth", &self.depth)
            .field("last_tag", &self.last_tag)
            .field("next_tag", &self.next_tag.map(|p| p.tag))
            .finish_non_exhaustive()
    }
}
