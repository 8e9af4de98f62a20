/// Default ceiling on nested message and group depth.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Default ceiling on bytes pulled from a refillable source.
#[allow(clippy::cast_sign_loss)]
pub const DEFAULT_SIZE_LIMIT: u64 = i32::MAX as u64;

/// Default size of the scratch buffer a stream source reads into.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// How `string` fields that are not valid UTF-8 are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Utf8Mode {
    /// Reject the field with [`ErrorKind::InvalidUtf8`].
    ///
    /// [`ErrorKind::InvalidUtf8`]: crate::ErrorKind::InvalidUtf8
    #[default]
    Strict,
    /// Replace each invalid sequence with U+FFFD.
    Lossy,
}

/// Configuration for a [`CodedReader`](crate::CodedReader).
///
/// Options are fixed when the reader is constructed and apply to the whole
/// top-level parse.
///
/// # Examples
///
/// ```rust
/// use protoread::{CodedReader, ReaderOptions};
///
/// let options = ReaderOptions {
///     recursion_limit: 16,
///     ..Default::default()
/// };
/// let mut reader = CodedReader::from_slice_with_options(&[0x08, 0x96, 0x01], options);
/// assert_eq!(reader.read_tag().unwrap(), 8);
/// assert_eq!(reader.read_uint32().unwrap(), 150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    /// Maximum depth of nested messages and groups.
    ///
    /// A message nested exactly `recursion_limit` levels deep decodes; one
    /// more level fails with `RecursionLimitExceeded`.
    ///
    /// # Default
    ///
    /// `100`
    pub recursion_limit: u32,

    /// Ceiling on the total number of bytes pulled from a refillable source
    /// (a stream or a segment sequence).
    ///
    /// This guards against unbounded input and is independent of message
    /// framing. A single flat buffer is never subject to it.
    ///
    /// # Default
    ///
    /// `i32::MAX`
    pub size_limit: u64,

    /// Whether generated decoders should drop unknown fields instead of
    /// retaining them. The reader only carries the flag.
    ///
    /// # Default
    ///
    /// `false`
    pub discard_unknown_fields: bool,

    /// Size of the scratch buffer used by the stream source.
    ///
    /// Length-delimited values at least this large are read in chunks of this
    /// size rather than allocated up front.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_size: usize,

    /// Handling of invalid UTF-8 in `string` fields.
    ///
    /// # Default
    ///
    /// [`Utf8Mode::Strict`]
    pub utf8_mode: Utf8Mode,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            discard_unknown_fields: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            utf8_mode: Utf8Mode::Strict,
        }
    }
}

impl ReaderOptions {
    /// Default options with the two resource ceilings replaced.
    #[must_use]
    pub fn with_limits(size_limit: u64, recursion_limit: u32) -> Self {
        Self {
            size_limit,
            recursion_limit,
            ..Self::default()
        }
    }
}
