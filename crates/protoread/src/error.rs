use thiserror::Error;

/// A decode failure together with the absolute stream position at which it
/// was detected.
///
/// Every error aborts the decode in progress. The cursor's position after a
/// failure is reported here but the reader itself should be discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {position}")]
pub struct DecodeError {
    pub(crate) kind: ErrorKind,
    pub(crate) position: u64,
}

impl DecodeError {
    pub(crate) fn new(kind: ErrorKind, position: u64) -> Self {
        Self { kind, position }
    }

    /// The kind of failure.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Absolute number of bytes consumed from the source when the error was
    /// raised.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }
}

/// The reasons a decode can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A varint ran past its maximum encoded length without terminating.
    #[error("malformed varint")]
    MalformedVarint,
    /// A tag carried field number zero.
    #[error("invalid tag {0:#x}: field number zero")]
    InvalidTag(u32),
    /// A tag carried one of the unassigned wire types 6 or 7.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// A length prefix decoded to a negative count.
    #[error("negative size")]
    NegativeSize,
    /// Input ended, or a limit was hit, in the middle of a value.
    #[error("truncated message")]
    TruncatedMessage,
    /// Nested messages or groups exceeded the configured depth.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
    /// More bytes were pulled from the source than the configured ceiling.
    #[error("size limit exceeded")]
    SizeLimitExceeded,
    /// An end-group tag appeared outside of any group.
    #[error("unexpected end-group tag for field {field_number}")]
    UnexpectedEndGroup {
        /// Field number carried by the stray end-group tag.
        field_number: u32,
    },
    /// An end-group tag did not match the innermost open group.
    #[error("mismatched end-group tag: started with field {start}, ended with field {end}")]
    MismatchedEndGroup {
        /// Field number of the start-group tag.
        start: u32,
        /// Field number of the end-group tag.
        end: u32,
    },
    /// A nested message decoder returned before reading its end of scope.
    #[error("unexpected trailing data in nested message")]
    UnexpectedTrailingData,
    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in string field after {valid_up_to} bytes")]
    InvalidUtf8 {
        /// Length of the longest valid prefix.
        valid_up_to: usize,
    },
    /// The reader was driven in a way its contract does not allow.
    #[error("invalid reader state: {0}")]
    InvalidState(&'static str),
    /// The underlying stream failed.
    #[cfg(feature = "std")]
    #[error("i/o error: {0}")]
    Io(std::io::ErrorKind),
}

/// Result type used throughout the crate.
pub type Result<T, E = DecodeError> = core::result::Result<T, E>;
