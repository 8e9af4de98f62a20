//! Nested byte limits and recursion depth.
//!
//! A limit is the absolute position at which the innermost length-delimited
//! scope ends. Pushing one returns the enclosing limit as a [`PreviousLimit`]
//! token that must be handed back to [`CodedReader::pop_limit`]. The scoped
//! helpers [`CodedReader::with_limit`] and [`CodedReader::with_recursion`] do
//! the pairing themselves and restore state whether the body succeeds or
//! fails.

use crate::{CodedReader, ErrorKind, Result, reader::NO_LIMIT, source::Source};

/// The limit that was active before a [`CodedReader::push_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pushed limit must be restored with `pop_limit`"]
pub struct PreviousLimit(u64);

impl<S: Source> CodedReader<S> {
    /// Opens a scope covering the next `byte_limit` bytes.
    ///
    /// Bytes already buffered past the new end are hidden until the returned
    /// token is passed to [`pop_limit`](Self::pop_limit).
    ///
    /// # Errors
    ///
    /// `NegativeSize` if `byte_limit < 0`; `TruncatedMessage` if the scope
    /// would extend past the enclosing one.
    pub fn push_limit(&mut self, byte_limit: i32) -> Result<PreviousLimit> {
        let Ok(len) = u64::try_from(byte_limit) else {
            return Err(self.error(ErrorKind::NegativeSize));
        };
        let new_limit = self.position() + len;
        if new_limit > self.limit {
            return Err(self.error(ErrorKind::TruncatedMessage));
        }
        let previous = core::mem::replace(&mut self.limit, new_limit);
        self.recompute_spillover();
        Ok(PreviousLimit(previous))
    }

    /// Restores the limit that was active before the matching push.
    ///
    /// An end of scope that was peeked but not read belongs to the closed
    /// scope and is consumed here.
    pub fn pop_limit(&mut self, previous: PreviousLimit) {
        self.take_peeked_end();
        self.limit = previous.0;
        self.recompute_spillover();
    }

    /// Runs `f` inside a scope of `byte_limit` bytes, restoring the enclosing
    /// limit afterwards on every path.
    ///
    /// # Errors
    ///
    /// As [`push_limit`](Self::push_limit), or whatever `f` returns.
    pub fn with_limit<T>(
        &mut self,
        byte_limit: i32,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.push_limit(byte_limit)?;
        let result = f(self);
        self.pop_limit(previous);
        result
    }

    /// Runs `f` one nesting level deeper.
    ///
    /// # Errors
    ///
    /// `RecursionLimitExceeded` if the reader is already at the configured
    /// depth, before `f` runs.
    pub fn with_recursion<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.options.recursion_limit {
            return Err(self.error(ErrorKind::RecursionLimitExceeded));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Whether the position has reached the active limit. Always `false` at
    /// the top level.
    #[must_use]
    pub fn reached_limit(&self) -> bool {
        self.limit != NO_LIMIT && self.position() >= self.limit
    }

    /// Bytes left in the active scope, or `None` at the top level.
    #[must_use]
    pub fn bytes_until_limit(&self) -> Option<u64> {
        (self.limit != NO_LIMIT).then(|| self.limit.saturating_sub(self.position()))
    }
}
