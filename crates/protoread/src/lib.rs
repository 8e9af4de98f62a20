//! A streaming decoder for the protocol buffer wire format.
//!
//! [`CodedReader`] walks an encoded message one field at a time. It reads from
//! a flat buffer, a sequence of non-contiguous segments, or (with the `std`
//! feature) any [`std::io::Read`], and enforces nesting depth and input size
//! limits along the way. It does not know about schemas: generated code loops
//! over [`CodedReader::read_tag`] and calls the matching `read_*` method for
//! each field, handing nested messages back through
//! [`CodedReader::read_message`].
//!
//! ```rust
//! use protoread::{CodedReader, Result, source::Source};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     id: i32,
//! }
//!
//! fn decode_person<S: Source>(r: &mut CodedReader<S>) -> Result<Person> {
//!     let mut person = Person::default();
//!     loop {
//!         match r.read_tag()? {
//!             0 => return Ok(person),
//!             0x0a => person.name = r.read_string()?,
//!             0x10 => person.id = r.read_int32()?,
//!             _ => r.skip_last_field()?,
//!         }
//!     }
//! }
//!
//! let bytes = [0x0a, 0x03, b'a', b'd', b'a', 0x10, 0x07];
//! let person = decode_person(&mut CodedReader::from_slice(&bytes)).unwrap();
//! assert_eq!(person, Person { name: "ada".into(), id: 7 });
//!
//! // The same bytes split at arbitrary points decode identically.
//! let mut reader = CodedReader::from_segments(bytes.chunks(2));
//! assert_eq!(decode_person(&mut reader).unwrap(), person);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod limits;
mod options;
mod raw;
mod read;
mod reader;
mod tag;
mod wrappers;

pub mod primitives;
pub mod source;
pub mod wire;

#[cfg(test)]
mod tests;

pub use error::{DecodeError, ErrorKind, Result};
pub use limits::PreviousLimit;
pub use options::{
    DEFAULT_BUFFER_SIZE, DEFAULT_RECURSION_LIMIT, DEFAULT_SIZE_LIMIT, ReaderOptions, Utf8Mode,
};
pub use reader::{CodedReader, ExtensionRegistry};
