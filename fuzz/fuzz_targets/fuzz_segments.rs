#![no_main]
use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use protoread::{CodedReader, ReaderOptions, Result, Utf8Mode, source::Source};

#[derive(Debug, Arbitrary)]
struct Input {
    recursion_limit: u8,
    lossy: bool,
    buffer_size: u8,
    splits: Vec<u8>,
    bytes: Vec<u8>,
}

#[derive(Debug, PartialEq)]
enum Value {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Text(String),
    Nested(Vec<(u32, Value)>),
}

/// Walks every field, treating length-delimited fields as nested messages
/// when they parse as one and as text otherwise.
fn walk<S: Source>(r: &mut CodedReader<S>) -> Result<Vec<(u32, Value)>> {
    let mut fields = Vec::new();
    loop {
        let tag = r.read_tag()?;
        if tag == 0 || tag & 7 == 4 {
            return Ok(fields);
        }
        let value = match tag & 7 {
            0 => Value::Varint(r.read_uint64()?),
            1 => Value::Fixed64(r.read_fixed64()?),
            2 if tag >> 3 == 1 => Value::Nested(r.read_message(walk)?),
            2 => Value::Text(r.read_string()?),
            3 => Value::Nested(r.read_group(walk)?),
            5 => Value::Fixed32(r.read_fixed32()?),
            _ => {
                r.skip_last_field()?;
                continue;
            }
        };
        fields.push((tag, value));
    }
}

fn split<'a>(bytes: &'a [u8], splits: &[u8]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = bytes;
    for &s in splits {
        let (head, tail) = rest.split_at(usize::from(s).min(rest.len()));
        out.push(head);
        rest = tail;
    }
    out.push(rest);
    out
}

fn check(input: &Input) {
    let options = ReaderOptions {
        recursion_limit: u32::from(input.recursion_limit),
        utf8_mode: if input.lossy {
            Utf8Mode::Lossy
        } else {
            Utf8Mode::Strict
        },
        buffer_size: usize::from(input.buffer_size).max(1),
        ..ReaderOptions::default()
    };

    let flat = walk(&mut CodedReader::from_slice_with_options(&input.bytes, options));
    let segmented = walk(&mut CodedReader::from_segments_with_options(
        split(&input.bytes, &input.splits),
        options,
    ));
    let streamed = walk(&mut CodedReader::from_reader_with_options(
        Cursor::new(&input.bytes),
        options,
    ));

    assert_eq!(flat, segmented);
    assert_eq!(flat, streamed);
}

fuzz_target!(|input: Input| check(&input));
