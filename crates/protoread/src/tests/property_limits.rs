use alloc::{vec, vec::Vec};

use quickcheck::QuickCheck;
use rstest::rstest;

use super::message::{
    Field, GROUP, Message, decode_fields, decode_message, encode_fields, put_tag, segment,
};
use crate::{
    CodedReader, ErrorKind, ReaderOptions,
    primitives::{encode_varint, varint_len},
    wire::WireType,
};

fn nested(depth: u32, group: bool) -> Message {
    let mut fields = Vec::new();
    for _ in 0..depth {
        fields = if group {
            vec![Field::Group(fields)]
        } else {
            vec![Field::Message(fields)]
        };
    }
    Message(fields)
}

#[rstest]
#[case(1, false)]
#[case(1, true)]
#[case(7, false)]
#[case(7, true)]
#[case(100, false)]
#[case(100, true)]
fn recursion_boundary(#[case] limit: u32, #[case] group: bool) {
    let options = ReaderOptions::with_limits(u64::MAX, limit);

    let at_limit = nested(limit, group);
    assert_eq!(at_limit.depth(), limit);
    let bytes = at_limit.encode();
    let mut reader = CodedReader::from_slice_with_options(&bytes, options);
    assert_eq!(decode_message(&mut reader).unwrap(), at_limit);

    let bytes = nested(limit + 1, group).encode();
    let mut reader = CodedReader::from_slice_with_options(&bytes, options);
    let err = decode_message(&mut reader).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_boundary_when_skipping() {
    // Unknown group field 9 nested three deep.
    let mut bytes = Vec::new();
    for _ in 0..3 {
        put_tag(9, WireType::StartGroup, &mut bytes);
    }
    for _ in 0..3 {
        put_tag(9, WireType::EndGroup, &mut bytes);
    }

    let options = ReaderOptions::with_limits(u64::MAX, 3);
    let mut reader = CodedReader::from_slice_with_options(&bytes, options);
    assert_eq!(decode_message(&mut reader).unwrap(), Message(Vec::new()));

    let options = ReaderOptions::with_limits(u64::MAX, 2);
    let mut reader = CodedReader::from_slice_with_options(&bytes, options);
    let err = decode_message(&mut reader).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::RecursionLimitExceeded);
}

/// Property: a pushed limit confines the body to exactly its bytes, and
/// popping it resumes right after them.
#[test]
fn limit_nesting_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(body: Message, trailer: u64, splits: Vec<usize>) -> bool {
        let inner = body.encode();
        let mut bytes = Vec::new();
        encode_varint(inner.len() as u64, &mut bytes);
        bytes.extend_from_slice(&inner);
        encode_fields(&[Field::Varint(trailer)], &mut bytes);

        let mut reader = CodedReader::from_segments(segment(&bytes, &splits));
        let Ok(len) = reader.read_length() else {
            return false;
        };
        let start = reader.position();
        let Ok(previous) = reader.push_limit(len) else {
            return false;
        };
        let decoded = decode_fields(&mut reader);
        let confined = reader.reached_limit() && reader.is_at_end().unwrap_or(false);
        reader.pop_limit(previous);

        let resumed = reader.position() == start + inner.len() as u64;
        let tail = decode_message(&mut reader);
        decoded.as_ref() == Ok(&body.0)
            && confined
            && resumed
            && reader.bytes_until_limit().is_none()
            && tail == Ok(Message(vec![Field::Varint(trailer)]))
    }

    QuickCheck::new()
        .tests(if is_ci::cached() { 2_000 } else { 500 })
        .quickcheck(prop as fn(Message, u64, Vec<usize>) -> bool);
}

/// Property: skipping an unknown group, however deeply nested, stops right
/// after its end-group tag.
#[test]
fn group_skip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(body: Message, splits: Vec<usize>) -> bool {
        let mut bytes = Vec::new();
        put_tag(GROUP + 10, WireType::StartGroup, &mut bytes);
        encode_fields(&body.0, &mut bytes);
        put_tag(GROUP + 10, WireType::EndGroup, &mut bytes);
        let group_end = bytes.len() as u64;
        bytes.extend_from_slice(&[0x08, 0x2a]);

        let mut reader = CodedReader::from_segments(segment(&bytes, &splits));
        reader.read_tag().is_ok()
            && reader.skip_last_field().is_ok()
            && reader.position() == group_end
            && reader.recursion_depth() == 0
            && reader.read_tag().ok() == Some(8)
    }

    QuickCheck::new()
        .tests(if is_ci::cached() { 2_000 } else { 500 })
        .quickcheck(prop as fn(Message, Vec<usize>) -> bool);
}

#[test]
fn varint_len_of_length_prefix() {
    // The length prefix itself is never counted inside the pushed limit.
    let inner = Message(vec![Field::Bytes([7u8; 200].to_vec())]).encode();
    let mut bytes = Vec::new();
    encode_varint(inner.len() as u64, &mut bytes);
    assert_eq!(bytes.len(), varint_len(inner.len() as u64));
    bytes.extend_from_slice(&inner);

    let mut reader = CodedReader::from_slice(&bytes);
    let len = reader.read_length().unwrap();
    assert_eq!(reader.position(), 2);
    reader
        .with_limit(len, |r| {
            assert_eq!(r.bytes_until_limit(), Some(inner.len() as u64));
            decode_fields(r).map(drop)
        })
        .unwrap();
    assert!(reader.is_at_end().unwrap());
}
