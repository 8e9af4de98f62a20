//! Byte-level grammar of the wire format: tags, wire types and the zigzag
//! mapping used by `sint32`/`sint64`.

/// Number of low bits of a tag that hold the wire type.
pub const TAG_TYPE_BITS: u32 = 3;

const TAG_TYPE_MASK: u32 = (1 << TAG_TYPE_BITS) - 1;

/// How a field's value is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint.
    Varint = 0,
    /// Eight little-endian bytes.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    LengthDelimited = 2,
    /// Opens a group; closed by an `EndGroup` tag with the same field number.
    StartGroup = 3,
    /// Closes a group.
    EndGroup = 4,
    /// Four little-endian bytes.
    Fixed32 = 5,
}

impl WireType {
    /// Decodes the three wire-type bits. Returns `None` for 6 and 7.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

/// Builds a tag from a field number and wire type.
#[must_use]
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << TAG_TYPE_BITS) | wire_type as u32
}

/// Field number carried by `tag`.
#[must_use]
pub const fn tag_field_number(tag: u32) -> u32 {
    tag >> TAG_TYPE_BITS
}

/// Raw wire-type bits carried by `tag`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn tag_wire_bits(tag: u32) -> u8 {
    (tag & TAG_TYPE_MASK) as u8
}

/// Wire type carried by `tag`, or `None` for the unassigned values.
#[must_use]
pub const fn tag_wire_type(tag: u32) -> Option<WireType> {
    WireType::from_bits(tag_wire_bits(tag))
}

/// Folds a signed 32-bit value into an unsigned one.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

/// Folds a signed 64-bit value into an unsigned one.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}
