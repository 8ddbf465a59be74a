//! Wire types and tag words.
//!
//! Every encoded value is prefixed by a tag word:
//!
//! ```text
//! tag = varint(field_number << 3 | wire_type)
//! ```

use crate::error::{Error, Result};

/// Wire type carried in the low three bits of a tag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Varint (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
    Varint = 0,
    /// 8 little-endian bytes (fixed64, sfixed64, double)
    Fixed64 = 1,
    /// Length-delimited (string, bytes, submessages, packed arrays)
    Len = 2,
    /// 4 little-endian bytes (fixed32, sfixed32, float)
    Fixed32 = 5,
}

impl WireType {
    /// Convert a u8 value to a WireType.
    ///
    /// # Returns
    /// * `Some(WireType)` for 0, 1, 2 or 5
    /// * `None` for the group markers and unassigned values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::Len),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// Convert the WireType to its u8 representation.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Builds the tag word for a field number and wire type.
#[inline]
pub fn tag_word(field_number: u32, wire_type: WireType) -> u64 {
    (u64::from(field_number) << 3) | u64::from(wire_type.as_u8())
}

/// Splits a tag word into its field number and wire type.
///
/// Field numbers wider than 32 bits are truncated, matching how the tag word
/// is read as a 32-bit quantity.
pub fn split_tag(word: u64) -> Result<(u32, WireType)> {
    let raw = (word & 0x07) as u8;
    let wire_type = WireType::from_u8(raw).ok_or(Error::InvalidWireType(raw))?;
    Ok(((word as u32) >> 3, wire_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_from_u8() {
        assert_eq!(WireType::from_u8(0), Some(WireType::Varint));
        assert_eq!(WireType::from_u8(1), Some(WireType::Fixed64));
        assert_eq!(WireType::from_u8(2), Some(WireType::Len));
        assert_eq!(WireType::from_u8(5), Some(WireType::Fixed32));
        assert_eq!(WireType::from_u8(3), None);
        assert_eq!(WireType::from_u8(4), None);
        assert_eq!(WireType::from_u8(7), None);
    }

    #[test]
    fn test_tag_word() {
        assert_eq!(tag_word(1, WireType::Varint), 0x08);
        assert_eq!(tag_word(2, WireType::Len), 0x12);
        assert_eq!(tag_word(16, WireType::Fixed32), 0x85);
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(split_tag(0x08), Ok((1, WireType::Varint)));
        assert_eq!(split_tag(0x12), Ok((2, WireType::Len)));
        assert_eq!(split_tag(0x0b), Err(Error::InvalidWireType(3)));
    }
}
