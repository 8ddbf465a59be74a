//! Record module
//!
//! This module contains the `Record` type, a read/write wrapper around the
//! byte image of one message instance. Offsets come from
//! [`FieldIter`](crate::iter::FieldIter); every access is bounds-checked and
//! reports [`Error::BufferTooShort`] instead of panicking.

use crate::error::{Error, Result};
use crate::field::{COUNT_SIZE, HANDLE_SIZE, LENGTH_PREFIX, MessageDescriptor};
use byteorder::{ByteOrder, LittleEndian};
use core::fmt;
use core::ops::Range;

/// A read/write wrapper around a record image.
///
/// The image starts with the presence bitmap, followed by field storage at
/// the offsets the message descriptor describes. Integers are stored
/// little-endian at their declared width.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Record<T: AsRef<[u8]>> {
    buffer: T,
}

#[inline]
fn span(offset: usize, len: usize) -> Range<usize> {
    offset..offset.saturating_add(len)
}

#[inline]
fn check_width(width: usize) -> Result<()> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(Error::InvalidDescriptor)
    }
}

impl<T: AsRef<[u8]>> Record<T> {
    /// Creates a new unchecked `Record`.
    pub const fn new_unchecked(buffer: T) -> Record<T> {
        Record { buffer }
    }

    /// Creates a `Record` after checking the buffer can hold `msg`.
    pub fn new_checked(buffer: T, msg: &MessageDescriptor) -> Result<Record<T>> {
        let record = Self::new_unchecked(buffer);
        record.check_len(msg)?;
        Ok(record)
    }

    /// Checks the buffer is at least as long as the message image.
    pub fn check_len(&self, msg: &MessageDescriptor) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < msg.size || len < msg.presence_len() {
            return Err(Error::BufferTooShort);
        }
        Ok(())
    }

    /// Returns the inner buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Returns a reference to the whole image.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Returns `len` bytes at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.buffer
            .as_ref()
            .get(span(offset, len))
            .ok_or(Error::BufferTooShort)
    }

    /// Returns the presence bit of field `index`.
    pub fn has_field(&self, index: usize) -> Result<bool> {
        let byte = self.bytes(index / 8, 1)?[0];
        Ok(byte & (1 << (index % 8)) != 0)
    }

    /// Reads an unsigned integer of `width` bytes, zero-extended.
    pub fn read_uint(&self, offset: usize, width: usize) -> Result<u64> {
        check_width(width)?;
        Ok(LittleEndian::read_uint(self.bytes(offset, width)?, width))
    }

    /// Reads a signed integer of `width` bytes, sign-extended.
    pub fn read_int(&self, offset: usize, width: usize) -> Result<i64> {
        check_width(width)?;
        Ok(LittleEndian::read_int(self.bytes(offset, width)?, width))
    }

    /// Reads a little-endian float.
    pub fn read_f32(&self, offset: usize) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.bytes(offset, 4)?))
    }

    /// Reads a little-endian double.
    pub fn read_f64(&self, offset: usize) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.bytes(offset, 8)?))
    }

    /// Reads an array element count slot.
    pub fn count(&self, offset: usize) -> Result<usize> {
        Ok(LittleEndian::read_u32(self.bytes(offset, COUNT_SIZE)?) as usize)
    }

    /// Reads a heap or callback handle slot.
    pub fn handle(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(offset, HANDLE_SIZE)?))
    }

    /// Returns the content of an inline string slot, up to its terminator.
    pub fn string(&self, offset: usize, size: usize) -> Result<&[u8]> {
        let slot = self.bytes(offset, size)?;
        let len = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        Ok(&slot[..len])
    }

    /// Returns the content of an inline bytes slot.
    pub fn bytes_value(&self, offset: usize, size: usize) -> Result<&[u8]> {
        let capacity = size.checked_sub(LENGTH_PREFIX).ok_or(Error::InvalidDescriptor)?;
        let len = LittleEndian::read_u32(self.bytes(offset, LENGTH_PREFIX)?) as usize;
        if len > capacity {
            return Err(Error::CapacityExceeded);
        }
        self.bytes(offset + LENGTH_PREFIX, len)
    }

    /// A read-only view of a nested inline record.
    pub fn sub(&self, offset: usize, size: usize) -> Result<Record<&[u8]>> {
        Ok(Record::new_unchecked(self.bytes(offset, size)?))
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Record<T> {
    /// Returns `len` mutable bytes at `offset`.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        self.buffer
            .as_mut()
            .get_mut(span(offset, len))
            .ok_or(Error::BufferTooShort)
    }

    /// Sets or clears the presence bit of field `index`.
    pub fn set_has_field(&mut self, index: usize, present: bool) -> Result<()> {
        let byte = &mut self.bytes_mut(index / 8, 1)?[0];
        if present {
            *byte |= 1 << (index % 8);
        } else {
            *byte &= !(1 << (index % 8));
        }
        Ok(())
    }

    /// Writes the low `width` bytes of `value`.
    pub fn write_uint(&mut self, offset: usize, width: usize, value: u64) -> Result<()> {
        check_width(width)?;
        let value = if width == 8 {
            value
        } else {
            value & ((1u64 << (width * 8)) - 1)
        };
        LittleEndian::write_uint(self.bytes_mut(offset, width)?, value, width);
        Ok(())
    }

    /// Writes the low `width` bytes of a signed value.
    pub fn write_int(&mut self, offset: usize, width: usize, value: i64) -> Result<()> {
        self.write_uint(offset, width, value as u64)
    }

    /// Writes a little-endian float.
    pub fn write_f32(&mut self, offset: usize, value: f32) -> Result<()> {
        LittleEndian::write_f32(self.bytes_mut(offset, 4)?, value);
        Ok(())
    }

    /// Writes a little-endian double.
    pub fn write_f64(&mut self, offset: usize, value: f64) -> Result<()> {
        LittleEndian::write_f64(self.bytes_mut(offset, 8)?, value);
        Ok(())
    }

    /// Writes an array element count slot.
    pub fn set_count(&mut self, offset: usize, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| Error::CapacityExceeded)?;
        LittleEndian::write_u32(self.bytes_mut(offset, COUNT_SIZE)?, count);
        Ok(())
    }

    /// Writes a heap or callback handle slot.
    pub fn set_handle(&mut self, offset: usize, handle: u32) -> Result<()> {
        LittleEndian::write_u32(self.bytes_mut(offset, HANDLE_SIZE)?, handle);
        Ok(())
    }

    /// Stores `value` in an inline string slot of `size` bytes, terminated.
    pub fn set_string(&mut self, offset: usize, size: usize, value: &[u8]) -> Result<()> {
        if value.len() >= size {
            return Err(Error::CapacityExceeded);
        }
        let slot = self.bytes_mut(offset, size)?;
        slot[..value.len()].copy_from_slice(value);
        slot[value.len()] = 0;
        Ok(())
    }

    /// Stores `value` in an inline bytes slot of `size` bytes.
    pub fn set_bytes(&mut self, offset: usize, size: usize, value: &[u8]) -> Result<()> {
        let capacity = size.checked_sub(LENGTH_PREFIX).ok_or(Error::InvalidDescriptor)?;
        if value.len() > capacity {
            return Err(Error::CapacityExceeded);
        }
        let slot = self.bytes_mut(offset, LENGTH_PREFIX + value.len())?;
        LittleEndian::write_u32(&mut slot[..LENGTH_PREFIX], value.len() as u32);
        slot[LENGTH_PREFIX..].copy_from_slice(value);
        Ok(())
    }

    /// Fills `len` bytes at `offset` with `byte`.
    pub fn fill(&mut self, offset: usize, len: usize, byte: u8) -> Result<()> {
        self.bytes_mut(offset, len)?.fill(byte);
        Ok(())
    }

    /// A mutable view of a nested inline record.
    pub fn sub_mut(&mut self, offset: usize, size: usize) -> Result<Record<&mut [u8]>> {
        Ok(Record::new_unchecked(self.bytes_mut(offset, size)?))
    }
}

impl<T: AsRef<[u8]>> fmt::Display for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Record: {} bytes [", self.as_slice().len())?;
        for (i, byte) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_too_short() {
        static MSG: MessageDescriptor = MessageDescriptor::new(&[], 8);
        let buffer = [0u8; 4];
        let result = Record::new_checked(&buffer[..], &MSG);
        assert_eq!(result, Err(Error::BufferTooShort));
    }

    #[test]
    fn test_presence_bits() {
        let mut buffer = [0u8; 2];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.set_has_field(0, true).unwrap();
        record.set_has_field(9, true).unwrap();
        assert!(record.has_field(0).unwrap());
        assert!(!record.has_field(1).unwrap());
        assert!(record.has_field(9).unwrap());
        record.set_has_field(0, false).unwrap();
        assert!(!record.has_field(0).unwrap());
        assert_eq!(record.has_field(16), Err(Error::BufferTooShort));
        assert_eq!(buffer, [0x00, 0x02]);
    }

    #[test]
    fn test_uint_truncates_to_width() {
        let mut buffer = [0u8; 8];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.write_uint(0, 2, 0x1234_5678).unwrap();
        assert_eq!(record.read_uint(0, 2), Ok(0x5678));
        assert_eq!(record.as_slice()[..2], [0x78, 0x56]);
        assert_eq!(record.read_uint(0, 0), Err(Error::InvalidDescriptor));
        assert_eq!(record.read_uint(6, 4), Err(Error::BufferTooShort));
    }

    #[test]
    fn test_int_sign_extends() {
        let mut buffer = [0u8; 4];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.write_int(0, 4, -2).unwrap();
        assert_eq!(record.read_int(0, 4), Ok(-2));
        assert_eq!(record.read_uint(0, 4), Ok(0xffff_fffe));
    }

    #[test]
    fn test_string_slot() {
        let mut buffer = [0xffu8; 6];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.set_string(0, 6, b"abcde").unwrap();
        assert_eq!(record.string(0, 6), Ok(&b"abcde"[..]));
        assert_eq!(record.set_string(0, 6, b"abcdef"), Err(Error::CapacityExceeded));
        record.set_string(0, 6, b"").unwrap();
        assert_eq!(record.string(0, 6), Ok(&b""[..]));
    }

    #[test]
    fn test_bytes_slot() {
        let mut buffer = [0u8; 8];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.set_bytes(0, 8, &[1, 2, 3]).unwrap();
        assert_eq!(record.bytes_value(0, 8), Ok(&[1u8, 2, 3][..]));
        assert_eq!(record.set_bytes(0, 8, &[0; 5]), Err(Error::CapacityExceeded));
        assert_eq!(record.as_slice()[..4], [3, 0, 0, 0]);
    }

    #[test]
    fn test_floats() {
        let mut buffer = [0u8; 12];
        let mut record = Record::new_unchecked(&mut buffer[..]);
        record.write_f32(0, 1010.0).unwrap();
        record.write_f64(4, -1011.5).unwrap();
        assert_eq!(record.read_f32(0), Ok(1010.0));
        assert_eq!(record.read_f64(4), Ok(-1011.5));
    }

    #[test]
    fn test_display() {
        let buffer = [0x01u8, 0xab];
        let record = Record::new_unchecked(&buffer[..]);
        assert_eq!(format!("{}", record), "Record: 2 bytes [01 ab]");
    }
}
