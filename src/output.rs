//! Back-to-front output buffer.
//!
//! An [`OutputBuffer`] fills a fixed region from its last byte toward its
//! first. Whatever is written last ends up first, so an encoder that emits a
//! payload and then its length and tag produces forward-order wire bytes
//! without measuring anything up front.
//!
//! ```text
//! [ free ........ | written bytes ]
//!  0              last            len
//! ```

use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::varint::{MAX_VARINT_LEN, encode_varint, to_zigzag64};
use crate::wire::{WireType, tag_word};
use byteorder::{ByteOrder, LittleEndian};

/// A fixed-capacity sink written from its end backward.
#[derive(Debug)]
pub struct OutputBuffer<'b> {
    buffer: &'b mut [u8],
    last: usize,
}

impl<'b> OutputBuffer<'b> {
    /// Wraps `buffer`; nothing is written yet.
    pub fn new(buffer: &'b mut [u8]) -> Self {
        let last = buffer.len();
        OutputBuffer { buffer, last }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len() - self.last
    }

    /// Returns `true` if nothing was written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes still free in front of the written region.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.last
    }

    /// The encoded bytes, in wire order.
    pub fn written(&self) -> &[u8] {
        &self.buffer[self.last..]
    }

    /// Consumes the buffer, returning the encoded bytes.
    pub fn into_written(self) -> &'b [u8] {
        let OutputBuffer { buffer, last } = self;
        &buffer[last..]
    }

    /// Prepends `bytes` in front of everything written so far.
    ///
    /// On failure nothing is written.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.last {
            codec_debug!(need = bytes.len(), remaining = self.last, "output buffer full");
            return Err(Error::OutputFull);
        }
        let start = self.last - bytes.len();
        self.buffer[start..self.last].copy_from_slice(bytes);
        self.last = start;
        Ok(())
    }

    /// Writes a minimal varint.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let len = encode_varint(value, &mut buf);
        self.write(&buf[..len])
    }

    /// Writes a zigzag-mapped varint.
    pub fn write_svarint(&mut self, value: i64) -> Result<()> {
        self.write_varint(to_zigzag64(value))
    }

    /// Writes 4 little-endian bytes.
    pub fn write_fixed32(&mut self, value: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write(&buf)
    }

    /// Writes 8 little-endian bytes.
    pub fn write_fixed64(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.write(&buf)
    }

    /// Writes a tag word for `field_number` and `wire_type`.
    pub fn write_tag(&mut self, wire_type: WireType, field_number: u32) -> Result<()> {
        self.write_varint(tag_word(field_number, wire_type))
    }

    /// Writes the tag for one value of `field`.
    pub fn write_tag_for_field(&mut self, field: &FieldDescriptor) -> Result<()> {
        self.write_tag(field.ty.kind.wire_type(), field.tag)
    }

    /// Writes a length-delimited value: `bytes`, then its length in front.
    pub fn write_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes)?;
        self.write_varint(bytes.len() as u64)
    }
}
