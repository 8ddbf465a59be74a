//! Input streams.
//!
//! An [`InputStream`] is a pull cursor over a [`Source`] bounded by a count of
//! bytes left. Length-delimited values are read through a [`substream`]
//! that shares the parent's source but is limited to the declared length, so
//! nested decoding never copies.
//!
//! [`substream`]: InputStream::substream

use crate::error::{Error, Result};
use crate::varint::{MAX_VARINT_LEN, from_zigzag64};
use crate::wire::WireType;
use byteorder::{ByteOrder, LittleEndian};

/// A byte source an [`InputStream`] pulls from.
pub trait Source {
    /// Fills `buf` completely or fails.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Discards `count` bytes.
    fn skip(&mut self, mut count: usize) -> Result<()> {
        let mut scratch = [0u8; 16];
        while count > 0 {
            let n = count.min(scratch.len());
            self.read(&mut scratch[..n])?;
            count -= n;
        }
        Ok(())
    }
}

/// A mutable reader of an immutable data source
#[derive(Debug, Clone)]
pub struct SliceReader<'x> {
    data: &'x [u8],
    pos: usize,
}

impl<'x> SliceReader<'x> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'x [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns `true` once everything was read.
    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Remaining data to read
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads `n` bytes and advances the reader by `n`
    pub fn take(&mut self, n: usize) -> Option<&'x [u8]> {
        if self.len() < n {
            return None;
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }
}

impl Source for SliceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.take(buf.len()).ok_or(Error::Truncated)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ()).ok_or(Error::Truncated)
    }
}

/// A [`Source`] backed by a byte-delivering closure.
///
/// The closure must fill the whole buffer it is given, or fail.
pub struct FnSource<F> {
    fill: F,
}

impl<F> FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<()>,
{
    /// Wraps a closure that fills the buffer it is given.
    pub fn new(fill: F) -> Self {
        FnSource { fill }
    }
}

impl<F> Source for FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<()>,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (self.fill)(buf)
    }
}

/// A length-bounded pull cursor over a [`Source`].
pub struct InputStream<'s> {
    source: &'s mut dyn Source,
    bytes_left: usize,
}

impl<'s> InputStream<'s> {
    /// Creates a stream that reads at most `len` bytes from `source`.
    pub fn new(source: &'s mut dyn Source, len: usize) -> Self {
        InputStream {
            source,
            bytes_left: len,
        }
    }

    /// Creates a stream over everything left in `reader`.
    ///
    /// ```
    /// use tlv_codec::stream::{InputStream, SliceReader};
    ///
    /// let data = [0x96, 0x01];
    /// let mut reader = SliceReader::new(&data);
    /// let mut stream = InputStream::from_reader(&mut reader);
    /// assert_eq!(stream.decode_varint(), Ok(150));
    /// assert_eq!(stream.bytes_left(), 0);
    /// ```
    pub fn from_reader(reader: &'s mut SliceReader<'_>) -> Self {
        let len = reader.len();
        InputStream::new(reader, len)
    }

    /// Bytes this stream may still read.
    #[inline]
    pub fn bytes_left(&self) -> usize {
        self.bytes_left
    }

    /// Reads exactly `buf.len()` bytes.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.bytes_left < buf.len() {
            return Err(Error::Truncated);
        }
        self.source.read(buf)?;
        self.bytes_left -= buf.len();
        Ok(())
    }

    /// Discards exactly `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        if self.bytes_left < count {
            return Err(Error::Truncated);
        }
        self.source.skip(count)?;
        self.bytes_left -= count;
        Ok(())
    }

    /// Discards whatever is left in this stream.
    pub fn skip_remaining(&mut self) -> Result<()> {
        self.skip(self.bytes_left)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    /// Reads one varint of at most [`MAX_VARINT_LEN`] bytes.
    pub fn decode_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for group in 0..MAX_VARINT_LEN {
            let byte = self.read_byte()?;
            value |= u64::from(byte & 0x7f) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::InvalidVarint)
    }

    /// Reads one zigzag-encoded varint.
    pub fn decode_svarint(&mut self) -> Result<i64> {
        self.decode_varint().map(from_zigzag64)
    }

    /// Reads 4 little-endian bytes.
    pub fn decode_fixed32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read(&mut bytes)?;
        Ok(LittleEndian::read_u32(&bytes))
    }

    /// Reads 8 little-endian bytes.
    pub fn decode_fixed64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.read(&mut bytes)?;
        Ok(LittleEndian::read_u64(&bytes))
    }

    /// Reads a length prefix and checks it fits in this stream.
    pub fn decode_len(&mut self) -> Result<usize> {
        let len = self.decode_varint()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.bytes_left => Ok(len),
            _ => Err(Error::Truncated),
        }
    }

    /// Discards one varint.
    pub fn skip_varint(&mut self) -> Result<()> {
        self.decode_varint().map(|_| ())
    }

    /// Discards one length-delimited value.
    pub fn skip_string(&mut self) -> Result<()> {
        let len = self.decode_len()?;
        self.skip(len)
    }

    /// Skips one value of the given wire type.
    pub fn skip_value(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => self.skip_varint(),
            WireType::Fixed64 => self.skip(8),
            WireType::Len => self.skip_string(),
            WireType::Fixed32 => self.skip(4),
        }
    }

    /// Reads a length prefix and returns a stream bounded by it.
    ///
    /// The parent gives up the declared length immediately; once the
    /// substream is done, call [`skip_remaining`] on it so the shared source
    /// ends up at the end of the length-delimited value.
    ///
    /// [`skip_remaining`]: InputStream::skip_remaining
    pub fn substream(&mut self) -> Result<InputStream<'_>> {
        let len = self.decode_len()?;
        self.bytes_left -= len;
        Ok(InputStream {
            source: &mut *self.source,
            bytes_left: len,
        })
    }

    /// Copies one undecoded scalar value into `buf`, returning its length.
    ///
    /// Used to present a singular scalar to a field callback as its own
    /// bounded stream.
    pub fn read_raw_value(
        &mut self,
        wire_type: WireType,
        buf: &mut [u8; MAX_VARINT_LEN],
    ) -> Result<usize> {
        match wire_type {
            WireType::Varint => {
                for len in 1..=MAX_VARINT_LEN {
                    let byte = self.read_byte()?;
                    buf[len - 1] = byte;
                    if byte & 0x80 == 0 {
                        return Ok(len);
                    }
                }
                Err(Error::InvalidVarint)
            }
            WireType::Fixed64 => {
                self.read(&mut buf[..8])?;
                Ok(8)
            }
            WireType::Fixed32 => {
                self.read(&mut buf[..4])?;
                Ok(4)
            }
            WireType::Len => Err(Error::InvalidWireType(wire_type.as_u8())),
        }
    }
}
