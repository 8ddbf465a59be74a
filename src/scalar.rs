//! Value codecs shared by the decode and encode engines.
//!
//! Each routine moves exactly one wire value between a stream and the slot
//! at `at` in a record image. Dispatch is a `match` on [`WireKind`]; the
//! cardinality logic lives in the engines.

use crate::decode::{DecodeContext, decode_record};
use crate::encode::{EncodeContext, encode_record};
use crate::error::{Error, Result};
use crate::field::{FieldDescriptor, LENGTH_PREFIX, MessageDescriptor, WireKind};
use crate::output::OutputBuffer;
use crate::record::Record;
use crate::stream::InputStream;
use crate::varint::{zigzag_decode, zigzag_encode};

/// Decodes one value of `field` into the slot at `at`.
pub(crate) fn decode_value(
    stream: &mut InputStream<'_>,
    field: &FieldDescriptor,
    rec: &mut Record<&mut [u8]>,
    at: usize,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    if field.ty.is_heap() {
        return decode_heap_value(stream, field, rec, at, ctx);
    }
    match field.ty.kind {
        WireKind::Varint => {
            let value = stream.decode_varint()?;
            rec.write_uint(at, field.data_size, value)
        }
        WireKind::SignedVarint => {
            let value = zigzag_decode(stream.decode_varint()?);
            rec.write_uint(at, field.data_size, value)
        }
        WireKind::Fixed32 => {
            let value = stream.decode_fixed32()?;
            rec.write_uint(at, 4, u64::from(value))
        }
        WireKind::Fixed64 => {
            let value = stream.decode_fixed64()?;
            rec.write_uint(at, 8, value)
        }
        WireKind::Bytes => {
            let capacity = field
                .data_size
                .checked_sub(LENGTH_PREFIX)
                .ok_or(Error::InvalidDescriptor)?;
            let len = stream.decode_len()?;
            if len > capacity {
                codec_debug!(tag = field.tag, len, capacity, "bytes value too long");
                return Err(Error::CapacityExceeded);
            }
            stream.read(rec.bytes_mut(at + LENGTH_PREFIX, len)?)?;
            rec.write_uint(at, LENGTH_PREFIX, len as u64)
        }
        WireKind::String => {
            let capacity = field
                .data_size
                .checked_sub(1)
                .ok_or(Error::InvalidDescriptor)?;
            let len = stream.decode_len()?;
            if len > capacity {
                codec_debug!(tag = field.tag, len, capacity, "string value too long");
                return Err(Error::CapacityExceeded);
            }
            stream.read(rec.bytes_mut(at, len)?)?;
            rec.bytes_mut(at + len, 1)?[0] = 0;
            Ok(())
        }
        WireKind::Submessage => {
            let msg = field.submessage().ok_or(Error::InvalidDescriptor)?;
            let mut sub = stream.substream()?;
            let mut child = rec.sub_mut(at, field.data_size)?;
            decode_record(&mut sub, msg, &mut child, ctx)?;
            sub.skip_remaining()
        }
    }
}

#[cfg(feature = "alloc")]
fn decode_heap_value(
    stream: &mut InputStream<'_>,
    field: &FieldDescriptor,
    rec: &mut Record<&mut [u8]>,
    at: usize,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    match field.ty.kind {
        WireKind::Bytes | WireKind::String => {
            let len = stream.decode_len()?;
            let heap = ctx.heap()?;
            let handle = match rec.handle(at)? {
                0 => {
                    let handle = heap.alloc(len)?;
                    rec.set_handle(at, handle)?;
                    handle
                }
                handle => {
                    heap.resize(handle, len)?;
                    handle
                }
            };
            let buf = heap.get_mut(handle).ok_or(Error::InvalidDescriptor)?;
            stream.read(buf)
        }
        WireKind::Submessage => {
            let msg = field.submessage().ok_or(Error::InvalidDescriptor)?;
            let mut sub = stream.substream()?;
            let handle = match rec.handle(at)? {
                0 => {
                    let handle = ctx.heap()?.alloc(msg.size)?;
                    rec.set_handle(at, handle)?;
                    handle
                }
                handle => handle,
            };
            decode_heap_record(&mut sub, msg, handle, ctx)?;
            sub.skip_remaining()
        }
        _ => Err(Error::InvalidDescriptor),
    }
}

#[cfg(not(feature = "alloc"))]
fn decode_heap_value(
    _stream: &mut InputStream<'_>,
    _field: &FieldDescriptor,
    _rec: &mut Record<&mut [u8]>,
    _at: usize,
    _ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    Err(Error::AllocationFailed)
}

/// Decodes into the submessage image behind `handle`.
///
/// The image is moved out of the arena for the duration of the nested
/// decode so nested heap fields can still allocate from the same arena.
#[cfg(feature = "alloc")]
pub(crate) fn decode_heap_record(
    stream: &mut InputStream<'_>,
    msg: &MessageDescriptor,
    handle: u32,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    let mut image = ctx
        .heap()?
        .replace(handle, alloc::vec::Vec::new())
        .ok_or(Error::InvalidDescriptor)?;
    let result = decode_record(stream, msg, &mut Record::new_unchecked(&mut image[..]), ctx);
    ctx.heap()?.replace(handle, image);
    result
}

/// Encodes one value of `field` from the slot at `at`, without its tag.
pub(crate) fn encode_value(
    out: &mut OutputBuffer<'_>,
    field: &FieldDescriptor,
    rec: &Record<&[u8]>,
    at: usize,
    ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    if field.ty.is_heap() {
        return encode_heap_value(out, field, rec, at, ctx);
    }
    match field.ty.kind {
        WireKind::Varint => out.write_varint(rec.read_uint(at, field.data_size)?),
        WireKind::SignedVarint => {
            let value = rec.read_uint(at, field.data_size)?;
            out.write_varint(zigzag_encode(value, field.data_size))
        }
        WireKind::Fixed32 => out.write(rec.bytes(at, 4)?),
        WireKind::Fixed64 => out.write(rec.bytes(at, 8)?),
        WireKind::Bytes => out.write_string(rec.bytes_value(at, field.data_size)?),
        WireKind::String => out.write_string(rec.string(at, field.data_size)?),
        WireKind::Submessage => {
            let msg = field.submessage().ok_or(Error::InvalidDescriptor)?;
            let child = rec.sub(at, field.data_size)?;
            encode_submessage(out, msg, &child, ctx)
        }
    }
}

/// Encodes a nested record, then writes its length in front of it.
fn encode_submessage(
    out: &mut OutputBuffer<'_>,
    msg: &MessageDescriptor,
    child: &Record<&[u8]>,
    ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    let start = out.len();
    encode_record(out, msg, child, ctx)?;
    let len = out.len() - start;
    codec_trace!(len, "submessage encoded");
    out.write_varint(len as u64)
}

#[cfg(feature = "alloc")]
fn encode_heap_value(
    out: &mut OutputBuffer<'_>,
    field: &FieldDescriptor,
    rec: &Record<&[u8]>,
    at: usize,
    ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    let handle = rec.handle(at)?;
    match field.ty.kind {
        // A null pointer encodes as the empty value
        WireKind::Bytes | WireKind::String if handle == 0 => out.write_string(&[]),
        WireKind::Bytes | WireKind::String => {
            let heap = ctx.heap.ok_or(Error::AllocationFailed)?;
            out.write_string(heap.get(handle).ok_or(Error::InvalidDescriptor)?)
        }
        WireKind::Submessage => {
            let msg = field.submessage().ok_or(Error::InvalidDescriptor)?;
            let heap = ctx.heap.ok_or(Error::AllocationFailed)?;
            let image = heap.get(handle).ok_or(Error::InvalidDescriptor)?;
            encode_submessage(out, msg, &Record::new_unchecked(image), ctx)
        }
        _ => Err(Error::InvalidDescriptor),
    }
}

#[cfg(not(feature = "alloc"))]
fn encode_heap_value(
    _out: &mut OutputBuffer<'_>,
    _field: &FieldDescriptor,
    _rec: &Record<&[u8]>,
    _at: usize,
    _ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    Err(Error::AllocationFailed)
}
