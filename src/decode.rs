//! Decode engine.
//!
//! Decoding runs in one pass over an [`InputStream`]:
//!
//! 1. Reset the record: clear the presence bitmap, empty arrays, copy static
//!    defaults into scalar slots and recurse into submessages. Callback slots
//!    are left alone so handles registered before the call survive.
//! 2. Read tags until the stream is exhausted or a zero tag word arrives.
//!    Unknown field numbers are skipped by wire type.
//! 3. Mark each known field present and dispatch on its cardinality.
//! 4. Fail if any required field never arrived.
//!
//! A failed decode leaves the record in a state the caller must discard.

use crate::callback::{Callback, lookup};
use crate::error::{Error, Result};
use crate::field::{Cardinality, FieldDescriptor, MessageDescriptor, WireKind};
use crate::iter::{FieldIter, FieldSlot};
use crate::record::Record;
use crate::scalar::decode_value;
use crate::stream::{InputStream, SliceReader};
use crate::varint::MAX_VARINT_LEN;
use crate::wire::{WireType, split_tag};

#[cfg(feature = "alloc")]
use crate::heap::Heap;

/// Per-call state threaded through nested decodes.
pub(crate) struct DecodeContext<'a, 'f> {
    callbacks: &'a mut [Callback<'f>],
    #[cfg(feature = "alloc")]
    heap: Option<&'a mut Heap>,
}

impl<'a, 'f> DecodeContext<'a, 'f> {
    pub(crate) fn new(callbacks: &'a mut [Callback<'f>]) -> Self {
        DecodeContext {
            callbacks,
            #[cfg(feature = "alloc")]
            heap: None,
        }
    }

    #[cfg(feature = "alloc")]
    pub(crate) fn heap(&mut self) -> Result<&mut Heap> {
        self.heap.as_deref_mut().ok_or(Error::AllocationFailed)
    }
}

/// Decodes one message from `stream` into the record image `dest`.
///
/// Equivalent to [`Decoder::new`] followed by [`Decoder::decode`]: no
/// callbacks and no heap.
///
/// # Examples
///
/// ```
/// use tlv_codec::decode::decode;
/// use tlv_codec::field::{MessageDescriptor, FieldDescriptor, common};
/// use tlv_codec::stream::{InputStream, SliceReader};
///
/// // bitmap(1) | padding(3) | value: i32
/// static FIELDS: [FieldDescriptor; 1] = [common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4)];
/// static MSG: MessageDescriptor = MessageDescriptor::new(&FIELDS, 8);
///
/// let wire = [0x08, 0x96, 0x01];
/// let mut reader = SliceReader::new(&wire);
/// let mut stream = InputStream::from_reader(&mut reader);
/// let mut image = [0u8; 8];
/// decode(&mut stream, &MSG, &mut image).unwrap();
/// assert_eq!(image[0], 0x01);
/// assert_eq!(i32::from_le_bytes(image[4..].try_into().unwrap()), 150);
/// ```
pub fn decode(stream: &mut InputStream<'_>, msg: &MessageDescriptor, dest: &mut [u8]) -> Result<()> {
    Decoder::new().decode(stream, msg, dest)
}

/// A configurable decode call.
///
/// Holds the callback table that callback handles in the record refer to
/// and, with the `alloc` feature, the arena heap-mode fields live in.
#[derive(Debug, Default)]
pub struct Decoder<'a, 'f> {
    callbacks: &'a mut [Callback<'f>],
    #[cfg(feature = "alloc")]
    heap: Option<&'a mut Heap>,
}

impl<'a, 'f> Decoder<'a, 'f> {
    /// Creates a decoder with no callbacks and no heap.
    pub fn new() -> Self {
        Decoder {
            callbacks: Default::default(),
            #[cfg(feature = "alloc")]
            heap: None,
        }
    }

    /// Sets the table that callback handles in the record index into.
    pub fn with_callbacks(self, callbacks: &'a mut [Callback<'f>]) -> Self {
        Decoder { callbacks, ..self }
    }

    /// Sets the arena heap-mode fields allocate from.
    #[cfg(feature = "alloc")]
    pub fn with_heap(self, heap: &'a mut Heap) -> Self {
        Decoder {
            heap: Some(heap),
            ..self
        }
    }

    /// Decodes one message from `stream` into the record image `dest`.
    pub fn decode(
        &mut self,
        stream: &mut InputStream<'_>,
        msg: &MessageDescriptor,
        dest: &mut [u8],
    ) -> Result<()> {
        let mut ctx = DecodeContext {
            callbacks: &mut *self.callbacks,
            #[cfg(feature = "alloc")]
            heap: self.heap.as_deref_mut(),
        };
        decode_record(stream, msg, &mut Record::new_unchecked(dest), &mut ctx)
    }
}

/// Resets a record to its initial state.
pub(crate) fn set_to_defaults(
    msg: &MessageDescriptor,
    rec: &mut Record<&mut [u8]>,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    rec.fill(0, msg.presence_len(), 0)?;

    for slot in msg.slots() {
        let field = slot.field;
        match field.ty.cardinality {
            Cardinality::Array => {
                rec.set_count(slot.size, 0)?;
                continue;
            }
            Cardinality::Callback => continue,
            Cardinality::Optional if field.size_offset < 0 => {
                rec.write_uint(slot.size, 1, 0)?;
            }
            _ => {}
        }

        if field.ty.is_heap() {
            heap_defaults(field, rec, slot.data, ctx)?;
        } else if field.ty.kind == WireKind::Submessage {
            let sub = field.submessage().ok_or(Error::InvalidDescriptor)?;
            set_to_defaults(sub, &mut rec.sub_mut(slot.data, field.data_size)?, ctx)?;
        } else {
            let value = rec.bytes_mut(slot.data, field.data_size)?;
            let default = field.default_value().unwrap_or(&[]);
            let len = default.len().min(value.len());
            value[..len].copy_from_slice(&default[..len]);
            value[len..].fill(0);
        }
    }
    Ok(())
}

/// Heap slots keep their handle; the value behind it is emptied.
#[cfg(feature = "alloc")]
fn heap_defaults(
    field: &FieldDescriptor,
    rec: &mut Record<&mut [u8]>,
    at: usize,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    let handle = rec.handle(at)?;
    if handle == 0 {
        return Ok(());
    }
    match field.ty.kind {
        WireKind::Bytes | WireKind::String => ctx.heap()?.resize(handle, 0),
        WireKind::Submessage => {
            let msg = field.submessage().ok_or(Error::InvalidDescriptor)?;
            let heap = ctx.heap()?;
            let mut image = heap
                .replace(handle, alloc::vec::Vec::new())
                .ok_or(Error::InvalidDescriptor)?;
            let result = set_to_defaults(msg, &mut Record::new_unchecked(&mut image[..]), ctx);
            ctx.heap()?.replace(handle, image);
            result
        }
        _ => Err(Error::InvalidDescriptor),
    }
}

#[cfg(not(feature = "alloc"))]
fn heap_defaults(
    _field: &FieldDescriptor,
    rec: &mut Record<&mut [u8]>,
    at: usize,
    _ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    match rec.handle(at)? {
        0 => Ok(()),
        _ => Err(Error::AllocationFailed),
    }
}

/// Decodes one message into `rec`, recursing for submessages.
pub(crate) fn decode_record(
    stream: &mut InputStream<'_>,
    msg: &MessageDescriptor,
    rec: &mut Record<&mut [u8]>,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    rec.check_len(msg)?;
    set_to_defaults(msg, rec, ctx)?;

    let mut iter = FieldIter::new(msg);
    while stream.bytes_left() > 0 {
        let word = match stream.decode_varint() {
            Ok(word) => word,
            // A tag cut off by the end of the stream is a normal end
            Err(_) if stream.bytes_left() == 0 => break,
            Err(e) => return Err(e),
        };
        if word == 0 {
            codec_trace!("zero tag, end of message");
            break;
        }
        let (tag, wire_type) = split_tag(word)?;

        let found = iter
            .as_mut()
            .and_then(|iter| iter.find(tag).then(|| iter.slot()));
        let Some(slot) = found else {
            codec_trace!(tag, wire_type = wire_type.as_u8(), "skipping unknown field");
            stream.skip_value(wire_type)?;
            continue;
        };

        rec.set_has_field(slot.index, true)?;
        decode_field(stream, wire_type, &slot, rec, ctx)?;
    }

    for slot in msg.slots() {
        if slot.field.ty.cardinality == Cardinality::Required && !rec.has_field(slot.index)? {
            codec_debug!(tag = slot.field.tag, "missing required field");
            return Err(Error::MissingRequired(slot.field.tag));
        }
    }
    Ok(())
}

fn decode_field(
    stream: &mut InputStream<'_>,
    wire_type: WireType,
    slot: &FieldSlot<'_>,
    rec: &mut Record<&mut [u8]>,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<()> {
    let field = slot.field;
    match field.ty.cardinality {
        Cardinality::Required => decode_value(stream, field, rec, slot.data, ctx),
        Cardinality::Optional => {
            if field.size_offset < 0 {
                rec.write_uint(slot.size, 1, 1)?;
            }
            decode_value(stream, field, rec, slot.data, ctx)
        }
        Cardinality::Array if wire_type == WireType::Len && field.ty.kind.is_packable() => {
            let mut sub = stream.substream()?;
            let mut count = rec.count(slot.size)?;
            while sub.bytes_left() > 0 {
                if count >= field.array_size {
                    codec_debug!(tag = field.tag, capacity = field.array_size, "packed array overflow");
                    return Err(Error::CapacityExceeded);
                }
                decode_value(&mut sub, field, rec, slot.data + count * field.data_size, ctx)?;
                count += 1;
            }
            codec_trace!(tag = field.tag, count, "packed array decoded");
            rec.set_count(slot.size, count)
        }
        Cardinality::Array => {
            let count = rec.count(slot.size)?;
            if count >= field.array_size {
                codec_debug!(tag = field.tag, capacity = field.array_size, "array full");
                return Err(Error::CapacityExceeded);
            }
            decode_value(stream, field, rec, slot.data + count * field.data_size, ctx)?;
            rec.set_count(slot.size, count + 1)
        }
        Cardinality::Callback => {
            let handle = rec.handle(slot.data)?;
            match lookup(ctx.callbacks, handle)? {
                Some(Callback::Decode(func)) => decode_callback(stream, wire_type, field, &mut **func),
                // Encode-only or absent callbacks leave the value unread
                _ => stream.skip_value(wire_type),
            }
        }
    }
}

fn decode_callback<F>(
    stream: &mut InputStream<'_>,
    wire_type: WireType,
    field: &FieldDescriptor,
    func: &mut F,
) -> Result<()>
where
    F: FnMut(&mut InputStream<'_>, &FieldDescriptor) -> Result<()> + ?Sized,
{
    if wire_type == WireType::Len {
        let mut sub = stream.substream()?;
        while sub.bytes_left() > 0 {
            let before = sub.bytes_left();
            func(&mut sub, field)?;
            if sub.bytes_left() == before {
                codec_debug!(tag = field.tag, "callback made no progress");
                return Err(Error::Callback);
            }
        }
        return Ok(());
    }

    let mut raw = [0u8; MAX_VARINT_LEN];
    let len = stream.read_raw_value(wire_type, &mut raw)?;
    let mut reader = SliceReader::new(&raw[..len]);
    let mut sub = InputStream::new(&mut reader, len);
    func(&mut sub, field)
}

/// Frees heap storage a decode left unused.
///
/// Heap-mode fields whose presence bit is clear are released, as are heap
/// array elements past the element count. Released slots are set to the null
/// handle, so running this twice is harmless. Present submessages, inline or
/// on the heap, are cleaned recursively.
#[cfg(feature = "alloc")]
pub fn release_unused(msg: &MessageDescriptor, dest: &mut [u8], heap: &mut Heap) -> Result<()> {
    release_record(msg, &mut Record::new_unchecked(dest), heap)
}

#[cfg(feature = "alloc")]
fn release_record(msg: &MessageDescriptor, rec: &mut Record<&mut [u8]>, heap: &mut Heap) -> Result<()> {
    rec.check_len(msg)?;
    for slot in msg.slots() {
        let field = slot.field;
        if !field.ty.is_heap() && field.ty.kind != WireKind::Submessage {
            continue;
        }
        let (used, slots) = match field.ty.cardinality {
            Cardinality::Callback => continue,
            Cardinality::Array => (rec.count(slot.size)?.min(field.array_size), field.array_size),
            _ => (usize::from(rec.has_field(slot.index)?), 1),
        };
        for i in 0..slots {
            let at = slot.data + i * field.data_size;
            if i >= used {
                if field.ty.is_heap() {
                    free_value(field, rec, at, heap)?;
                } else {
                    let sub = field.submessage().ok_or(Error::InvalidDescriptor)?;
                    free_nested(sub, &mut rec.sub_mut(at, field.data_size)?, heap)?;
                }
            } else if field.ty.kind == WireKind::Submessage {
                let sub = field.submessage().ok_or(Error::InvalidDescriptor)?;
                if !field.ty.is_heap() {
                    release_record(sub, &mut rec.sub_mut(at, field.data_size)?, heap)?;
                } else {
                    let handle = rec.handle(at)?;
                    if handle == 0 {
                        continue;
                    }
                    let mut image = heap
                        .replace(handle, alloc::vec::Vec::new())
                        .ok_or(Error::InvalidDescriptor)?;
                    let result = release_record(sub, &mut Record::new_unchecked(&mut image[..]), heap);
                    heap.replace(handle, image);
                    result?;
                }
            }
        }
    }
    Ok(())
}

/// Frees one heap slot and everything reachable from it.
#[cfg(feature = "alloc")]
fn free_value(field: &FieldDescriptor, rec: &mut Record<&mut [u8]>, at: usize, heap: &mut Heap) -> Result<()> {
    let handle = rec.handle(at)?;
    match field.ty.kind {
        WireKind::Bytes | WireKind::String => {}
        WireKind::Submessage => {
            let sub = field.submessage().ok_or(Error::InvalidDescriptor)?;
            if let Some(mut image) = heap.replace(handle, alloc::vec::Vec::new()) {
                free_nested(sub, &mut Record::new_unchecked(&mut image[..]), heap)?;
            }
        }
        _ => return Err(Error::InvalidDescriptor),
    }
    heap.free(handle);
    rec.set_handle(at, 0)
}

/// Frees every heap value inside a record that is itself being freed.
#[cfg(feature = "alloc")]
fn free_nested(msg: &MessageDescriptor, rec: &mut Record<&mut [u8]>, heap: &mut Heap) -> Result<()> {
    for slot in msg.slots() {
        let field = slot.field;
        let slots = match field.ty.cardinality {
            Cardinality::Callback => continue,
            Cardinality::Array => field.array_size,
            _ => 1,
        };
        for i in 0..slots {
            let at = slot.data + i * field.data_size;
            if field.ty.is_heap() {
                free_value(field, rec, at, heap)?;
            } else if field.ty.kind == WireKind::Submessage {
                let sub = field.submessage().ok_or(Error::InvalidDescriptor)?;
                free_nested(sub, &mut rec.sub_mut(at, field.data_size)?, heap)?;
            }
        }
    }
    Ok(())
}
