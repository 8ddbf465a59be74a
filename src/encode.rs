//! Encode engine.
//!
//! Fields are written last to first into an [`OutputBuffer`] that fills from
//! its end, and array elements last to first within each field. Every length
//! prefix is written after its payload, which by then is exactly the growth
//! of the buffer, and lands in front of it. The finished region reads in
//! canonical field order with no second pass.
//!
//! ```text
//! pass:    field 2 -> field 1 -> field 0
//! buffer:  [ free | tag0 val0 | tag1 len1 val1 | tag2 val2 ]
//! ```

use crate::callback::{Callback, lookup};
use crate::error::{Error, Result};
use crate::field::{Cardinality, MessageDescriptor, WireKind};
use crate::iter::FieldSlot;
use crate::output::OutputBuffer;
use crate::record::Record;
use crate::scalar::encode_value;
use crate::wire::WireType;

#[cfg(feature = "alloc")]
use crate::heap::Heap;

/// Per-call state threaded through nested encodes.
pub(crate) struct EncodeContext<'a, 'f> {
    callbacks: &'a mut [Callback<'f>],
    #[cfg(feature = "alloc")]
    pub(crate) heap: Option<&'a Heap>,
}

impl<'a, 'f> EncodeContext<'a, 'f> {
    pub(crate) fn new(callbacks: &'a mut [Callback<'f>]) -> Self {
        EncodeContext {
            callbacks,
            #[cfg(feature = "alloc")]
            heap: None,
        }
    }
}

/// Encodes the record image `src` into `out`.
///
/// Equivalent to [`Encoder::new`] followed by [`Encoder::encode`]. On
/// failure the contents of `out` are undefined.
///
/// # Examples
///
/// ```
/// use tlv_codec::encode::encode;
/// use tlv_codec::field::{MessageDescriptor, FieldDescriptor, common};
/// use tlv_codec::output::OutputBuffer;
///
/// static FIELDS: [FieldDescriptor; 1] = [common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4)];
/// static MSG: MessageDescriptor = MessageDescriptor::new(&FIELDS, 8);
///
/// let mut image = [0u8; 8];
/// image[4..].copy_from_slice(&150i32.to_le_bytes());
///
/// let mut buffer = [0u8; 16];
/// let mut out = OutputBuffer::new(&mut buffer);
/// encode(&mut out, &MSG, &image).unwrap();
/// assert_eq!(out.written(), [0x08, 0x96, 0x01]);
/// ```
pub fn encode(out: &mut OutputBuffer<'_>, msg: &MessageDescriptor, src: &[u8]) -> Result<()> {
    Encoder::new().encode(out, msg, src)
}

/// A configurable encode call.
#[derive(Debug, Default)]
pub struct Encoder<'a, 'f> {
    callbacks: &'a mut [Callback<'f>],
    #[cfg(feature = "alloc")]
    heap: Option<&'a Heap>,
}

impl<'a, 'f> Encoder<'a, 'f> {
    /// Creates an encoder with no callbacks and no heap.
    pub fn new() -> Self {
        Encoder {
            callbacks: Default::default(),
            #[cfg(feature = "alloc")]
            heap: None,
        }
    }

    /// Sets the table that callback handles in the record index into.
    pub fn with_callbacks(self, callbacks: &'a mut [Callback<'f>]) -> Self {
        Encoder { callbacks, ..self }
    }

    /// Sets the arena heap-mode field values are read from.
    #[cfg(feature = "alloc")]
    pub fn with_heap(self, heap: &'a Heap) -> Self {
        Encoder {
            heap: Some(heap),
            ..self
        }
    }

    /// Encodes the record image `src` into `out`.
    pub fn encode(&mut self, out: &mut OutputBuffer<'_>, msg: &MessageDescriptor, src: &[u8]) -> Result<()> {
        let mut ctx = EncodeContext {
            callbacks: &mut *self.callbacks,
            #[cfg(feature = "alloc")]
            heap: self.heap,
        };
        encode_record(out, msg, &Record::new_unchecked(src), &mut ctx)
    }
}

/// Encodes every field of `rec`, last field first.
pub(crate) fn encode_record(
    out: &mut OutputBuffer<'_>,
    msg: &MessageDescriptor,
    rec: &Record<&[u8]>,
    ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    rec.check_len(msg)?;

    for slot in msg.slots_rev() {
        let field = slot.field;
        match field.ty.cardinality {
            Cardinality::Optional => {
                if !rec.has_field(slot.index)? {
                    continue;
                }
                // A present but null heap string or submessage counts as absent
                if field.ty.is_heap()
                    && matches!(field.ty.kind, WireKind::String | WireKind::Submessage)
                    && rec.handle(slot.data)? == 0
                {
                    continue;
                }
                encode_value(out, field, rec, slot.data, ctx)?;
                out.write_tag_for_field(field)?;
            }
            Cardinality::Required => {
                encode_value(out, field, rec, slot.data, ctx)?;
                out.write_tag_for_field(field)?;
            }
            Cardinality::Array => encode_array(out, &slot, rec, ctx)?,
            Cardinality::Callback => {
                let handle = rec.handle(slot.data)?;
                if let Some(Callback::Encode(func)) = lookup(ctx.callbacks, handle)? {
                    func(out, field)?;
                }
            }
        }
    }
    Ok(())
}

fn encode_array(
    out: &mut OutputBuffer<'_>,
    slot: &FieldSlot<'_>,
    rec: &Record<&[u8]>,
    ctx: &mut EncodeContext<'_, '_>,
) -> Result<()> {
    let field = slot.field;
    let count = rec.count(slot.size)?;
    if count > field.array_size {
        codec_debug!(tag = field.tag, count, capacity = field.array_size, "array count over capacity");
        return Err(Error::CapacityExceeded);
    }
    if count == 0 {
        return Ok(());
    }

    let elements = (0..count).rev().map(|i| slot.data + i * field.data_size);
    if field.ty.kind.is_packable() {
        let start = out.len();
        for at in elements {
            encode_value(out, field, rec, at, ctx)?;
        }
        let len = out.len() - start;
        codec_trace!(tag = field.tag, count, len, "packed array encoded");
        out.write_varint(len as u64)?;
        out.write_tag(WireType::Len, field.tag)
    } else {
        for at in elements {
            encode_value(out, field, rec, at, ctx)?;
            out.write_tag_for_field(field)?;
        }
        Ok(())
    }
}
