//! Field descriptor model.
//!
//! Descriptor tables are static constants produced by a schema compiler. Each
//! [`FieldDescriptor`] locates one field inside a record image relative to the
//! end of the previous field, so tables stay small and carry no absolute
//! offsets. [`FieldIter`](crate::iter::FieldIter) recovers absolute offsets by
//! walking the table.
//!
//! # Record image layout
//!
//! ```text
//! +----------------------+
//! | presence bitmap      |  ceil(field_count / 8) bytes, bit i = field i seen
//! +----------------------+
//! | field 0 value        |  at data_offset(0)
//! | (size slot)          |  at value + size_offset
//! +----------------------+
//! | field 1 value        |  at end(field 0) + data_offset(1)
//! | ...                  |
//! +----------------------+
//! ```
//!
//! All multi-byte values in an image are little-endian.

use crate::iter::{RevSlots, Slots};
use crate::wire::WireType;

/// Width of an array element count slot (u32, little-endian).
pub const COUNT_SIZE: usize = 4;

/// Width of a heap or callback handle slot (u32, little-endian, 0 = null).
pub const HANDLE_SIZE: usize = 4;

/// Width of the length header in front of inline bytes storage.
pub const LENGTH_PREFIX: usize = 4;

/// How many values a field carries and how presence is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one value; decode fails if it never arrives.
    Required,
    /// Zero or one value; the presence bit gates encoding.
    Optional,
    /// Up to `array_size` values with a count slot at `size_offset`.
    Array,
    /// Handled by a caller-registered function instead of storage.
    Callback,
}

/// Value representation on the wire and in the record image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// Plain varint: int32, int64, uint32, uint64, bool, enum.
    Varint,
    /// Zigzag-mapped varint.
    SignedVarint,
    /// 4 little-endian bytes: fixed32, sfixed32, float.
    Fixed32,
    /// 8 little-endian bytes: fixed64, sfixed64, double.
    Fixed64,
    /// Length-delimited raw bytes.
    Bytes,
    /// NUL-terminated in the image, length-delimited on the wire.
    String,
    /// A nested message with its own descriptor.
    Submessage,
}

impl WireKind {
    /// Scalar kinds that repeated fields encode as one packed run.
    pub const fn is_packable(self) -> bool {
        matches!(
            self,
            WireKind::Varint | WireKind::SignedVarint | WireKind::Fixed32 | WireKind::Fixed64
        )
    }

    /// Wire type of one value of this kind.
    pub const fn wire_type(self) -> WireType {
        match self {
            WireKind::Varint | WireKind::SignedVarint => WireType::Varint,
            WireKind::Fixed32 => WireType::Fixed32,
            WireKind::Fixed64 => WireType::Fixed64,
            WireKind::Bytes | WireKind::String | WireKind::Submessage => WireType::Len,
        }
    }
}

/// Where a field's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Fixed-capacity storage inside the record image.
    Inline,
    /// A handle slot in the image pointing at an owned value in a
    /// [`Heap`](crate::heap::Heap), sized to fit on decode.
    Heap,
}

/// The two axes of a field's type plus its storage strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    /// How many values the field holds.
    pub cardinality: Cardinality,
    /// How one value is encoded.
    pub kind: WireKind,
    /// Inline or heap storage.
    pub storage: Storage,
}

impl FieldType {
    /// An inline field type.
    pub const fn new(cardinality: Cardinality, kind: WireKind) -> Self {
        FieldType {
            cardinality,
            kind,
            storage: Storage::Inline,
        }
    }

    /// The same type with heap storage.
    pub const fn heap(self) -> Self {
        FieldType {
            storage: Storage::Heap,
            ..self
        }
    }

    /// Returns `true` for heap storage.
    pub const fn is_heap(&self) -> bool {
        matches!(self.storage, Storage::Heap)
    }
}

/// Static data a descriptor links to.
#[derive(Debug, Clone, Copy)]
pub enum FieldLink {
    /// Nothing linked.
    None,
    /// Image bytes copied into the slot when a record is initialized.
    Default(&'static [u8]),
    /// Descriptor of a submessage field's message type.
    Message(&'static MessageDescriptor),
}

/// Static description of one field of one message type.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Wire field number, unique within the message.
    pub tag: u32,
    /// Cardinality, kind and storage.
    pub ty: FieldType,
    /// Bytes from the end of the previous field to this field's value.
    pub data_offset: usize,
    /// Offset from the value to its size slot: negative for an optional
    /// presence flag stored before the value, positive for an array count
    /// stored after the elements.
    pub size_offset: isize,
    /// Size of one value (one element for arrays).
    pub data_size: usize,
    /// Element capacity for arrays; unused otherwise.
    pub array_size: usize,
    /// Submessage descriptor or static default, if any.
    pub link: FieldLink,
}

impl FieldDescriptor {
    /// Bytes the value storage spans in the image.
    pub const fn span(&self) -> usize {
        match self.ty.cardinality {
            Cardinality::Array => self.data_size * self.array_size,
            _ => self.data_size,
        }
    }

    /// The same descriptor with field number `tag`.
    pub const fn with_tag(self, tag: u32) -> Self {
        FieldDescriptor { tag, ..self }
    }

    /// The same descriptor placed `data_offset` bytes after the previous field.
    pub const fn with_data_offset(self, data_offset: usize) -> Self {
        FieldDescriptor {
            data_offset,
            ..self
        }
    }

    /// The same descriptor with a static default value.
    pub const fn with_default(self, default: &'static [u8]) -> Self {
        FieldDescriptor {
            link: FieldLink::Default(default),
            ..self
        }
    }

    /// The submessage descriptor, if this field links one.
    pub fn submessage(&self) -> Option<&'static MessageDescriptor> {
        match self.link {
            FieldLink::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// The static default image bytes, if this field has one.
    pub fn default_value(&self) -> Option<&'static [u8]> {
        match self.link {
            FieldLink::Default(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Static description of one message type.
#[derive(Debug)]
pub struct MessageDescriptor {
    /// Fields in image order.
    pub fields: &'static [FieldDescriptor],
    /// Total image size, used to allocate heap submessages.
    pub size: usize,
}

impl MessageDescriptor {
    /// Creates a descriptor over `fields` for an image of `size` bytes.
    pub const fn new(fields: &'static [FieldDescriptor], size: usize) -> Self {
        MessageDescriptor { fields, size }
    }

    /// Number of fields in the table.
    pub const fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Bytes taken by the presence bitmap at the start of the image.
    pub const fn presence_len(&self) -> usize {
        self.fields.len().div_ceil(8)
    }

    /// Walks every field once, in order, with its image offsets.
    pub fn slots(&self) -> Slots<'_> {
        Slots::new(self)
    }

    /// Walks every field once, last to first.
    pub fn slots_rev(&self) -> RevSlots<'_> {
        RevSlots::new(self)
    }
}

/// Precomputed descriptors for simple scalar fields whose previous field
/// ends aligned.
///
/// Generated tables copy one of these with [`FieldDescriptor::with_tag`]
/// instead of repeating the literal. Optional entries expect a presence flag
/// padded to the value's alignment directly in front of the value.
pub mod common {
    use super::*;

    const fn scalar(
        cardinality: Cardinality,
        kind: WireKind,
        data_offset: usize,
        size_offset: isize,
        data_size: usize,
    ) -> FieldDescriptor {
        FieldDescriptor {
            tag: 0,
            ty: FieldType::new(cardinality, kind),
            data_offset,
            size_offset,
            data_size,
            array_size: 0,
            link: FieldLink::None,
        }
    }

    use super::Cardinality::{Optional, Required};
    use super::WireKind::{Fixed32, Fixed64, SignedVarint, Varint};

    /// bool
    pub const REQUIRED_BOOL: FieldDescriptor = scalar(Required, Varint, 0, 0, 1);
    /// Optional bool, flag in the byte before the value
    pub const OPTIONAL_BOOL: FieldDescriptor = scalar(Optional, Varint, 1, -1, 1);
    /// int32, uint32, enum
    pub const REQUIRED_VARINT32: FieldDescriptor = scalar(Required, Varint, 0, 0, 4);
    /// Optional int32, uint32, enum
    pub const OPTIONAL_VARINT32: FieldDescriptor = scalar(Optional, Varint, 4, -4, 4);
    /// int64, uint64
    pub const REQUIRED_VARINT64: FieldDescriptor = scalar(Required, Varint, 0, 0, 8);
    /// Optional int64, uint64
    pub const OPTIONAL_VARINT64: FieldDescriptor = scalar(Optional, Varint, 4, -4, 8);
    /// sint32
    pub const REQUIRED_SINT32: FieldDescriptor = scalar(Required, SignedVarint, 0, 0, 4);
    /// Optional sint32
    pub const OPTIONAL_SINT32: FieldDescriptor = scalar(Optional, SignedVarint, 4, -4, 4);
    /// sint64
    pub const REQUIRED_SINT64: FieldDescriptor = scalar(Required, SignedVarint, 0, 0, 8);
    /// Optional sint64
    pub const OPTIONAL_SINT64: FieldDescriptor = scalar(Optional, SignedVarint, 4, -4, 8);
    /// fixed32, sfixed32, float
    pub const REQUIRED_FIXED32: FieldDescriptor = scalar(Required, Fixed32, 0, 0, 4);
    /// Optional fixed32, sfixed32, float
    pub const OPTIONAL_FIXED32: FieldDescriptor = scalar(Optional, Fixed32, 4, -4, 4);
    /// fixed64, sfixed64, double
    pub const REQUIRED_FIXED64: FieldDescriptor = scalar(Required, Fixed64, 0, 0, 8);
    /// Optional fixed64, sfixed64, double
    pub const OPTIONAL_FIXED64: FieldDescriptor = scalar(Optional, Fixed64, 4, -4, 8);

    /// All common entries, in (cardinality, kind) order.
    pub const COMMON_ALIGNED_FIELDS: [FieldDescriptor; 14] = [
        REQUIRED_BOOL,
        OPTIONAL_BOOL,
        REQUIRED_VARINT32,
        OPTIONAL_VARINT32,
        REQUIRED_VARINT64,
        OPTIONAL_VARINT64,
        REQUIRED_SINT32,
        OPTIONAL_SINT32,
        REQUIRED_SINT64,
        OPTIONAL_SINT64,
        REQUIRED_FIXED32,
        OPTIONAL_FIXED32,
        REQUIRED_FIXED64,
        OPTIONAL_FIXED64,
    ];
}
