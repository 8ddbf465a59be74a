//! Hand-written descriptor tables shared by the engine tests.
//!
//! Layout comments list `name @offset` for every value slot, with `#` for
//! presence flags and element counts.

use crate::callback::Callback;
use crate::error::Result;
use crate::field::Cardinality::{Array, Callback as CallbackField, Optional, Required};
use crate::field::WireKind::{Bytes, SignedVarint, String, Submessage, Varint};
use crate::field::{
    Cardinality, FieldDescriptor, FieldLink, FieldType, HANDLE_SIZE, LENGTH_PREFIX,
    MessageDescriptor, WireKind, common,
};
use crate::output::OutputBuffer;
use crate::stream::{InputStream, SliceReader};

const fn field(
    tag: u32,
    cardinality: Cardinality,
    kind: WireKind,
    data_offset: usize,
    size_offset: isize,
    data_size: usize,
    array_size: usize,
) -> FieldDescriptor {
    FieldDescriptor {
        tag,
        ty: FieldType::new(cardinality, kind),
        data_offset,
        size_offset,
        data_size,
        array_size,
        link: FieldLink::None,
    }
}

const fn heap(field: FieldDescriptor) -> FieldDescriptor {
    FieldDescriptor {
        ty: field.ty.heap(),
        ..field
    }
}

const fn linked(field: FieldDescriptor, msg: &'static MessageDescriptor) -> FieldDescriptor {
    FieldDescriptor {
        link: FieldLink::Message(msg),
        ..field
    }
}

// bitmap @0 | value: i32 @4
pub static SIMPLE_FIELDS: [FieldDescriptor; 1] =
    [common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4)];
pub static SIMPLE: MessageDescriptor = MessageDescriptor::new(&SIMPLE_FIELDS, 8);

// bitmap @0 | #text @1 | text: [u8; 8] @2
pub static LABEL_FIELDS: [FieldDescriptor; 1] = [field(2, Optional, String, 2, -1, 8, 0)];
pub static LABEL: MessageDescriptor = MessageDescriptor::new(&LABEL_FIELDS, 10);

pub const PHONE_MOBILE: i32 = 0;
pub const PHONE_HOME: i32 = 1;
pub const PHONE_WORK: i32 = 2;

static PHONE_HOME_DEFAULT: [u8; 4] = PHONE_HOME.to_le_bytes();

// bitmap @0 | number: [u8; 16] @1 | #kind @20 | kind: i32 @24
pub static PHONE_FIELDS: [FieldDescriptor; 2] = [
    field(1, Required, String, 1, 0, 16, 0),
    common::OPTIONAL_VARINT32
        .with_tag(2)
        .with_data_offset(7)
        .with_default(&PHONE_HOME_DEFAULT),
];
pub static PHONE: MessageDescriptor = MessageDescriptor::new(&PHONE_FIELDS, 28);

pub const PERSON_NAME: usize = 1;
pub const PERSON_ID: usize = 36;
pub const PERSON_EMAIL: usize = 41;
pub const PERSON_PHONES: usize = 76;
pub const PERSON_PHONE_COUNT: usize = 188;

// bitmap @0 | name: [u8; 32] @1 | id: i32 @36 | #email @40 | email: [u8; 32] @41
// | phones: [Phone; 4] @76 | #phones @188
pub static PERSON_FIELDS: [FieldDescriptor; 4] = [
    field(1, Required, String, 1, 0, 32, 0),
    common::REQUIRED_VARINT32.with_tag(2).with_data_offset(3),
    field(3, Optional, String, 1, -1, 32, 0),
    linked(field(4, Array, Submessage, 3, 112, 28, 4), &PHONE),
];
pub static PERSON: MessageDescriptor = MessageDescriptor::new(&PERSON_FIELDS, 192);

pub const ALL_INT32: usize = 4;
pub const ALL_SINT64: usize = 8;
pub const ALL_FLOAT: usize = 16;
pub const ALL_DOUBLE: usize = 20;
pub const ALL_BOOL: usize = 28;
pub const ALL_BLOB: usize = 30;
pub const ALL_NUMBERS: usize = 44;
pub const ALL_NUMBER_COUNT: usize = 64;
pub const ALL_WORDS: usize = 68;
pub const ALL_WORD_COUNT: usize = 92;
pub const ALL_DELTAS: usize = 96;
pub const ALL_DELTA_COUNT: usize = 112;

// bitmap @0 | int32 @4 | sint64 @8 | float @16 | double @20 | bool @28
// | #blob @29 | blob: bytes[8] @30 | numbers: [i32; 5] @44 | #numbers @64
// | words: [[u8; 8]; 3] @68 | #words @92 | deltas: [sint32; 4] @96 | #deltas @112
pub static ALL_FIELDS: [FieldDescriptor; 9] = [
    common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4),
    common::REQUIRED_SINT64.with_tag(2),
    common::REQUIRED_FIXED32.with_tag(3),
    common::REQUIRED_FIXED64.with_tag(4),
    common::REQUIRED_BOOL.with_tag(5),
    field(6, Optional, Bytes, 1, -1, LENGTH_PREFIX + 8, 0),
    field(7, Array, Varint, 2, 20, 4, 5),
    field(8, Array, String, 4, 24, 8, 3),
    field(9, Array, SignedVarint, 4, 16, 4, 4),
];
pub static ALL: MessageDescriptor = MessageDescriptor::new(&ALL_FIELDS, 116);

// bitmap @0 | values: [i32; 5] @4 | #values @24
pub static NUMBERS_FIELDS: [FieldDescriptor; 1] = [field(1, Array, Varint, 4, 20, 4, 5)];
pub static NUMBERS: MessageDescriptor = MessageDescriptor::new(&NUMBERS_FIELDS, 28);

pub const CALLBACK_SLOT: usize = 8;

// bitmap @0 | id: i32 @4 | handler: handle @8
pub static WITH_CALLBACK_FIELDS: [FieldDescriptor; 2] = [
    common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4),
    field(2, CallbackField, Bytes, 0, 0, HANDLE_SIZE, 0),
];
pub static WITH_CALLBACK: MessageDescriptor = MessageDescriptor::new(&WITH_CALLBACK_FIELDS, 12);

pub const HEAP_NAME: usize = 4;
pub const HEAP_BLOB: usize = 8;
pub const HEAP_CHILD: usize = 12;
pub const HEAP_TAGS: usize = 16;
pub const HEAP_TAG_COUNT: usize = 28;

// bitmap @0 | name: handle @4 | blob: handle @8 | child: handle -> Simple @12
// | tags: [handle; 3] @16 | #tags @28
pub static HEAP_FIELDS: [FieldDescriptor; 4] = [
    heap(field(1, Required, String, 4, 0, HANDLE_SIZE, 0)),
    heap(field(2, Optional, Bytes, 0, 0, HANDLE_SIZE, 0)),
    heap(linked(field(3, Optional, Submessage, 0, 0, HANDLE_SIZE, 0), &SIMPLE)),
    heap(field(4, Array, String, 0, 12, HANDLE_SIZE, 3)),
];
pub static HEAP_MSG: MessageDescriptor = MessageDescriptor::new(&HEAP_FIELDS, 32);

// bitmap @0 | inner: handle -> HeapMsg @4
pub static OUTER_FIELDS: [FieldDescriptor; 1] =
    [heap(linked(field(1, Optional, Submessage, 4, 0, HANDLE_SIZE, 0), &HEAP_MSG))];
pub static OUTER: MessageDescriptor = MessageDescriptor::new(&OUTER_FIELDS, 8);

pub const INNER_NAME: usize = 4;

// bitmap @0 | name: handle @4
pub static INNER_FIELDS: [FieldDescriptor; 1] =
    [heap(field(1, Optional, String, 4, 0, HANDLE_SIZE, 0))];
pub static INNER: MessageDescriptor = MessageDescriptor::new(&INNER_FIELDS, 8);

pub const WRAP_INNER: usize = 4;
pub const WRAP_ITEMS: usize = 12;
pub const WRAP_ITEM_COUNT: usize = 28;

// bitmap @0 | inner: Inner @4 | items: [Inner; 2] @12 | #items @28
pub static WRAP_FIELDS: [FieldDescriptor; 2] = [
    linked(field(1, Optional, Submessage, 4, 0, 8, 0), &INNER),
    linked(field(2, Array, Submessage, 0, 16, 8, 2), &INNER),
];
pub static WRAP: MessageDescriptor = MessageDescriptor::new(&WRAP_FIELDS, 32);

/// Decodes `wire` into `image` with the given callbacks and no heap.
pub fn decode_with(
    msg: &MessageDescriptor,
    wire: &[u8],
    image: &mut [u8],
    callbacks: &mut [Callback<'_>],
) -> Result<()> {
    let mut reader = SliceReader::new(wire);
    let mut stream = InputStream::from_reader(&mut reader);
    crate::decode::Decoder::new()
        .with_callbacks(callbacks)
        .decode(&mut stream, msg, image)
}

pub fn decode_bytes(msg: &MessageDescriptor, wire: &[u8], image: &mut [u8]) -> Result<()> {
    decode_with(msg, wire, image, &mut [])
}

/// Encodes `image` into a fresh 256-byte buffer.
pub fn encode_with(
    msg: &MessageDescriptor,
    image: &[u8],
    callbacks: &mut [Callback<'_>],
) -> Result<Vec<u8>> {
    let mut buffer = [0u8; 256];
    let mut out = OutputBuffer::new(&mut buffer);
    crate::encode::Encoder::new()
        .with_callbacks(callbacks)
        .encode(&mut out, msg, image)?;
    Ok(out.written().to_vec())
}

pub fn encode_to_vec(msg: &MessageDescriptor, image: &[u8]) -> Result<Vec<u8>> {
    encode_with(msg, image, &mut [])
}

/// Appends a varint to `wire`, for building test inputs.
pub fn push_varint(wire: &mut Vec<u8>, value: u64) {
    let mut buf = [0u8; crate::varint::MAX_VARINT_LEN];
    let len = crate::varint::encode_varint(value, &mut buf);
    wire.extend_from_slice(&buf[..len]);
}
