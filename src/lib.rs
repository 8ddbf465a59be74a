#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

//! # tlv-codec
//!
//! This crate encodes and decodes messages in the Protocol Buffers
//! tag-length-value wire format. Message types are described by static
//! descriptor tables instead of generated per-type code, and message values
//! live in caller-owned byte images laid out as those tables describe. It is
//! designed to be used in embedded environments and is a `no_std` crate.
//!
//! ## Features
//!
//! - `no_std` compatible, no allocation on the inline-storage path
//! - Single-pass encoding back-to-front into a fixed buffer, with no length
//!   pre-computation for nested messages or packed arrays
//! - Required, optional, repeated (packed and unpacked) and callback fields
//! - Inline fixed-capacity storage or heap storage chosen per field
//!   (`alloc` feature)
//! - Structured diagnostics through `tracing` (`tracing` feature)
//!
//! ## Architecture
//!
//! - `field` - Descriptor tables and the common scalar entries
//! - `iter` - Offset computation while walking a descriptor table
//! - `record` - Zero-copy wrapper around a message image
//! - `stream` / `output` - Bounded input streams and the reverse output buffer
//! - `decode` / `encode` - The two engines
//! - `heap` - Arena for heap-mode fields
//!
//! ## Example
//!
//! ```
//! use tlv_codec::prelude::*;
//!
//! // bitmap(1) | padding(3) | id: i32 | #name(1) | name: [u8; 11]
//! static FIELDS: [FieldDescriptor; 2] = [
//!     common::REQUIRED_VARINT32.with_tag(1).with_data_offset(4),
//!     FieldDescriptor {
//!         tag: 2,
//!         ty: FieldType::new(Cardinality::Optional, WireKind::String),
//!         data_offset: 1,
//!         size_offset: -1,
//!         data_size: 11,
//!         array_size: 0,
//!         link: FieldLink::None,
//!     },
//! ];
//! static MSG: MessageDescriptor = MessageDescriptor::new(&FIELDS, 20);
//!
//! let mut image = [0u8; 20];
//! let mut record = Record::new_checked(&mut image[..], &MSG).unwrap();
//! record.set_has_field(0, true).unwrap();
//! record.set_has_field(1, true).unwrap();
//! record.write_int(4, 4, 150).unwrap();
//! record.set_string(9, 11, b"sensor").unwrap();
//!
//! let mut buffer = [0u8; 32];
//! let mut out = OutputBuffer::new(&mut buffer);
//! encode(&mut out, &MSG, &image).unwrap();
//! let wire = out.into_written();
//! assert_eq!(&wire[..3], [0x08, 0x96, 0x01]);
//!
//! let mut decoded = [0u8; 20];
//! let mut reader = SliceReader::new(wire);
//! let mut stream = InputStream::from_reader(&mut reader);
//! decode(&mut stream, &MSG, &mut decoded).unwrap();
//!
//! let record = Record::new_checked(&decoded[..], &MSG).unwrap();
//! assert_eq!(record.read_int(4, 4), Ok(150));
//! assert_eq!(record.string(9, 11), Ok(&b"sensor"[..]));
//! ```

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

/// Field callbacks for values handled outside the record.
pub mod callback;

/// Decode engine: stream to record.
pub mod decode;

/// Encode engine: record to buffer, back to front.
pub mod encode;

/// Error type for decode and encode failures.
pub mod error;

/// Field and message descriptors.
pub mod field;

/// Arena for heap-mode field storage.
#[cfg(feature = "alloc")]
pub mod heap;

/// Field iteration with incremental offset computation.
pub mod iter;

/// Back-to-front output buffer.
pub mod output;

/// Prelude module for convenient imports.
pub mod prelude;

/// Zero-copy wrapper around a record image.
pub mod record;

mod scalar;

/// Input streams and byte sources.
pub mod stream;

/// Varint and zigzag primitives.
pub mod varint;

/// Wire types and tag words.
pub mod wire;

#[cfg(test)]
mod fixtures;
