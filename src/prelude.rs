//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate,
//! allowing for convenient glob imports:
//!
//! ```
//! use tlv_codec::prelude::*;
//! ```

pub use crate::callback::Callback;
#[cfg(feature = "alloc")]
pub use crate::decode::release_unused;
pub use crate::decode::{Decoder, decode};
pub use crate::encode::{Encoder, encode};
pub use crate::error::{Error, Result};
pub use crate::field::{
    Cardinality, FieldDescriptor, FieldLink, FieldType, HANDLE_SIZE, LENGTH_PREFIX,
    MessageDescriptor, Storage, WireKind, common,
};
#[cfg(feature = "alloc")]
pub use crate::heap::Heap;
pub use crate::output::OutputBuffer;
pub use crate::record::Record;
pub use crate::stream::{FnSource, InputStream, SliceReader, Source};
pub use crate::wire::WireType;
