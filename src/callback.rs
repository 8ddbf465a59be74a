//! Field callbacks.
//!
//! A callback-cardinality field stores a [`HANDLE_SIZE`](crate::field::HANDLE_SIZE)
//! handle in its record slot. Handle 0 means no callback; handle `n` selects
//! entry `n - 1` of the callback table passed to the
//! [`Decoder`](crate::decode::Decoder) or [`Encoder`](crate::encode::Encoder).
//! Whatever the closure captures plays the role of the callback argument.
//!
//! # Examples
//!
//! ```
//! use tlv_codec::callback::Callback;
//! use tlv_codec::stream::InputStream;
//! use tlv_codec::field::FieldDescriptor;
//! use tlv_codec::error::Result;
//!
//! let mut sum = 0u64;
//! let mut add = |stream: &mut InputStream<'_>, _: &FieldDescriptor| -> Result<()> {
//!     sum += stream.decode_varint()?;
//!     Ok(())
//! };
//! let callbacks = [Callback::Decode(&mut add)];
//! assert!(callbacks[0].is_decode());
//! ```

use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::output::OutputBuffer;
use crate::stream::InputStream;
use core::fmt;

/// A caller-supplied routine that handles one field.
pub enum Callback<'f> {
    /// Called with a stream bounded to one wire value. For length-delimited
    /// values it is called repeatedly until that stream is drained.
    Decode(&'f mut dyn FnMut(&mut InputStream<'_>, &FieldDescriptor) -> Result<()>),
    /// Called with the live output buffer. It writes its own tags and may
    /// emit any number of values, last value first.
    Encode(&'f mut dyn FnMut(&mut OutputBuffer<'_>, &FieldDescriptor) -> Result<()>),
}

impl Callback<'_> {
    /// Returns `true` for a decode callback.
    pub fn is_decode(&self) -> bool {
        matches!(self, Callback::Decode(_))
    }

    /// Returns `true` for an encode callback.
    pub fn is_encode(&self) -> bool {
        matches!(self, Callback::Encode(_))
    }
}

impl fmt::Debug for Callback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callback::Decode(_) => write!(f, "Callback::Decode"),
            Callback::Encode(_) => write!(f, "Callback::Encode"),
        }
    }
}

/// Resolves a record handle against a callback table.
///
/// Handle 0 yields `None`; a handle past the end of the table is an error.
pub(crate) fn lookup<'c, 'f>(
    callbacks: &'c mut [Callback<'f>],
    handle: u32,
) -> Result<Option<&'c mut Callback<'f>>> {
    match (handle as usize).checked_sub(1) {
        None => Ok(None),
        Some(index) => callbacks
            .get_mut(index)
            .map(Some)
            .ok_or(Error::Callback),
    }
}
