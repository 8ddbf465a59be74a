/// Error type for decode and encode operations.
///
/// Every variant is terminal for the call that produced it: a failed decode
/// leaves the destination record in a state the caller must discard, and a
/// failed encode leaves the output buffer contents undefined.
///
/// # Examples
///
/// ```
/// use tlv_codec::error::Error;
/// use tlv_codec::stream::{InputStream, SliceReader};
///
/// // A varint whose continuation bit promises a byte that never comes
/// let data = [0x96u8];
/// let mut reader = SliceReader::new(&data);
/// let mut stream = InputStream::from_reader(&mut reader);
/// assert_eq!(stream.decode_varint(), Err(Error::Truncated));
/// ```
#[derive(PartialEq, Debug, Clone, Copy, Eq)]
pub enum Error {
    /// The stream ran out before the expected bytes.
    ///
    /// This occurs when:
    /// - A varint, fixed-width value or tag is cut short
    /// - A declared length exceeds the bytes left in the enclosing stream
    Truncated,

    /// A varint ran past 10 groups without terminating.
    InvalidVarint,

    /// Wire type outside {0, 1, 2, 5}.
    InvalidWireType(u8),

    /// Destination capacity exceeded.
    ///
    /// This occurs when:
    /// - A repeated field receives more elements than its array capacity
    /// - A string or bytes value is longer than its inline slot
    /// - A packed run holds more values than the array can take
    CapacityExceeded,

    /// The output buffer has no room for the next write.
    OutputFull,

    /// A required field had no wire entry. Carries the field tag.
    MissingRequired(u32),

    /// The descriptor cannot drive this operation.
    ///
    /// This occurs when:
    /// - A submessage field has no linked message descriptor
    /// - A required heap submessage is a null pointer at encode time
    /// - Heap storage is declared on a scalar kind
    InvalidDescriptor,

    /// The record image is smaller than the layout its descriptor describes.
    BufferTooShort,

    /// Heap storage could not be obtained for a heap-mode field.
    AllocationFailed,

    /// A field callback failed, consumed nothing, or has an unknown handle.
    Callback,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Truncated => write!(f, "stream ended before expected bytes"),
            Error::InvalidVarint => write!(f, "varint exceeds 10 bytes"),
            Error::InvalidWireType(t) => write!(f, "invalid wire type: {}", t),
            Error::CapacityExceeded => write!(f, "destination capacity exceeded"),
            Error::OutputFull => write!(f, "output buffer full"),
            Error::MissingRequired(tag) => write!(f, "missing required field: {}", tag),
            Error::InvalidDescriptor => write!(f, "invalid field descriptor"),
            Error::BufferTooShort => write!(f, "record buffer too short for layout"),
            Error::AllocationFailed => write!(f, "heap allocation failed"),
            Error::Callback => write!(f, "field callback failed"),
        }
    }
}

impl core::error::Error for Error {}

/// Result type alias using the crate's Error type.
pub type Result<T> = core::result::Result<T, Error>;
