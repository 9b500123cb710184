//! Error types for dictionary read and write operations.

use std::io;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, DictError>;

/// Dictionary error type.
///
/// Every failure is terminal for the operation that raised it; readers are
/// left in their pre-call state.
#[derive(Error, Debug)]
pub enum DictError {
    /// Positional access outside `[0, len)`.
    #[error("index {index} out of range for dictionary of {len} elements")]
    OutOfRange { index: usize, len: usize },

    /// Container version byte is not a supported version. `0x00` is reserved
    /// for the encoded-string dictionary format and is never valid here.
    #[error("unknown dictionary version {0:#04x}")]
    UnknownVersion(u8),

    /// A version-two container was opened without a file mapper.
    #[error("version 2 dictionary requires a file mapper")]
    MissingFileMapper,

    /// The file mapper could not produce a window for a named file.
    #[error("file mapping failed for {name}: {reason}")]
    FileMapping { name: String, reason: String },

    /// `index_of` on a dictionary that was not written in strictly ascending
    /// order.
    #[error("reverse lookup not allowed: dictionary was not written in strictly ascending order")]
    ReverseLookupUnsupported,

    /// `write_to`/`serialized_size` on a version-two reader. Version two is
    /// rebuilt through its writer, never re-serialized from a reader.
    #[error("serialization is not supported for version 2 dictionaries; use the v2 writer")]
    UnsupportedSerialization,

    /// Structural damage: offset monotonicity violated, bag-size math
    /// inconsistent with the element count, or a payload overrunning its
    /// buffer.
    #[error("corrupt dictionary: {0}")]
    Corrupt(String),

    /// Writer-side size overflow (offsets and counts are stored as i32).
    #[error("dictionary too large: {0}")]
    TooLarge(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DictError {
    /// Create a corrupt-data error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        DictError::Corrupt(msg.into())
    }

    /// Create a too-large error
    pub fn too_large(msg: impl Into<String>) -> Self {
        DictError::TooLarge(msg.into())
    }
}
