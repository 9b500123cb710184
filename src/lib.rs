//! # flatdict
//!
//! Indexed flat-file dictionary for columnar segments: an immutable,
//! index-addressable collection of variable-length byte payloads with
//! constant-time positional lookup over memory-mapped buffers and
//! logarithmic reverse lookup (binary search) when the payloads were written
//! in strictly ascending order.
//!
//! Two container versions share one read surface:
//!
//! - **V1**: a single self-describing buffer holding the meta fields, the
//!   end-offset table, and the payload region.
//! - **V2**: a meta block plus a header file and N value files, each value
//!   file holding a power-of-two bag of elements; files are resolved by
//!   name through a [`FileMapper`].
//!
//! Payloads pass through a [`PayloadCodec`]; the byte-slice codec reads with
//! zero copying, returning slices that alias the mapped buffers. NULL is a
//! first-class element, distinguished from a present empty payload by the
//! on-disk length marker.
//!
//! ## Example
//!
//! ```
//! use flatdict::{build_v1, ByteWindow, Indexed, IndexedDict, StringCodec};
//!
//! let blob = build_v1(
//!     StringCodec,
//!     ["apple", "banana", "cherry"].into_iter().map(|s| Some(s.to_string())),
//! )?;
//!
//! let mut window = ByteWindow::new(&blob);
//! let dict = IndexedDict::read(&mut window, StringCodec)?;
//! assert_eq!(dict.get(1)?, Some("banana".to_string()));
//! assert_eq!(dict.index_of(Some(&"banana".to_string()))?, 1);
//! assert_eq!(dict.index_of(Some(&"blueberry".to_string()))?, -3);
//! # Ok::<(), flatdict::DictError>(())
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod mapper;
pub mod read;
pub mod window;
pub mod write;

// ── Errors ───────────────────────────────────────────────────────────────────
pub use error::{DictError, Result};

// ── Byte windows ─────────────────────────────────────────────────────────────
pub use window::{compare_utf8, compare_utf8_windows, ByteWindow};

// ── Codecs ───────────────────────────────────────────────────────────────────
pub use codec::{
    BytesCodec, CompressedBlockCodec, DecompressedBlock, PayloadCodec, StringCodec,
};

// ── Readers ──────────────────────────────────────────────────────────────────
pub use read::cursor::DictCursor;
pub use read::{DictV1, DictV2, Indexed, IndexedDict, ReadOptions};

// ── Writers ──────────────────────────────────────────────────────────────────
pub use write::{
    build_v1, build_v1_compressed, build_v2, DictWriterV1, DictWriterV2, NamedFile, V2Build,
    DEFAULT_TARGET_PAGE_BYTES,
};

// ── File mapping ─────────────────────────────────────────────────────────────
pub use mapper::{DirFileMapper, FileMapper, MemoryFileMapper};
