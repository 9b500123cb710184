//! Payload codecs: encode, decode, and order the elements of a dictionary.
//!
//! A [`PayloadCodec`] turns one logical payload into bytes and back. The
//! dictionary writers call [`PayloadCodec::encode`] after emitting the
//! 4-byte length-marker word (`0` for a present payload, `-1` for NULL, with
//! no payload bytes following a NULL); the readers call
//! [`PayloadCodec::decode`] with a window positioned at the payload's first
//! byte and the exact payload length.
//!
//! The NULL payload never reaches a codec: readers return `None` before
//! decoding and writers emit the marker without an encode call. `compare`
//! still receives optional payloads because NULL participates in dictionary
//! order as the minimum (nulls first).
//!
//! Codecs whose payloads borrow the decode window (the byte-slice codec)
//! express that through the `Payload<'a>` lifetime: the payload stays valid
//! for as long as the mapped bytes, not merely the reader.

pub mod block;
pub mod bytes;
pub mod string;

pub use block::{CompressedBlockCodec, DecompressedBlock};
pub use bytes::BytesCodec;
pub use string::StringCodec;

use crate::error::Result;
use crate::window::ByteWindow;
use std::cmp::Ordering;

/// Encode/decode/compare for one payload type.
pub trait PayloadCodec {
    /// The decoded payload. The lifetime ties window-borrowing payloads to
    /// the mapped bytes they alias; owning codecs ignore it.
    type Payload<'a>;

    /// Whether payloads carry a total order. Writers only track strict
    /// ascent (and thereby permit reverse lookup) when this is true.
    fn can_compare(&self) -> bool;

    /// Append the payload's byte representation to `out`. The length-marker
    /// word has already been written by the caller.
    fn encode(&self, payload: &Self::Payload<'_>, out: &mut Vec<u8>) -> Result<()>;

    /// Decode `n_bytes` starting at `window.position()`. Implementations may
    /// move the window's cursors but must not retain the window past return;
    /// a window-backed payload documents its zero-copy lifetime through
    /// `Payload<'a>`.
    fn decode<'a>(&self, window: &mut ByteWindow<'a>, n_bytes: usize) -> Result<Self::Payload<'a>>;

    /// Total order with NULL as the minimum.
    fn compare(&self, a: Option<&Self::Payload<'_>>, b: Option<&Self::Payload<'_>>) -> Ordering;

    /// True for the identity byte-slice codec: payloads are exactly the
    /// stored bytes and `compare` is the UTF-8 comparator. Readers use this
    /// to binary-search raw value windows without materializing payloads.
    fn is_identity_bytes(&self) -> bool {
        false
    }

    /// View a payload as its stored bytes, when the codec can do so without
    /// re-encoding. Identity byte-slice codecs return `Some`.
    fn raw_bytes_view<'p>(&self, _payload: &'p Self::Payload<'_>) -> Option<&'p [u8]> {
        None
    }
}

/// Nulls-first wrapper: compares two optional payloads given a comparator
/// for the present-present case.
#[inline]
pub(crate) fn compare_nulls_first<T>(
    a: Option<&T>,
    b: Option<&T>,
    cmp: impl FnOnce(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp(x, y),
    }
}
