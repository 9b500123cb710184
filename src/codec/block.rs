//! Compression adapter: a codec whose payloads are independently-compressed
//! byte blocks.
//!
//! The dictionary structure itself stays uncompressed; each element is a
//! zstd-compressed block that decodes to a scoped buffer. Dropping a
//! [`DecompressedBlock`] releases its memory on every exit path, so callers
//! can consume, copy, or abandon a block without a separate release step.
//!
//! Blocks carry no meaningful dictionary order (`can_compare` is false), so
//! block dictionaries never permit reverse lookup.

use super::PayloadCodec;
use crate::error::Result;
use crate::window::ByteWindow;
use std::cmp::Ordering;
use std::ops::Deref;

/// Default zstd level for block encoding, matching the level the segment
/// pipeline uses elsewhere.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// A decompressed block, released when dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressedBlock {
    bytes: Vec<u8>,
}

impl DecompressedBlock {
    /// Wrap raw uncompressed bytes (the write-side input).
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Deref for DecompressedBlock {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for DecompressedBlock {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Codec for dictionaries of compressed blocks.
///
/// `max_block_size` bounds the decompressed size of a single block and sizes
/// the decode buffer; decoding a block that inflates past it fails rather
/// than growing unbounded.
#[derive(Debug, Clone, Copy)]
pub struct CompressedBlockCodec {
    max_block_size: usize,
    level: i32,
}

impl CompressedBlockCodec {
    pub fn new(max_block_size: usize) -> Self {
        Self {
            max_block_size,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn with_level(max_block_size: usize, level: i32) -> Self {
        Self {
            max_block_size,
            level,
        }
    }
}

impl PayloadCodec for CompressedBlockCodec {
    type Payload<'a> = DecompressedBlock;

    fn can_compare(&self) -> bool {
        false
    }

    fn encode(&self, payload: &DecompressedBlock, out: &mut Vec<u8>) -> Result<()> {
        let compressed = zstd::bulk::compress(payload, self.level)?;
        out.extend_from_slice(&compressed);
        Ok(())
    }

    fn decode<'a>(
        &self,
        window: &mut ByteWindow<'a>,
        n_bytes: usize,
    ) -> Result<DecompressedBlock> {
        let compressed = window.take(n_bytes)?;
        let bytes = zstd::bulk::decompress(compressed, self.max_block_size)?;
        Ok(DecompressedBlock::new(bytes))
    }

    /// Blocks have no dictionary order; this compares decompressed bytes
    /// lexicographically for determinism only. `can_compare` is false, so
    /// writers never mark a block dictionary sorted.
    fn compare(
        &self,
        a: Option<&DecompressedBlock>,
        b: Option<&DecompressedBlock>,
    ) -> Ordering {
        super::compare_nulls_first(a, b, |x, y| x.bytes.cmp(&y.bytes))
    }
}
