//! Version-one writer: stream payloads into a single self-describing blob.

use super::ValueStream;
use crate::codec::{CompressedBlockCodec, DecompressedBlock, PayloadCodec};
use crate::error::{DictError, Result};
use crate::format::V1Meta;

/// Streaming builder for a version-one container.
///
/// Push each payload in order, then [`finish`](DictWriterV1::finish) to get
/// the complete container bytes: readable with
/// [`IndexedDict::read`](crate::read::IndexedDict::read), or appended
/// verbatim into a larger segment file.
pub struct DictWriterV1<'s, C: PayloadCodec> {
    stream: ValueStream<'s, C>,
}

impl<'s, C: PayloadCodec> DictWriterV1<'s, C> {
    pub fn new(codec: C) -> Self {
        Self {
            stream: ValueStream::new(codec),
        }
    }

    /// Elements consumed so far.
    pub fn count(&self) -> usize {
        self.stream.count
    }

    /// Append one payload (`None` for NULL).
    pub fn push(&mut self, value: Option<C::Payload<'s>>) -> Result<()> {
        self.stream.push(value)
    }

    /// Finalize the container: `[version, flag, num_bytes_used, n, end
    /// offsets, payload region]`, all big-endian.
    pub fn finish(self) -> Result<Vec<u8>> {
        let ValueStream {
            values_out,
            end_offsets,
            count,
            allow_reverse_lookup,
            ..
        } = self.stream;

        let header_len = count * 4;
        let num_bytes_used =
            i32::try_from(4 + header_len + values_out.len()).map_err(|_| {
                DictError::too_large(format!(
                    "v1 container of {} value bytes exceeds i32",
                    values_out.len()
                ))
            })?;

        let mut out = Vec::with_capacity(V1Meta::SIZE + header_len + values_out.len());
        V1Meta {
            allow_reverse_lookup,
            num_bytes_used,
            num_elements: count as i32,
        }
        .write(&mut out);
        for end in &end_offsets {
            // Fits: every end offset is bounded by the total checked above.
            out.extend_from_slice(&(*end as i32).to_be_bytes());
        }
        out.extend_from_slice(&values_out);

        tracing::debug!(
            n = count,
            sorted = allow_reverse_lookup,
            bytes = out.len(),
            "finalized v1 dictionary"
        );
        Ok(out)
    }
}

/// Build a version-one container from an input sequence.
pub fn build_v1<'s, C, I>(codec: C, items: I) -> Result<Vec<u8>>
where
    C: PayloadCodec,
    I: IntoIterator<Item = Option<C::Payload<'s>>>,
{
    let mut writer = DictWriterV1::new(codec);
    for item in items {
        writer.push(item)?;
    }
    writer.finish()
}

/// Build a version-one container of independently-compressed blocks.
///
/// Each input block is compressed through `codec`; the container structure
/// itself stays uncompressed. Blocks carry no dictionary order, so the
/// result never permits reverse lookup.
pub fn build_v1_compressed<I>(codec: CompressedBlockCodec, blocks: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut writer = DictWriterV1::new(codec);
    for block in blocks {
        writer.push(Some(DecompressedBlock::new(block)))?;
    }
    writer.finish()
}

// ============================================================================
// Tests
// ============================================================================
