//! Dictionary writers: stream an input sequence into a container.
//!
//! Both writers consume payloads one at a time, emit the length-marker word
//! plus encoded bytes into a growing value buffer, track the end offset of
//! every element, and watch for the first non-strict step in the codec's
//! order, which permanently withdraws reverse lookup for the built
//! dictionary. Version one finalizes a single self-describing blob; version
//! two finalizes a meta block plus named header and value files.

pub mod v1;
pub mod v2;

pub use v1::{build_v1, build_v1_compressed, DictWriterV1};
pub use v2::{build_v2, DictWriterV2, NamedFile, V2Build, DEFAULT_TARGET_PAGE_BYTES};

use crate::codec::PayloadCodec;
use crate::error::{DictError, Result};
use crate::format::NULL_MARKER;
use std::cmp::Ordering;

/// Streaming state shared by the two writers.
///
/// The `'s` lifetime lets zero-copy payloads borrowed from one source buffer
/// flow through `push` while the previous payload is retained for the
/// strict-ascent check. Scoped payloads are dropped, and thereby released,
/// when the next element replaces them.
pub(crate) struct ValueStream<'s, C: PayloadCodec> {
    pub(crate) codec: C,
    pub(crate) values_out: Vec<u8>,
    /// Global end offset of each element, markers included.
    pub(crate) end_offsets: Vec<u64>,
    pub(crate) count: usize,
    pub(crate) allow_reverse_lookup: bool,
    prev: Option<Option<C::Payload<'s>>>,
}

impl<'s, C: PayloadCodec> ValueStream<'s, C> {
    pub(crate) fn new(codec: C) -> Self {
        let allow_reverse_lookup = codec.can_compare();
        Self {
            codec,
            values_out: Vec::new(),
            end_offsets: Vec::new(),
            count: 0,
            allow_reverse_lookup,
            prev: None,
        }
    }

    pub(crate) fn push(&mut self, value: Option<C::Payload<'s>>) -> Result<()> {
        if self.count == i32::MAX as usize {
            return Err(DictError::too_large(
                "element count exceeds i32".to_string(),
            ));
        }
        self.count += 1;

        if self.allow_reverse_lookup {
            if let Some(prev) = &self.prev {
                if self.codec.compare(prev.as_ref(), value.as_ref()) != Ordering::Less {
                    self.allow_reverse_lookup = false;
                }
            }
        }

        match &value {
            Some(payload) => {
                self.values_out.extend_from_slice(&0i32.to_be_bytes());
                self.codec.encode(payload, &mut self.values_out)?;
            }
            None => self.values_out.extend_from_slice(&NULL_MARKER.to_be_bytes()),
        }
        self.end_offsets.push(self.values_out.len() as u64);

        self.prev = Some(value);
        Ok(())
    }
}
