//! Single-threaded dictionary cursor.
//!
//! [`IndexedDict::get`] duplicates its value window on every call so the
//! reader can serve concurrent callers. A [`DictCursor`] pre-duplicates one
//! cursor per value file and reuses it, trading that safety for per-access
//! cheapness: every method takes `&mut self`, so a cursor belongs to one
//! logical caller at a time and the previous raw window's cursors are
//! overwritten by the next access. Payload bytes themselves alias the
//! immutable mapping and remain valid.
//!
//! When the codec is the identity byte-slice codec, `index_of` compares raw
//! value windows with the UTF-8 comparator and never materializes a decoded
//! payload. This is the hot path for ingested-string binary search.

use super::{binary_search, Indexed, IndexedDict};
use crate::codec::{compare_nulls_first, PayloadCodec};
use crate::error::{DictError, Result};
use crate::format::NULL_MARKER;
use crate::window::{compare_utf8, ByteWindow};

impl<'a, C: PayloadCodec> IndexedDict<'a, C> {
    /// Create a non-shared cursor over this dictionary. May perform better
    /// than the underlying reader for tight index-ordered or search-heavy
    /// loops.
    pub fn single_threaded(&self) -> DictCursor<'_, 'a, C> {
        DictCursor {
            dict: self,
            windows: self.duplicate_value_windows(),
            last_value_size: 0,
        }
    }
}

/// Non-shared accelerator reusing one duplicated window per value file.
pub struct DictCursor<'r, 'a, C: PayloadCodec> {
    dict: &'r IndexedDict<'a, C>,
    windows: Vec<ByteWindow<'a>>,
    last_value_size: usize,
}

impl<'r, 'a, C: PayloadCodec> DictCursor<'r, 'a, C> {
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.dict.is_sorted()
    }

    /// Payload at `index`, decoding through the codec.
    pub fn get(&mut self, index: usize) -> Result<Option<C::Payload<'a>>> {
        match self.get_window(index)? {
            None => Ok(None),
            Some(mut window) => {
                // The codec sees a window whose limit equals its capacity
                // and takes the payload length as an explicit argument.
                let n_bytes = window.remaining();
                window.set_limit(window.capacity());
                self.dict.codec().decode(&mut window, n_bytes).map(Some)
            }
        }
    }

    /// Raw window over the payload at `index`, positioned `[start, end)`,
    /// or `None` for NULL. Skips the codec entirely.
    pub fn get_window(&mut self, index: usize) -> Result<Option<ByteWindow<'a>>> {
        let (file_num, start, end) = self.dict.locate(index)?;
        let options = self.dict.options();
        let window = &mut self.windows[file_num];

        let size = end - start;
        if size == 0
            && (options.replace_empty_with_null || window.i32_be_at(start - 4)? == NULL_MARKER)
        {
            return Ok(None);
        }
        // Limit before position: shrinking the limit pulls a stale position
        // back into range.
        window.set_limit(end);
        window.set_position(start);
        self.last_value_size = size;
        Ok(Some(window.duplicate()))
    }

    /// Length in bytes of the most recent non-NULL read.
    pub fn last_value_size(&self) -> usize {
        self.last_value_size
    }

    /// Binary-search for `value` with the same contract as
    /// [`Indexed::index_of`]. Identity byte-slice codecs are searched over
    /// raw windows without decoding.
    pub fn index_of(&mut self, value: Option<&C::Payload<'_>>) -> Result<isize> {
        if !self.dict.is_sorted() {
            return Err(DictError::ReverseLookupUnsupported);
        }
        if self.dict.codec().is_identity_bytes() {
            let probe: Option<&[u8]> = match value {
                None => None,
                Some(payload) => match self.dict.codec().raw_bytes_view(payload) {
                    Some(bytes) => Some(bytes),
                    None => return self.index_of_decoded(value),
                },
            };
            let len = self.dict.len();
            return binary_search(len, |mid| {
                let curr = self.get_window(mid)?.map(|w| w.window_bytes());
                Ok(compare_nulls_first(curr.as_ref(), probe.as_ref(), |x, y| {
                    compare_utf8(x, y)
                }))
            });
        }
        self.index_of_decoded(value)
    }

    fn index_of_decoded(&mut self, value: Option<&C::Payload<'_>>) -> Result<isize> {
        let len = self.dict.len();
        binary_search(len, |mid| {
            let curr = self.get(mid)?;
            Ok(self.dict.codec().compare(curr.as_ref(), value))
        })
    }
}
