//! Version-two writer: stream payloads into a meta block plus named header
//! and value files.
//!
//! Values buffer into one stream while writing; at finalization the writer
//! picks the bag exponent from `target_page_size` (`ceil(log2(c))` where
//! `c` is the number of leading entries that fit the target) and cuts the
//! stream into value files of exactly `1 << exponent` entries (the last may
//! be shorter). The header file stores each element's end offset in native
//! byte order, restarting the origin at 4 within every value file; it is
//! therefore not portable across heterogeneous-endian deployments.

use super::ValueStream;
use crate::codec::PayloadCodec;
use crate::error::{DictError, Result};
use crate::format::{
    files_required, header_file_name, value_file_name, V2Meta, MAX_BAG_EXPONENT, MIN_BAG_EXPONENT,
};
use crate::mapper::MemoryFileMapper;
use std::path::Path;

/// Default byte target for one value file.
pub const DEFAULT_TARGET_PAGE_BYTES: usize = 1 << 20;

// ============================================================================
// Build output
// ============================================================================

/// One output artifact of a version-two build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A finalized version-two dictionary: the meta block plus the named files
/// a reader will request from its mapper.
///
/// The meta block is not a named file: it belongs to the owning column's
/// descriptor, ahead of wherever the caller embeds it. `files` holds the
/// value files in order followed by the header file, but every file is
/// addressed by name, never by position.
#[derive(Debug, Clone)]
pub struct V2Build {
    pub meta: Vec<u8>,
    pub files: Vec<NamedFile>,
    pub allow_reverse_lookup: bool,
    pub exponent: u32,
    pub num_elements: usize,
}

impl V2Build {
    /// In-process mapper over the built files, for reading back a
    /// dictionary that was never persisted.
    pub fn to_mapper(&self) -> MemoryFileMapper {
        let mut mapper = MemoryFileMapper::new();
        for file in &self.files {
            mapper.insert(file.name.clone(), file.bytes.clone());
        }
        mapper
    }

    /// Write every named file into `dir`. The meta block stays with the
    /// caller.
    pub fn persist(&self, dir: &Path) -> std::io::Result<()> {
        for file in &self.files {
            std::fs::write(dir.join(&file.name), &file.bytes)?;
        }
        Ok(())
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Streaming builder for a version-two container.
pub struct DictWriterV2<'s, C: PayloadCodec> {
    stream: ValueStream<'s, C>,
    column_name: String,
    target_page_size: usize,
}

impl<'s, C: PayloadCodec> DictWriterV2<'s, C> {
    pub fn new(codec: C, column_name: impl Into<String>, target_page_size: usize) -> Self {
        Self {
            stream: ValueStream::new(codec),
            column_name: column_name.into(),
            target_page_size,
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

    /// Finalize into the meta block and named files.
    pub fn finish(self) -> Result<V2Build> {
        let ValueStream {
            values_out,
            end_offsets,
            count,
            allow_reverse_lookup,
            ..
        } = self.stream;

        let exponent = choose_exponent(&end_offsets, self.target_page_size);
        let elements_per_file = 1usize << exponent;
        let num_files = files_required(count, elements_per_file);

        let mut header = Vec::with_capacity(count * 4);
        let mut files = Vec::with_capacity(num_files + 1);
        for file_num in 0..num_files {
            let first = file_num * elements_per_file;
            let last = ((file_num + 1) * elements_per_file).min(count);
            let file_base = if first == 0 {
                0
            } else {
                end_offsets[first - 1]
            };
            let file_end = end_offsets[last - 1];

            for &end in &end_offsets[first..last] {
                let local_end = i32::try_from(end - file_base).map_err(|_| {
                    DictError::too_large(format!(
                        "value file {} of column {} exceeds i32 bytes",
                        file_num, self.column_name
                    ))
                })?;
                header.extend_from_slice(&local_end.to_ne_bytes());
            }

            files.push(NamedFile {
                name: value_file_name(&self.column_name, file_num),
                bytes: values_out[file_base as usize..file_end as usize].to_vec(),
            });
        }
        files.push(NamedFile {
            name: header_file_name(&self.column_name),
            bytes: header,
        });

        let mut meta = Vec::new();
        V2Meta {
            allow_reverse_lookup,
            exponent,
            num_elements: count as i32,
            column_name: self.column_name.clone(),
        }
        .write(&mut meta)?;

        tracing::info!(
            column = %self.column_name,
            n = count,
            exponent,
            files = num_files,
            sorted = allow_reverse_lookup,
            "finalized v2 dictionary"
        );
        Ok(V2Build {
            meta,
            files,
            allow_reverse_lookup,
            exponent,
            num_elements: count,
        })
    }
}

/// Bag exponent from the byte target: `ceil(log2(c))` over the `c` leading
/// entries that fit, clamped to the format's exponent range.
fn choose_exponent(end_offsets: &[u64], target_page_size: usize) -> u32 {
    if end_offsets.is_empty() {
        return MIN_BAG_EXPONENT;
    }
    let target = target_page_size as u64;
    let mut fitting = end_offsets.partition_point(|&end| end <= target);
    if fitting == 0 {
        tracing::warn!(
            first_entry_bytes = end_offsets[0],
            target_page_size,
            "single entry exceeds the target page size"
        );
        fitting = 1;
    }
    ceil_log2(fitting).clamp(MIN_BAG_EXPONENT, MAX_BAG_EXPONENT)
}

fn ceil_log2(n: usize) -> u32 {
    (n.max(1) as u64).next_power_of_two().trailing_zeros()
}

/// Build a version-two container from an input sequence.
pub fn build_v2<'s, C, I>(
    codec: C,
    column_name: &str,
    target_page_size: usize,
    items: I,
) -> Result<V2Build>
where
    C: PayloadCodec,
    I: IntoIterator<Item = Option<C::Payload<'s>>>,
{
    let mut writer = DictWriterV2::new(codec, column_name, target_page_size);
    for item in items {
        writer.push(item)?;
    }
    writer.finish()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::format::VERSION_TWO;
    use crate::read::{Indexed, IndexedDict};
    use crate::window::ByteWindow;

    fn letters() -> impl Iterator<Item = Option<String>> {
        ["a", "b", "c", "d", "e"].into_iter().map(|s| Some(s.to_string()))
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(1024), 10);
    }

    #[test]
    fn test_exponent_one_splits_into_three_files() {
        // Each entry is 5 bytes (marker + one letter); a target of 11 bytes
        // fits exactly two entries.
        let build = build_v2(StringCodec, "col", 11, letters()).unwrap();
        assert_eq!(build.exponent, 1);
        assert_eq!(build.num_elements, 5);

        // Three value files of 2, 2, 1 entries (10, 10, 5 bytes) + header.
        assert_eq!(build.files.len(), 4);
        assert_eq!(build.files[0].name, "col_value_0");
        assert_eq!(build.files[0].bytes.len(), 10);
        assert_eq!(build.files[1].bytes.len(), 10);
        assert_eq!(build.files[2].bytes.len(), 5);
        assert_eq!(build.files[3].name, "col_header");

        // Header offsets restart at every file: 5, 10, 5, 10, 5.
        let header = &build.files[3].bytes;
        let offsets: Vec<i32> = header
            .chunks(4)
            .map(|c| i32::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(offsets, vec![5, 10, 5, 10, 5]);
    }

    #[test]
    fn test_reads_back_through_mapper() {
        let build = build_v2(StringCodec, "col", 11, letters()).unwrap();
        let mapper = build.to_mapper();
        let mut w = ByteWindow::new(&build.meta);
        let dict = IndexedDict::read_with_mapper(&mut w, StringCodec, &mapper).unwrap();

        assert_eq!(dict.version(), VERSION_TWO);
        assert_eq!(dict.column_name(), Some("col"));
        assert_eq!(dict.len(), 5);
        // Index 3 lives in file 1 at relative index 1.
        assert_eq!(dict.get(3).unwrap(), Some("d".to_string()));
        assert!(dict.is_sorted());
        assert_eq!(dict.index_of(Some(&"d".to_string())).unwrap(), 3);
    }

    #[test]
    fn test_single_file_when_everything_fits() {
        let build = build_v2(StringCodec, "col", 1 << 20, letters()).unwrap();
        // ceil(log2(5)) = 3: one bag of 8 holds all five elements.
        assert_eq!(build.exponent, 3);
        assert_eq!(build.files.len(), 2);
    }

    #[test]
    fn test_oversized_entry_falls_back_to_min_exponent() {
        let big = "x".repeat(64);
        let build = build_v2(
            StringCodec,
            "col",
            16,
            [Some(big.clone()), Some(format!("{}y", big))],
        )
        .unwrap();
        assert_eq!(build.exponent, MIN_BAG_EXPONENT);
    }

    #[test]
    fn test_empty_input() {
        let build = build_v2(StringCodec, "col", 1 << 20, std::iter::empty::<Option<String>>())
            .unwrap();
        assert_eq!(build.num_elements, 0);
        assert_eq!(build.files.len(), 1, "header file only");
        assert_eq!(build.files[0].name, "col_header");
        assert!(build.files[0].bytes.is_empty());

        let mapper = build.to_mapper();
        let mut w = ByteWindow::new(&build.meta);
        let dict = IndexedDict::read_with_mapper(&mut w, StringCodec, &mapper).unwrap();
        assert_eq!(dict.len(), 0);
        assert!(matches!(
            dict.get(0),
            Err(DictError::OutOfRange { index: 0, len: 0 })
        ));
        assert_eq!(dict.index_of(Some(&"a".to_string())).unwrap(), -1);
    }

    #[test]
    fn test_nulls_and_empties_round_trip() {
        let items = vec![
            Some(String::new()),
            None,
            Some("x".to_string()),
            None,
            Some("zebra".to_string()),
        ];
        let build = build_v2(StringCodec, "col", 12, items.clone()).unwrap();
        assert!(!build.allow_reverse_lookup, "null after value is a descent");

        let mapper = build.to_mapper();
        let mut w = ByteWindow::new(&build.meta);
        let dict = IndexedDict::read_with_mapper(&mut w, StringCodec, &mapper).unwrap();
        for (i, expected) in items.iter().enumerate() {
            assert_eq!(&dict.get(i).unwrap(), expected, "index {}", i);
        }
    }

    #[test]
    fn test_missing_value_file_is_mapping_failure() {
        let build = build_v2(StringCodec, "col", 11, letters()).unwrap();
        let mut mapper = MemoryFileMapper::new();
        for file in &build.files {
            if file.name != "col_value_1" {
                mapper.insert(file.name.clone(), file.bytes.clone());
            }
        }
        let mut w = ByteWindow::new(&build.meta);
        let err = IndexedDict::read_with_mapper(&mut w, StringCodec, &mapper).unwrap_err();
        assert!(
            matches!(err, DictError::FileMapping { ref name, .. } if name == "col_value_1")
        );
    }
}
