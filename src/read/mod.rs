//! Dictionary readers: positional access and binary search over mapped
//! containers.
//!
//! A dictionary is read either from a single version-one buffer or from a
//! version-two file set (meta block + header file + value files). Both
//! variants sit behind [`IndexedDict`], which shares the codec, the
//! null-marker discrimination, and the search loop between them.
//!
//! Readers never own the backing bytes: every window borrows from the
//! caller's buffer or from a [`FileMapper`](crate::mapper::FileMapper), and
//! zero-copy payloads stay valid for that backing's lifetime. `get` is pure
//! and duplicates its window cursor per call, so one reader can serve
//! concurrent readers; the single-threaded accelerator lives in
//! [`cursor`](self::cursor).

pub mod cursor;

use crate::codec::PayloadCodec;
use crate::error::{DictError, Result};
use crate::format::{
    files_required, header_file_name, value_file_name, V1Meta, V2Meta, NULL_MARKER,
    REVERSE_LOOKUP_ALLOWED, VERSION_ONE, VERSION_TWO,
};
use crate::mapper::{FileMapper, MemoryFileMapper};
use crate::window::ByteWindow;
use std::cmp::Ordering;
use std::io::Write;

// ============================================================================
// Read options
// ============================================================================

/// Per-reader decode options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Legacy compatibility fold: report zero-length payloads as NULL
    /// without consulting the length marker. Off by default: the marker
    /// distinguishes NULL from a present empty payload, and new segments
    /// rely on that distinction.
    pub replace_empty_with_null: bool,
}

// ============================================================================
// Common read surface
// ============================================================================

/// Index-addressed read access shared by both container versions.
pub trait Indexed<'a> {
    type Codec: PayloadCodec;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the payloads were written in strictly ascending order, which
    /// is what legalizes `index_of`.
    fn is_sorted(&self) -> bool;

    /// Payload at `index`, `None` for NULL.
    fn get(&self, index: usize) -> Result<Option<<Self::Codec as PayloadCodec>::Payload<'a>>>;

    /// Binary-search for `value`. Returns the matching index, or
    /// `-(insertion_point + 1)` when absent, the insertion point being the
    /// index at which the value would keep the sequence non-decreasing.
    /// Fails with [`DictError::ReverseLookupUnsupported`] unless
    /// [`is_sorted`](Indexed::is_sorted).
    fn index_of(
        &self,
        value: Option<&<Self::Codec as PayloadCodec>::Payload<'_>>,
    ) -> Result<isize>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Overflow-safe binary search over `len` elements.
///
/// `cmp(mid)` orders the stored element at `mid` against the probe. The
/// half-open midpoint arithmetic cannot wrap for any element count the
/// container can store (counts are i32).
pub(crate) fn binary_search(
    len: usize,
    mut cmp: impl FnMut(usize) -> Result<Ordering>,
) -> Result<isize> {
    let mut lo = 0usize;
    let mut hi = len;
    while lo < hi {
        let mid = (lo + hi) >> 1;
        match cmp(mid)? {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return Ok(mid as isize),
        }
    }
    Ok(-(lo as isize) - 1)
}

/// Validate a `[start, end)` payload span against its value window.
///
/// `start >= 4` keeps the length-marker word addressable; `end >= start` is
/// offset monotonicity; `end <= capacity` is the buffer bound.
fn validate_span(start: i64, end: i64, capacity: usize) -> Result<(usize, usize)> {
    if start < 4 {
        return Err(DictError::corrupt(format!(
            "payload start offset {} precedes its length marker",
            start
        )));
    }
    if end < start {
        return Err(DictError::corrupt(format!(
            "offset monotonicity violated: end {} < start {}",
            end, start
        )));
    }
    if end as usize > capacity {
        return Err(DictError::corrupt(format!(
            "payload end offset {} exceeds value buffer of {} bytes",
            end, capacity
        )));
    }
    Ok((start as usize, end as usize))
}

/// Duplicate the value window and decode the payload at `[start, end)`,
/// discriminating NULL from a present empty payload via the marker word.
fn read_payload<'a, C: PayloadCodec>(
    codec: &C,
    values: &ByteWindow<'a>,
    start: usize,
    end: usize,
    options: ReadOptions,
) -> Result<Option<C::Payload<'a>>> {
    let size = end - start;
    if size == 0
        && (options.replace_empty_with_null || values.i32_be_at(start - 4)? == NULL_MARKER)
    {
        return Ok(None);
    }
    let mut dup = values.duplicate();
    dup.set_position(start);
    codec.decode(&mut dup, size).map(Some)
}

// ============================================================================
// Version-one reader
// ============================================================================

/// Single-buffer dictionary reader.
#[derive(Debug)]
pub struct DictV1<'a, C: PayloadCodec> {
    pub(crate) codec: C,
    pub(crate) allow_reverse_lookup: bool,
    pub(crate) len: usize,
    /// Big-endian end offsets, 4 bytes per element.
    pub(crate) header: ByteWindow<'a>,
    pub(crate) values: ByteWindow<'a>,
    pub(crate) options: ReadOptions,
}

impl<'a, C: PayloadCodec> DictV1<'a, C> {
    /// Parse the container body following the version and flag bytes,
    /// advancing `window` past the dictionary.
    pub(crate) fn parse(
        window: &mut ByteWindow<'a>,
        codec: C,
        allow_reverse_lookup: bool,
        options: ReadOptions,
    ) -> Result<Self> {
        let num_bytes_used = window.read_i32_be()?;
        if num_bytes_used < 4 {
            return Err(DictError::corrupt(format!(
                "numBytesUsed {} below the count word",
                num_bytes_used
            )));
        }
        let region_len = num_bytes_used as usize;
        if region_len > window.remaining() {
            return Err(DictError::corrupt(format!(
                "numBytesUsed {} exceeds the {} bytes remaining",
                region_len,
                window.remaining()
            )));
        }

        let mut region = window.duplicate();
        region.set_limit(window.position() + region_len);
        let mut region = region.slice();
        window.set_position(window.position() + region_len);

        let num_elements = region.read_i32_be()?;
        if num_elements < 0 {
            return Err(DictError::corrupt(format!(
                "negative element count {}",
                num_elements
            )));
        }
        let len = num_elements as usize;
        let payload_offset = len
            .checked_mul(4)
            .and_then(|offsets| offsets.checked_add(4))
            .filter(|&end| end <= region_len)
            .ok_or_else(|| {
                DictError::corrupt(format!(
                    "offset table for {} elements exceeds numBytesUsed {}",
                    len, region_len
                ))
            })?;

        let mut header = region.duplicate();
        header.set_limit(payload_offset);
        let header = header.slice();
        region.set_position(payload_offset);
        let values = region.slice();

        tracing::debug!(n = len, sorted = allow_reverse_lookup, "opened v1 dictionary");
        Ok(Self {
            codec,
            allow_reverse_lookup,
            len,
            header,
            values,
            options,
        })
    }

    /// Payload span for `index`: `(start, end)` within the value window.
    pub(crate) fn locate(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.len {
            return Err(DictError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let (start, end) = if index == 0 {
            (4, i64::from(self.header.i32_be_at(0)?))
        } else {
            let pos = (index - 1) * 4;
            (
                i64::from(self.header.i32_be_at(pos)?) + 4,
                i64::from(self.header.i32_be_at(pos + 4)?),
            )
        };
        validate_span(start, end, self.values.capacity())
    }

    /// Serialize the complete container (version byte onward) to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let meta = V1Meta {
            allow_reverse_lookup: self.allow_reverse_lookup,
            num_bytes_used: i32::try_from(4 + self.header.capacity() + self.values.capacity())
                .map_err(|_| DictError::too_large("v1 container exceeds i32 bytes".to_string()))?,
            num_elements: self.len as i32,
        };
        let mut head = Vec::with_capacity(V1Meta::SIZE);
        meta.write(&mut head);
        out.write_all(&head)?;
        out.write_all(self.header.window_bytes())?;
        out.write_all(self.values.window_bytes())?;
        Ok(())
    }

    /// Size in bytes of the [`write_to`](DictV1::write_to) output.
    pub fn serialized_size(&self) -> usize {
        V1Meta::SIZE + self.header.capacity() + self.values.capacity()
    }
}

impl<'a, C: PayloadCodec> Indexed<'a> for DictV1<'a, C> {
    type Codec = C;

    fn len(&self) -> usize {
        self.len
    }

    fn is_sorted(&self) -> bool {
        self.allow_reverse_lookup
    }

    fn get(&self, index: usize) -> Result<Option<C::Payload<'a>>> {
        let (start, end) = self.locate(index)?;
        read_payload(&self.codec, &self.values, start, end, self.options)
    }

    fn index_of(&self, value: Option<&C::Payload<'_>>) -> Result<isize> {
        if !self.allow_reverse_lookup {
            return Err(DictError::ReverseLookupUnsupported);
        }
        binary_search(self.len, |mid| {
            let curr = self.get(mid)?;
            Ok(self.codec.compare(curr.as_ref(), value))
        })
    }
}

// ============================================================================
// Version-two reader
// ============================================================================

/// Multi-file dictionary reader: one native-endian header window plus N
/// value windows addressed by `index >> exponent`.
#[derive(Debug)]
pub struct DictV2<'a, C: PayloadCodec> {
    pub(crate) codec: C,
    pub(crate) allow_reverse_lookup: bool,
    pub(crate) len: usize,
    pub(crate) exponent: u32,
    pub(crate) relative_mask: usize,
    /// Native-endian end offsets; the origin restarts at 4 in each value
    /// file.
    pub(crate) header: ByteWindow<'a>,
    pub(crate) value_files: Vec<ByteWindow<'a>>,
    pub(crate) column_name: String,
    pub(crate) options: ReadOptions,
}

impl<'a, C: PayloadCodec> DictV2<'a, C> {
    pub(crate) fn open<M: FileMapper + ?Sized>(
        meta: V2Meta,
        codec: C,
        mapper: &'a M,
        options: ReadOptions,
    ) -> Result<Self> {
        let len = meta.num_elements as usize;
        let files = files_required(len, meta.elements_per_file());

        let mut value_files = Vec::with_capacity(files);
        for file_num in 0..files {
            let name = value_file_name(&meta.column_name, file_num);
            value_files.push(mapper.map_file(&name)?);
        }
        let header = mapper.map_file(&header_file_name(&meta.column_name))?;

        let header_bytes = len.checked_mul(4).ok_or_else(|| {
            DictError::corrupt(format!("element count {} overflows the offset table", len))
        })?;
        if header.capacity() < header_bytes {
            return Err(DictError::corrupt(format!(
                "header file holds {} bytes but {} elements need {}",
                header.capacity(),
                len,
                header_bytes
            )));
        }

        tracing::debug!(
            column = %meta.column_name,
            n = len,
            exponent = meta.exponent,
            files,
            "opened v2 dictionary"
        );
        Ok(Self {
            codec,
            allow_reverse_lookup: meta.allow_reverse_lookup,
            len,
            exponent: meta.exponent,
            relative_mask: (1usize << meta.exponent) - 1,
            header,
            value_files,
            column_name: meta.column_name,
            options,
        })
    }

    /// Payload span for `index`: `(file_num, start, end)`.
    pub(crate) fn locate(&self, index: usize) -> Result<(usize, usize, usize)> {
        if index >= self.len {
            return Err(DictError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let relative = index & self.relative_mask;
        let (start, end) = if relative == 0 {
            (4, i64::from(self.header.i32_ne_at(index * 4)?))
        } else {
            let pos = (index - 1) * 4;
            (
                i64::from(self.header.i32_ne_at(pos)?) + 4,
                i64::from(self.header.i32_ne_at(pos + 4)?),
            )
        };
        let file_num = index >> self.exponent;
        let (start, end) = validate_span(start, end, self.value_files[file_num].capacity())?;
        Ok((file_num, start, end))
    }

    /// Column name the file set was written under.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// log2 of elements per value file.
    pub fn bag_exponent(&self) -> u32 {
        self.exponent
    }
}

impl<'a, C: PayloadCodec> Indexed<'a> for DictV2<'a, C> {
    type Codec = C;

    fn len(&self) -> usize {
        self.len
    }

    fn is_sorted(&self) -> bool {
        self.allow_reverse_lookup
    }

    fn get(&self, index: usize) -> Result<Option<C::Payload<'a>>> {
        let (file_num, start, end) = self.locate(index)?;
        read_payload(
            &self.codec,
            &self.value_files[file_num],
            start,
            end,
            self.options,
        )
    }

    fn index_of(&self, value: Option<&C::Payload<'_>>) -> Result<isize> {
        if !self.allow_reverse_lookup {
            return Err(DictError::ReverseLookupUnsupported);
        }
        binary_search(self.len, |mid| {
            let curr = self.get(mid)?;
            Ok(self.codec.compare(curr.as_ref(), value))
        })
    }
}

// ============================================================================
// IndexedDict
// ============================================================================

/// A dictionary of either container version behind one read surface.
#[derive(Debug)]
pub enum IndexedDict<'a, C: PayloadCodec> {
    V1(DictV1<'a, C>),
    V2(DictV2<'a, C>),
}

impl<'a, C: PayloadCodec> IndexedDict<'a, C> {
    /// Read a dictionary from `window`, advancing it past the container.
    ///
    /// Version-one only: a version-two container needs
    /// [`read_with_mapper`](IndexedDict::read_with_mapper) and fails here
    /// with [`DictError::MissingFileMapper`].
    pub fn read(window: &mut ByteWindow<'a>, codec: C) -> Result<Self> {
        Self::read_with_options(
            window,
            codec,
            None::<&MemoryFileMapper>,
            ReadOptions::default(),
        )
    }

    /// Read a dictionary of either version; version two resolves its header
    /// and value files through `mapper`.
    pub fn read_with_mapper<M: FileMapper + ?Sized>(
        window: &mut ByteWindow<'a>,
        codec: C,
        mapper: &'a M,
    ) -> Result<Self> {
        Self::read_with_options(window, codec, Some(mapper), ReadOptions::default())
    }

    /// Fully-general read with explicit decode options.
    pub fn read_with_options<M: FileMapper + ?Sized>(
        window: &mut ByteWindow<'a>,
        codec: C,
        mapper: Option<&'a M>,
        options: ReadOptions,
    ) -> Result<Self> {
        let version = window.read_u8()?;
        match version {
            VERSION_ONE => {
                let allow_reverse_lookup = window.read_u8()? == REVERSE_LOOKUP_ALLOWED;
                DictV1::parse(window, codec, allow_reverse_lookup, options).map(IndexedDict::V1)
            }
            VERSION_TWO => {
                let mapper = mapper.ok_or(DictError::MissingFileMapper)?;
                let meta = V2Meta::read(window)?;
                DictV2::open(meta, codec, mapper, options).map(IndexedDict::V2)
            }
            other => Err(DictError::UnknownVersion(other)),
        }
    }

    /// Container version byte.
    pub fn version(&self) -> u8 {
        match self {
            IndexedDict::V1(_) => VERSION_ONE,
            IndexedDict::V2(_) => VERSION_TWO,
        }
    }

    /// Column name, for version-two dictionaries.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            IndexedDict::V1(_) => None,
            IndexedDict::V2(d) => Some(d.column_name()),
        }
    }

    pub fn codec(&self) -> &C {
        match self {
            IndexedDict::V1(d) => &d.codec,
            IndexedDict::V2(d) => &d.codec,
        }
    }

    /// Serialize a version-one container; version two is rebuilt through its
    /// writer and fails with [`DictError::UnsupportedSerialization`].
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            IndexedDict::V1(d) => d.write_to(out),
            IndexedDict::V2(_) => Err(DictError::UnsupportedSerialization),
        }
    }

    /// Serialized size of a version-one container.
    pub fn serialized_size(&self) -> Result<usize> {
        match self {
            IndexedDict::V1(d) => Ok(d.serialized_size()),
            IndexedDict::V2(_) => Err(DictError::UnsupportedSerialization),
        }
    }

    /// Payloads in index order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Option<C::Payload<'a>>>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub(crate) fn locate(&self, index: usize) -> Result<(usize, usize, usize)> {
        match self {
            IndexedDict::V1(d) => d.locate(index).map(|(start, end)| (0, start, end)),
            IndexedDict::V2(d) => d.locate(index),
        }
    }

    pub(crate) fn duplicate_value_windows(&self) -> Vec<ByteWindow<'a>> {
        match self {
            IndexedDict::V1(d) => vec![d.values.duplicate()],
            IndexedDict::V2(d) => d.value_files.iter().map(ByteWindow::duplicate).collect(),
        }
    }

    pub(crate) fn options(&self) -> ReadOptions {
        match self {
            IndexedDict::V1(d) => d.options,
            IndexedDict::V2(d) => d.options,
        }
    }
}

impl<'a, C: PayloadCodec> Indexed<'a> for IndexedDict<'a, C> {
    type Codec = C;

    fn len(&self) -> usize {
        match self {
            IndexedDict::V1(d) => Indexed::len(d),
            IndexedDict::V2(d) => Indexed::len(d),
        }
    }

    fn is_sorted(&self) -> bool {
        match self {
            IndexedDict::V1(d) => d.is_sorted(),
            IndexedDict::V2(d) => d.is_sorted(),
        }
    }

    fn get(&self, index: usize) -> Result<Option<C::Payload<'a>>> {
        match self {
            IndexedDict::V1(d) => d.get(index),
            IndexedDict::V2(d) => d.get(index),
        }
    }

    fn index_of(&self, value: Option<&C::Payload<'_>>) -> Result<isize> {
        match self {
            IndexedDict::V1(d) => d.index_of(value),
            IndexedDict::V2(d) => d.index_of(value),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
