//! Container header formats and file naming.
//!
//! ## Version one (single buffer, big-endian)
//!
//! ```text
//! [0]      u8       version = 0x01
//! [1]      u8       reverse-lookup flag (0x01 allowed / 0x00 disallowed)
//! [2..6]   i32      num_bytes_used  (count word + offsets + payload region)
//! [6..10]  i32      num_elements n
//! [10..]   i32 x n  end offsets into the payload region
//! [...]    bytes    payload region: per element, a 4-byte length-marker
//!                   word then the payload bytes
//! ```
//!
//! The marker word carries no length when the next offset is strictly
//! greater; when consecutive offsets are equal it discriminates: `-1` is
//! NULL, `0` is a present zero-length payload.
//!
//! ## Version two (meta block + header file + value files)
//!
//! ```text
//! meta:   [0] u8 version = 0x02   [1] u8 reverse-lookup flag
//!         [2..6]  i32 exponent    (log2 of elements per value file)
//!         [6..10] i32 num_elements n
//!         [10..14] i32 column-name length L
//!         [14..14+L] UTF-8 column name
//! header: i32 x n in NATIVE byte order; end offsets restart at origin 4
//!         within each value file
//! value:  per element, marker word then payload bytes, as in version one
//! ```
//!
//! The meta block is big-endian like version one; only the header file is
//! native-endian, which makes version-two segments non-portable across
//! heterogeneous-endian deployments.
//!
//! Version byte `0x00` is reserved by the encoded-string dictionary format
//! and is rejected here so the two container families cannot be confused.

use crate::error::{DictError, Result};
use crate::window::ByteWindow;

// ============================================================================
// Constants
// ============================================================================

/// Single-buffer container version.
pub const VERSION_ONE: u8 = 0x01;

/// Multi-file container version.
pub const VERSION_TWO: u8 = 0x02;

/// Reserved by the encoded-string dictionary format; never a valid version.
pub const VERSION_RESERVED: u8 = 0x00;

pub const REVERSE_LOOKUP_ALLOWED: u8 = 0x01;
pub const REVERSE_LOOKUP_DISALLOWED: u8 = 0x00;

/// Length-marker word for a NULL element.
pub const NULL_MARKER: i32 = -1;

/// Valid range for the version-two bag exponent.
pub const MIN_BAG_EXPONENT: u32 = 1;
pub const MAX_BAG_EXPONENT: u32 = 30;

// ============================================================================
// File naming (version two)
// ============================================================================

/// Header file name for a column.
pub fn header_file_name(column_name: &str) -> String {
    format!("{}_header", column_name)
}

/// Value file name for a column's `file_num`-th bag.
pub fn value_file_name(column_name: &str, file_num: usize) -> String {
    format!("{}_value_{}", column_name, file_num)
}

/// Number of value files for `num_elements` at a given bag size.
pub fn files_required(num_elements: usize, elements_per_file: usize) -> usize {
    let mut files = num_elements / elements_per_file;
    if num_elements % elements_per_file != 0 {
        files += 1;
    }
    files
}

// ============================================================================
// Version-one meta
// ============================================================================

/// The ten fixed bytes ahead of a version-one container's offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V1Meta {
    pub allow_reverse_lookup: bool,
    /// Count word + offsets + payload region, in bytes.
    pub num_bytes_used: i32,
    pub num_elements: i32,
}

impl V1Meta {
    /// Serialized size of the meta block.
    pub const SIZE: usize = 10;

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(VERSION_ONE);
        out.push(flag_byte(self.allow_reverse_lookup));
        out.extend_from_slice(&self.num_bytes_used.to_be_bytes());
        out.extend_from_slice(&self.num_elements.to_be_bytes());
    }
}

// ============================================================================
// Version-two meta
// ============================================================================

/// Decoded version-two meta block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V2Meta {
    pub allow_reverse_lookup: bool,
    /// log2 of elements per value file; all value files except the last hold
    /// exactly `1 << exponent` elements.
    pub exponent: u32,
    pub num_elements: i32,
    pub column_name: String,
}

impl V2Meta {
    /// Read the meta fields following an already-consumed version byte.
    pub fn read(window: &mut ByteWindow<'_>) -> Result<Self> {
        let allow_reverse_lookup = window.read_u8()? == REVERSE_LOOKUP_ALLOWED;

        let exponent = window.read_i32_be()?;
        if exponent < MIN_BAG_EXPONENT as i32 || exponent > MAX_BAG_EXPONENT as i32 {
            return Err(DictError::corrupt(format!(
                "bag exponent {} outside [{}, {}]",
                exponent, MIN_BAG_EXPONENT, MAX_BAG_EXPONENT
            )));
        }

        let num_elements = window.read_i32_be()?;
        if num_elements < 0 {
            return Err(DictError::corrupt(format!(
                "negative element count {}",
                num_elements
            )));
        }

        let name_len = window.read_i32_be()?;
        if name_len < 0 {
            return Err(DictError::corrupt(format!(
                "negative column name length {}",
                name_len
            )));
        }
        let name_bytes = window.take(name_len as usize)?;
        let column_name = std::str::from_utf8(name_bytes)
            .map_err(|e| DictError::corrupt(format!("column name is not valid UTF-8: {}", e)))?
            .to_string();

        Ok(Self {
            allow_reverse_lookup,
            exponent: exponent as u32,
            num_elements,
            column_name,
        })
    }

    /// Serialize the complete meta block, version byte included.
    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let name_len = i32::try_from(self.column_name.len()).map_err(|_| {
            DictError::too_large(format!(
                "column name of {} bytes exceeds i32",
                self.column_name.len()
            ))
        })?;
        out.push(VERSION_TWO);
        out.push(flag_byte(self.allow_reverse_lookup));
        out.extend_from_slice(&(self.exponent as i32).to_be_bytes());
        out.extend_from_slice(&self.num_elements.to_be_bytes());
        out.extend_from_slice(&name_len.to_be_bytes());
        out.extend_from_slice(self.column_name.as_bytes());
        Ok(())
    }

    /// Elements per value file.
    pub fn elements_per_file(&self) -> usize {
        1usize << self.exponent
    }
}

#[inline]
fn flag_byte(allow_reverse_lookup: bool) -> u8 {
    if allow_reverse_lookup {
        REVERSE_LOOKUP_ALLOWED
    } else {
        REVERSE_LOOKUP_DISALLOWED
    }
}

// ============================================================================
// Tests
// ============================================================================
