//! Byte-window primitives: read-only cursored views over contiguous bytes.
//!
//! A [`ByteWindow`] is a `(base, position, limit)` triple over an immutable
//! byte region with `0 <= position <= limit <= capacity`. Windows are cheap
//! to copy: duplicating one yields an independent cursor over the same bytes,
//! which is how the readers hand out zero-copy payload views without sharing
//! mutable state.
//!
//! Fixed-width reads come in two flavors. Version-one container fields and
//! the version-two meta block are big-endian; the version-two header file is
//! written in native byte order (and is therefore not portable across
//! heterogeneous-endian deployments).
//!
//! This module also owns the UTF-8 comparator used to order byte payloads.

use crate::error::{DictError, Result};
use std::cmp::Ordering;

// ============================================================================
// ByteWindow
// ============================================================================

/// Read-only view over a contiguous byte region with its own position and
/// limit cursors. `Copy`: a plain assignment is the "duplicate" operation.
#[derive(Debug, Clone, Copy)]
pub struct ByteWindow<'a> {
    data: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> ByteWindow<'a> {
    /// Wrap a byte region. Position starts at 0 and the limit equals the
    /// capacity, matching the file-mapper contract.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            limit: data.len(),
        }
    }

    /// Total capacity of the underlying region.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes remaining between position and limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Move the position cursor. Callers validate offsets against the
    /// capacity before repositioning; this only guards in debug builds.
    #[inline]
    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.limit);
        self.position = position;
    }

    /// Move the limit cursor. The position is pulled back if it would exceed
    /// the new limit.
    #[inline]
    pub fn set_limit(&mut self, limit: usize) {
        debug_assert!(limit <= self.data.len());
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
    }

    /// Fresh window over `[position, limit)`. The new window shares the same
    /// bytes, starts at position 0, and its limit equals its capacity.
    pub fn slice(&self) -> ByteWindow<'a> {
        ByteWindow::new(&self.data[self.position..self.limit])
    }

    /// Independent cursor over the same bytes.
    #[inline]
    pub fn duplicate(&self) -> ByteWindow<'a> {
        *self
    }

    /// The bytes between position and limit, borrowed for the region's
    /// lifetime (not the window's).
    #[inline]
    pub fn window_bytes(&self) -> &'a [u8] {
        &self.data[self.position..self.limit]
    }

    /// Absolute single-byte read.
    #[inline]
    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| DictError::corrupt(format!(
                "byte read at {} beyond capacity {}",
                offset,
                self.data.len()
            )))
    }

    /// Absolute big-endian i32 read.
    #[inline]
    pub fn i32_be_at(&self, offset: usize) -> Result<i32> {
        Ok(i32::from_be_bytes(self.fixed_at(offset)?))
    }

    /// Absolute native-endian i32 read (version-two header file only).
    #[inline]
    pub fn i32_ne_at(&self, offset: usize) -> Result<i32> {
        Ok(i32::from_ne_bytes(self.fixed_at(offset)?))
    }

    #[inline]
    fn fixed_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        match self.data.get(offset..offset + N) {
            Some(bytes) => Ok(bytes.try_into().unwrap()),
            None => Err(DictError::corrupt(format!(
                "{}-byte read at {} beyond capacity {}",
                N,
                offset,
                self.data.len()
            ))),
        }
    }

    /// Read one byte at the position cursor and advance.
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.position >= self.limit {
            return Err(DictError::corrupt("read past window limit"));
        }
        let b = self.data[self.position];
        self.position += 1;
        Ok(b)
    }

    /// Read a big-endian i32 at the position cursor and advance.
    pub fn read_i32_be(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().unwrap()))
    }

    /// Consume `n` bytes from the position cursor, returning them with the
    /// region's lifetime. Fails if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DictError::corrupt(format!(
                "payload of {} bytes exceeds the {} remaining in its buffer",
                n,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }
}

// ============================================================================
// UTF-8 comparator
// ============================================================================

/// Compare two UTF-8 byte payloads in UTF-16 code-unit order.
///
/// Dictionary order for string payloads follows the host engine's string
/// comparison, which is defined over UTF-16 code units. Plain byte
/// comparison of UTF-8 yields code-*point* order instead; the two differ
/// only in where supplementary characters (`U+10000` and above) land
/// relative to `[U+E000, U+FFFF]`. In UTF-16, supplementary characters are
/// surrogate pairs whose lead unit sorts below `U+E000`.
///
/// The byte-level shortcut: UTF-8 lead bytes `0xEE`/`0xEF` introduce
/// `[U+E000, U+FFFF]` and `0xF0..=0xF4` introduce supplementary characters,
/// so re-ranking those two groups (supplementary first) makes byte
/// comparison agree with UTF-16 order on all valid UTF-8 input. Bytes that
/// never occur in valid UTF-8 (`0xF5..=0xFF`) keep an arbitrary but
/// consistent rank. The equivalence is exercised against `encode_utf16` in
/// the tests below.
pub fn compare_utf8(a: &[u8], b: &[u8]) -> Ordering {
    let common = a.len().min(b.len());
    for i in 0..common {
        if a[i] != b[i] {
            return utf16_rank(a[i]).cmp(&utf16_rank(b[i]));
        }
    }
    a.len().cmp(&b.len())
}

/// Compare the `[position, limit)` contents of two windows with
/// [`compare_utf8`].
pub fn compare_utf8_windows(a: &ByteWindow<'_>, b: &ByteWindow<'_>) -> Ordering {
    compare_utf8(a.window_bytes(), b.window_bytes())
}

/// Rank remap placing 4-byte lead bytes between `0xED` and the 3-byte leads
/// for `[U+E000, U+FFFF]`.
#[inline]
fn utf16_rank(b: u8) -> u8 {
    match b {
        0xEE..=0xEF => b + 0x10,
        0xF0..=0xF4 => b - 0x02,
        _ => b,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_reads() {
        let data = [0x01, 0x02, 0x00, 0x00, 0x00, 0x2A];
        let w = ByteWindow::new(&data);
        assert_eq!(w.u8_at(1).unwrap(), 0x02);
        assert_eq!(w.i32_be_at(2).unwrap(), 42);
        assert!(w.i32_be_at(3).is_err());
        assert!(w.u8_at(6).is_err());
    }

    #[test]
    fn test_native_read_round_trips() {
        let data = 1234i32.to_ne_bytes();
        let w = ByteWindow::new(&data);
        assert_eq!(w.i32_ne_at(0).unwrap(), 1234);
    }

    #[test]
    fn test_cursor_reads_advance() {
        let mut data = vec![0x07u8];
        data.extend_from_slice(&(-1i32).to_be_bytes());
        let mut w = ByteWindow::new(&data);
        assert_eq!(w.read_u8().unwrap(), 0x07);
        assert_eq!(w.read_i32_be().unwrap(), -1);
        assert_eq!(w.remaining(), 0);
        assert!(w.read_u8().is_err());
    }

    #[test]
    fn test_slice_resets_cursors() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut w = ByteWindow::new(&data);
        w.set_position(2);
        w.set_limit(5);
        let s = w.slice();
        assert_eq!(s.position(), 0);
        assert_eq!(s.limit(), 3);
        assert_eq!(s.capacity(), 3);
        assert_eq!(s.window_bytes(), &[3, 4, 5]);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let data = [1u8, 2, 3, 4];
        let mut w = ByteWindow::new(&data);
        let mut dup = w.duplicate();
        dup.set_position(2);
        assert_eq!(w.position(), 0);
        assert_eq!(w.take(4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(dup.take(2).unwrap(), &[3, 4]);
    }

    #[test]
    fn test_take_respects_limit() {
        let data = [1u8, 2, 3, 4];
        let mut w = ByteWindow::new(&data);
        w.set_limit(2);
        assert!(w.take(3).is_err());
        assert_eq!(w.take(2).unwrap(), &[1, 2]);
    }

    #[test]
    fn test_compare_utf8_ascii() {
        assert_eq!(compare_utf8(b"apple", b"banana"), Ordering::Less);
        assert_eq!(compare_utf8(b"banana", b"banana"), Ordering::Equal);
        assert_eq!(compare_utf8(b"banana", b"band"), Ordering::Less);
        assert_eq!(compare_utf8(b"band", b"banana"), Ordering::Greater);
        assert_eq!(compare_utf8(b"", b"a"), Ordering::Less);
        assert_eq!(compare_utf8(b"ab", b"a"), Ordering::Greater);
    }

    /// The byte-level shortcut must agree with UTF-16 code-unit comparison
    /// on every pair drawn from a set that crosses the interesting
    /// boundaries: ASCII, 2- and 3-byte sequences, `[U+E000, U+FFFF]`
    /// private-use and BMP-max characters, and supplementary characters.
    #[test]
    fn test_compare_utf8_matches_utf16_order() {
        let samples = [
            "",
            "a",
            "ab",
            "ä",
            "z\u{00E4}",
            "\u{0800}",
            "\u{D7FF}",
            "\u{E000}",
            "\u{E000}x",
            "\u{F8FF}",
            "\u{FFFD}",
            "\u{FFFF}",
            "\u{10000}",
            "\u{1F600}",
            "\u{10FFFF}",
            "a\u{FFFF}",
            "a\u{10000}",
            "mixed \u{E001} and \u{1F645} text",
        ];
        for x in &samples {
            for y in &samples {
                let expected = x.encode_utf16().cmp(y.encode_utf16());
                let actual = compare_utf8(x.as_bytes(), y.as_bytes());
                assert_eq!(
                    actual, expected,
                    "compare_utf8({:?}, {:?}) disagreed with UTF-16 order",
                    x, y
                );
            }
        }
    }

    #[test]
    fn test_compare_windows_uses_cursor_range() {
        let a = ByteWindow::new(b"xxapple");
        let mut a = a;
        a.set_position(2);
        let b = ByteWindow::new(b"apricot");
        assert_eq!(compare_utf8_windows(&a, &b), Ordering::Less);
        assert_eq!(compare_utf8_windows(&b, &b), Ordering::Equal);
    }

    /// Supplementary characters sort below U+E000..U+FFFF, unlike plain byte
    /// order. Pin the one place the shortcut must deviate from `Ord` on str.
    #[test]
    fn test_supplementary_sorts_below_bmp_tail() {
        assert_eq!(
            compare_utf8("\u{1F600}".as_bytes(), "\u{FFFD}".as_bytes()),
            Ordering::Less
        );
        assert_eq!(
            "\u{1F600}".cmp("\u{FFFD}"),
            Ordering::Greater,
            "code-point order would say otherwise"
        );
    }
}
