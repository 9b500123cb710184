//! Owned UTF-8 string codec, nulls first.
//!
//! Decoding allocates a fresh `String`, so payloads carry no lifetime tie to
//! the mapped bytes. Ordering delegates to the byte-level UTF-8 comparator
//! rather than `str`'s `Ord`: the two differ only for strings mixing
//! `[U+E000, U+FFFF]` with supplementary characters, and the byte-level
//! order is the one the stored dictionaries were sorted under.

use super::{compare_nulls_first, PayloadCodec};
use crate::error::{DictError, Result};
use crate::window::{compare_utf8, ByteWindow};
use std::cmp::Ordering;

/// Owned string codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl PayloadCodec for StringCodec {
    type Payload<'a> = String;

    fn can_compare(&self) -> bool {
        true
    }

    fn encode(&self, payload: &String, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(payload.as_bytes());
        Ok(())
    }

    fn decode<'a>(&self, window: &mut ByteWindow<'a>, n_bytes: usize) -> Result<String> {
        let bytes = window.take(n_bytes)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| DictError::corrupt(format!("payload is not valid UTF-8: {}", e)))?;
        Ok(s.to_string())
    }

    fn compare(&self, a: Option<&String>, b: Option<&String>) -> Ordering {
        compare_nulls_first(a, b, |x, y| compare_utf8(x.as_bytes(), y.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let codec = StringCodec;
        let mut out = Vec::new();
        codec.encode(&"déjà vu".to_string(), &mut out).unwrap();
        let mut w = ByteWindow::new(&out);
        let n = out.len();
        assert_eq!(codec.decode(&mut w, n).unwrap(), "déjà vu");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let codec = StringCodec;
        let data = [0xFFu8, 0xFE, 0x00];
        let mut w = ByteWindow::new(&data);
        assert!(matches!(
            codec.decode(&mut w, 3),
            Err(DictError::Corrupt(_))
        ));
    }

    #[test]
    fn test_nulls_first_order() {
        let codec = StringCodec;
        let a = "a".to_string();
        let b = "b".to_string();
        assert_eq!(codec.compare(None, Some(&a)), Ordering::Less);
        assert_eq!(codec.compare(Some(&a), Some(&b)), Ordering::Less);
        assert_eq!(codec.compare(Some(&b), Some(&b)), Ordering::Equal);
    }

    /// Same order as the byte-slice codec on the encoded form.
    #[test]
    fn test_agrees_with_bytes_codec() {
        use crate::codec::BytesCodec;
        let strings = ["", "a", "ä", "\u{FFFD}", "\u{1F600}", "zz"];
        let sc = StringCodec;
        let bc = BytesCodec;
        for x in &strings {
            for y in &strings {
                let xs = x.to_string();
                let ys = y.to_string();
                let xb = x.as_bytes();
                let yb = y.as_bytes();
                assert_eq!(
                    sc.compare(Some(&xs), Some(&ys)),
                    bc.compare(Some(&xb), Some(&yb)),
                    "codecs disagree on {:?} vs {:?}",
                    x,
                    y
                );
            }
        }
    }
}
