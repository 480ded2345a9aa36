//! Keyless decoders for a single layer.
//!
//! [`try_decode`] runs a fixed battery of transforms and returns the first
//! one that produces a plausible result:
//!
//! 1. Base64 (standard alphabet, padded, trailing bits ignored)
//! 2. Hex
//! 3. URL percent-encoding (query style)
//! 4. Base32 (standard alphabet, padded)
//! 5. ROT13, only if the output mentions `pico`
//! 6. Caesar brute force, only if the output mentions `picoctf`
//!
//! Binary decoders must produce printable text to count. The order matters:
//! a short hex string is also valid Base64, and Base64 wins. Base64 and
//! Base32 skip `\r` and `\n`, so line-wrapped blobs decode as one.
//!
//! ## Custom decoders
//!
//! The engine calls decoders through [`LayerDecoder`], so a different
//! battery can be swapped in:
//!
//! ```
//! use sleuth_core::{LayerDecoder, Solution};
//!
//! struct Reverse;
//!
//! impl LayerDecoder for Reverse {
//!     fn decode(&self, data: &[u8]) -> Option<Solution> {
//!         let mut out = data.to_vec();
//!         out.reverse();
//!         Some(Solution::new("Reverse", out))
//!     }
//! }
//! ```

mod classical;

pub use classical::{brute_force_caesar, caesar_shift, rot13};
use classical::contains_ignore_case;

use crate::solution::Solution;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use data_encoding::Encoding;
use lazy_static::lazy_static;
use tracing::trace;

/// Standard padded Base64 that tolerates non-zero trailing bits
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

lazy_static! {
    /// Standard padded Base32 that skips line breaks and trailing bits
    static ref BASE32_LENIENT: Encoding = {
        let mut spec = data_encoding::BASE32.specification();
        spec.ignore.push_str("\r\n");
        spec.check_trailing_bits = false;
        spec.encoding().unwrap()
    };
}

/// A strategy that peels one layer off an artifact
pub trait LayerDecoder {
    /// Decode `data`, or `None` if nothing applies
    fn decode(&self, data: &[u8]) -> Option<Solution>;
}

/// The built-in decoder battery
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDecoder;

impl LayerDecoder for LocalDecoder {
    fn decode(&self, data: &[u8]) -> Option<Solution> {
        try_decode(data)
    }
}

/// Printable ASCII plus `\n`, `\r` and `\t`
pub fn is_printable(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| (32..=126).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t'))
}

/// Run every decoder in order and return the first accepted result
pub fn try_decode(data: &[u8]) -> Option<Solution> {
    if let Ok(decoded) = BASE64_LENIENT.decode(strip_line_breaks(data)) {
        if is_printable(&decoded) {
            return Some(Solution::new("Base64", decoded));
        }
        trace!("Base64 output not printable");
    }

    if let Ok(decoded) = hex::decode(data) {
        if is_printable(&decoded) {
            return Some(Solution::new("Hex", decoded));
        }
        trace!("Hex output not printable");
    }

    if let Some(decoded) = url_decode(data) {
        if decoded != data {
            return Some(Solution::new("URL Encoding", decoded));
        }
    }

    if let Ok(decoded) = BASE32_LENIENT.decode(data) {
        if is_printable(&decoded) {
            return Some(Solution::new("Base32", decoded));
        }
        trace!("Base32 output not printable");
    }

    let rotated = rot13(data);
    if contains_ignore_case(&rotated, b"pico") {
        return Some(Solution::new("Rot13", rotated));
    }

    brute_force_caesar(data)
}

fn strip_line_breaks(data: &[u8]) -> Vec<u8> {
    data.iter()
        .copied()
        .filter(|b| !matches!(b, b'\r' | b'\n'))
        .collect()
}

/// Query-string unescaping: `+` becomes a space and every `%` must be
/// followed by two hex digits.
pub fn url_decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'%' => {
                let hi = hex_value(*data.get(i + 1)?)?;
                let lo = hex_value(*data.get(i + 2)?)?;
                out.push(hi << 4 | lo);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Some(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
