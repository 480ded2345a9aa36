//! The outcome of a successful decode or attack.

use std::borrow::Cow;

/// A successful reconstruction.
///
/// Strategies return `Option<Solution>`; `None` means the strategy did not
/// apply or found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Name of the winning transform or attack, e.g. `Base64`
    pub algorithm: String,
    /// Recovered bytes
    pub decoded: Vec<u8>,
}

impl Solution {
    /// Creates a new solution
    pub fn new(algorithm: impl Into<String>, decoded: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            decoded: decoded.into(),
        }
    }

    /// Decoded payload rendered as text (invalid UTF-8 is replaced)
    pub fn decoded_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.decoded)
    }
}
