//! Letter rotation ciphers.

use crate::solution::Solution;
use tracing::trace;

const CAESAR_MARKER: &[u8] = b"picoctf";

/// Rotate every ASCII letter forward by `shift` within its case
pub fn caesar_shift(data: &[u8], shift: u8) -> Vec<u8> {
    let shift = shift % 26;
    data.iter()
        .map(|&b| match b {
            b'a'..=b'z' => b'a' + (b - b'a' + shift) % 26,
            b'A'..=b'Z' => b'A' + (b - b'A' + shift) % 26,
            _ => b,
        })
        .collect()
}

/// ROT13; applying it twice returns the input
pub fn rot13(data: &[u8]) -> Vec<u8> {
    caesar_shift(data, 13)
}

/// Try every shift in 1..=25 and keep the first one that exposes a flag
/// prefix.
pub fn brute_force_caesar(data: &[u8]) -> Option<Solution> {
    (1..26u8).find_map(|shift| {
        let candidate = caesar_shift(data, shift);
        if contains_ignore_case(&candidate, CAESAR_MARKER) {
            trace!("Caesar shift {} matched", shift);
            Some(Solution::new(format!("Caesar Cipher (Shift {})", shift), candidate))
        } else {
            None
        }
    })
}

/// Case-insensitive substring search over ASCII bytes
pub(super) fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
