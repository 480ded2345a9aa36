//! Byte-level statistics used to steer the analysis.
//!
//! Both measures are pure functions over a byte slice:
//!
//! - [`entropy`]: Shannon entropy of the byte histogram, in bits per byte
//! - [`index_of_coincidence`]: letter IoC normalized by the alphabet size,
//!   so English lands near 1.73 and uniform letters near 1.0

use std::fmt;

/// Number of letters in the alphabet used for IoC normalization
const ALPHABET_LEN: usize = 26;

/// Calculate Shannon entropy (bits per byte)
pub fn entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut freq = [0u64; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;

    for &count in &freq {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }

    entropy
}

/// Normalized index of coincidence over the ASCII letters of `data`.
///
/// Letters are case-folded, everything else is ignored. Returns `0.0` when
/// fewer than two letters remain.
pub fn index_of_coincidence(data: &[u8]) -> f64 {
    let mut freq = [0u64; ALPHABET_LEN];
    let mut total: u64 = 0;

    for &byte in data {
        if byte.is_ascii_alphabetic() {
            freq[(byte.to_ascii_lowercase() - b'a') as usize] += 1;
            total += 1;
        }
    }

    if total < 2 {
        return 0.0;
    }

    let numerator: u64 = freq
        .iter()
        .map(|&c| if c > 1 { c * (c - 1) } else { 0 })
        .sum();
    let denominator = (total * (total - 1)) as f64;

    numerator as f64 / denominator * ALPHABET_LEN as f64
}

/// Qualitative entropy bucket shown next to the raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyBucket {
    /// Up to 5.0 bits per byte
    Low,
    /// Above 5.0, up to 7.5 bits per byte
    Medium,
    /// Above 7.5 bits per byte
    High,
}

impl EntropyBucket {
    /// Classify an entropy value
    pub fn classify(entropy: f64) -> Self {
        match entropy {
            h if h > 7.5 => EntropyBucket::High,
            h if h > 5.0 => EntropyBucket::Medium,
            _ => EntropyBucket::Low,
        }
    }

    /// Human-readable description
    pub fn describe(&self) -> &'static str {
        match self {
            EntropyBucket::Low => "Low (Standard Text)",
            EntropyBucket::Medium => "Medium (Random Text/Code)",
            EntropyBucket::High => "High (Encrypted/Compressed)",
        }
    }
}

impl fmt::Display for EntropyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Statistics computed for every analysis layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStats {
    /// Shannon entropy in bits per byte
    pub entropy: f64,
    /// Normalized index of coincidence
    pub ioc: f64,
}

impl LayerStats {
    /// Compute both statistics for `data`
    pub fn compute(data: &[u8]) -> Self {
        Self {
            entropy: entropy(data),
            ioc: index_of_coincidence(data),
        }
    }

    /// Entropy bucket for reporting
    pub fn bucket(&self) -> EntropyBucket {
        EntropyBucket::classify(self.entropy)
    }
}
