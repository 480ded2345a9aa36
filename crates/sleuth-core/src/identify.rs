//! Artifact classification.
//!
//! Families are tried in a fixed order and the first hit wins: magic bytes,
//! hash formats, encoding formats. A complete set of RSA parameters
//! overrides whatever was found before it.

use crate::knowledge::KnowledgeBase;
use crate::rsa::RsaParams;
use std::fmt;

/// What an artifact looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// Binary file recognized by its leading bytes
    File(String),
    /// String shaped like a known hash format
    Hash(String),
    /// String drawn from a known encoding alphabet
    Encoding(String),
    /// Text carrying RSA `n`, `e` and `c` values
    RsaChallenge,
    /// Nothing matched
    Unknown,
}

impl Identification {
    /// True for encoding-format matches
    pub fn is_encoded(&self) -> bool {
        matches!(self, Identification::Encoding(_))
    }

    /// True when nothing matched
    pub fn is_unknown(&self) -> bool {
        matches!(self, Identification::Unknown)
    }

    /// Hash algorithm name, if this is a hash match
    pub fn hash_kind(&self) -> Option<&str> {
        match self {
            Identification::Hash(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identification::File(name) => write!(f, "File ({})", name),
            Identification::Hash(name) => write!(f, "Hash ({})", name),
            Identification::Encoding(name) => write!(f, "Encoded Text ({}?)", name),
            Identification::RsaChallenge => f.write_str("RSA Challenge Data"),
            Identification::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Classify `data` against the knowledge base
pub fn identify(kb: &KnowledgeBase, data: &[u8]) -> Identification {
    identify_with_params(kb, data).0
}

/// Classify `data` and hand back the RSA values scanned along the way
pub fn identify_with_params(kb: &KnowledgeBase, data: &[u8]) -> (Identification, RsaParams) {
    let params = RsaParams::parse(data);
    if params.is_complete() {
        return (Identification::RsaChallenge, params);
    }
    (identify_format(kb, data), params)
}

/// Classify `data` by signature tables only, ignoring RSA parameters
pub fn identify_format(kb: &KnowledgeBase, data: &[u8]) -> Identification {
    if let Some(sig) = kb.magic().iter().find(|sig| sig.matches(data)) {
        return Identification::File(sig.name.clone());
    }

    if let Some(pattern) = kb.hashes().iter().find(|p| p.matches(data)) {
        return Identification::Hash(pattern.name.clone());
    }

    if let Some(pattern) = kb.encodings().iter().find(|p| p.matches(data)) {
        return Identification::Encoding(pattern.name.clone());
    }

    Identification::Unknown
}
