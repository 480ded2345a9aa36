//! Signature and pattern tables used for identification.
//!
//! A [`KnowledgeBase`] is built once, either from the built-in tables or
//! from a JSON document, and then shared read-only with the engine. Table
//! order matters: identification reports the first entry that matches.
//!
//! ## JSON format
//!
//! ```json
//! {
//!   "magic":     [{ "name": "PNG", "signature": "89504e47" }],
//!   "hashes":    [{ "name": "MD5", "pattern": "^[a-fA-F0-9]{32}$" }],
//!   "encodings": [{ "name": "Hex", "pattern": "^[a-fA-F0-9]+$" }]
//! }
//! ```

use crate::error::{Error, Result};
use regex::bytes::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// A named magic-byte prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicSignature {
    /// Format name, e.g. `PNG`
    pub name: String,
    /// Leading bytes of the format
    pub bytes: Vec<u8>,
}

impl MagicSignature {
    /// Creates a new signature
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns true when `data` starts with this signature
    pub fn matches(&self, data: &[u8]) -> bool {
        !self.bytes.is_empty() && data.starts_with(&self.bytes)
    }
}

/// A named regular expression matched against the raw bytes
#[derive(Debug, Clone)]
pub struct NamedPattern {
    /// Label reported on match, e.g. `SHA256`
    pub name: String,
    /// Compiled pattern
    pub regex: Regex,
}

impl NamedPattern {
    /// Compiles a new named pattern
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(name.clone(), e))?;
        Ok(Self { name, regex })
    }

    /// Returns true when the pattern matches anywhere in `data`
    pub fn matches(&self, data: &[u8]) -> bool {
        self.regex.is_match(data)
    }
}

/// Ordered identification tables
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    magic: Vec<MagicSignature>,
    hashes: Vec<NamedPattern>,
    encodings: Vec<NamedPattern>,
}

const BUILTIN_MAGIC: &[(&str, &[u8])] = &[
    ("PNG", &[0x89, 0x50, 0x4E, 0x47]),
    ("JPG", &[0xFF, 0xD8, 0xFF]),
    ("ZIP", &[0x50, 0x4B, 0x03, 0x04]),
    ("7z", &[0x37, 0x7A, 0xBC, 0xAF]),
    ("TAR", b"ustar"),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("LUKS", b"LUKS"),
    // Old-format PGP packet tag; coarse, only meaningful as a hint
    ("PGP Message", &[0x85]),
];

const BUILTIN_HASHES: &[(&str, &str)] = &[
    ("MD5", r"^[a-fA-F0-9]{32}$"),
    ("SHA1", r"^[a-fA-F0-9]{40}$"),
    ("SHA256", r"^[a-fA-F0-9]{64}$"),
    ("SHA512", r"^[a-fA-F0-9]{128}$"),
    ("RIPEMD-160", r"^[a-fA-F0-9]{40}$"),
    ("NTLM", r"^[a-fA-F0-9]{32}$"),
    ("Bcrypt", r"^\$2[ayb]\$.{56}$"),
    ("Argon2", r"^\$argon2.*\$.+$"),
];

const BUILTIN_ENCODINGS: &[(&str, &str)] = &[
    ("Base64", r"^[a-zA-Z0-9+/]*={0,2}$"),
    ("Base32", r"^[A-Z2-7]*={0,6}$"),
    ("Base58", r"^[1-9A-HJ-NP-Za-km-z]+$"),
    ("Hex", r"^[a-fA-F0-9]+$"),
    ("URL", r"%[0-9a-fA-F]{2}"),
];

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// Creates an empty knowledge base (everything identifies as unknown)
    pub fn empty() -> Self {
        Self {
            magic: Vec::new(),
            hashes: Vec::new(),
            encodings: Vec::new(),
        }
    }

    /// The built-in tables
    pub fn builtin() -> Self {
        let compile = |table: &[(&str, &str)]| -> Vec<NamedPattern> {
            table
                .iter()
                .filter_map(|(name, pattern)| NamedPattern::new(*name, pattern).ok())
                .collect()
        };

        Self {
            magic: BUILTIN_MAGIC
                .iter()
                .map(|(name, bytes)| MagicSignature::new(*name, *bytes))
                .collect(),
            hashes: compile(BUILTIN_HASHES),
            encodings: compile(BUILTIN_ENCODINGS),
        }
    }

    /// Parses a knowledge base from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: KnowledgeDocument = serde_json::from_str(json)?;
        document.compile()
    }

    /// Reads and parses a knowledge base file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let kb = Self::from_json(&json)?;
        debug!(
            "Loaded knowledge base from {}: {} signatures, {} hash patterns, {} encodings",
            path.display(),
            kb.magic.len(),
            kb.hashes.len(),
            kb.encodings.len()
        );
        Ok(kb)
    }

    /// Appends a magic-byte signature
    pub fn with_magic(mut self, signature: MagicSignature) -> Self {
        self.magic.push(signature);
        self
    }

    /// Appends a hash-format pattern
    pub fn with_hash(mut self, pattern: NamedPattern) -> Self {
        self.hashes.push(pattern);
        self
    }

    /// Appends an encoding-format pattern
    pub fn with_encoding(mut self, pattern: NamedPattern) -> Self {
        self.encodings.push(pattern);
        self
    }

    /// Magic-byte signatures in precedence order
    pub fn magic(&self) -> &[MagicSignature] {
        &self.magic
    }

    /// Hash-format patterns in precedence order
    pub fn hashes(&self) -> &[NamedPattern] {
        &self.hashes
    }

    /// Encoding-format patterns in precedence order
    pub fn encodings(&self) -> &[NamedPattern] {
        &self.encodings
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KnowledgeDocument {
    #[serde(default)]
    magic: Vec<MagicEntry>,
    #[serde(default)]
    hashes: Vec<PatternEntry>,
    #[serde(default)]
    encodings: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct MagicEntry {
    name: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    name: String,
    pattern: String,
}

impl KnowledgeDocument {
    fn compile(self) -> Result<KnowledgeBase> {
        let magic = self
            .magic
            .into_iter()
            .map(|entry| {
                let bytes = hex::decode(entry.signature.replace(' ', ""))
                    .map_err(|e| Error::invalid_signature(entry.name.clone(), e.to_string()))?;
                if bytes.is_empty() {
                    return Err(Error::invalid_signature(entry.name, "empty signature"));
                }
                Ok(MagicSignature::new(entry.name, bytes))
            })
            .collect::<Result<Vec<_>>>()?;

        let compile = |entries: Vec<PatternEntry>| {
            entries
                .into_iter()
                .map(|entry| NamedPattern::new(entry.name, &entry.pattern))
                .collect::<Result<Vec<_>>>()
        };

        Ok(KnowledgeBase {
            magic,
            hashes: compile(self.hashes)?,
            encodings: compile(self.encodings)?,
        })
    }
}
