//! # sleuth-core
//!
//! A library for peeling encodings and weak ciphers off CTF-style artifacts.
//!
//! This crate provides the core functionality for:
//! - Classifying a byte blob by file signature, hash shape or encoding alphabet
//! - Scoring it with Shannon entropy and the index of coincidence
//! - Reversing standard encodings, rotation ciphers, single-byte XOR and
//!   dictionary Vigenère
//! - Attacking RSA challenges with small exponents or known factors
//! - Repeating the above on every decoded layer, up to a depth limit
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`stats`]: Entropy and coincidence statistics
//! - [`knowledge`]: Signature and pattern tables
//! - [`identify`]: Artifact classification
//! - [`decode`]: Keyless decoders
//! - [`poly`]: XOR and Vigenère attacks
//! - [`rsa`]: RSA parameter parsing and attacks
//! - [`oracle`]: Factorization, hash lookup and link collaborators
//! - [`report`]: Progress reporting
//! - [`engine`]: Layered analysis driver
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use sleuth_core::{Engine, NullReporter, Termination};
//!
//! let engine = Engine::default();
//! let analysis = engine.analyze(b"cvpbPGS{guvf_vf_n_g3fg}", &mut NullReporter);
//!
//! assert_eq!(analysis.chain[0].algorithm, "Rot13");
//! assert_eq!(analysis.termination, Termination::Success);
//! ```
//!
//! ## Extensibility
//!
//! The library provides several traits for customization:
//!
//! - [`LayerDecoder`]: Replace the keyless decoder battery
//! - [`FactorOracle`] and [`HashOracle`]: Plug in online lookups
//! - [`LinkGenerator`]: Customize the reference links
//! - [`Reporter`]: Customize how progress is reported
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod decode;
pub mod engine;
pub mod error;
pub mod identify;
pub mod knowledge;
pub mod oracle;
pub mod poly;
pub mod report;
pub mod rsa;
pub mod solution;
pub mod stats;

// Re-export primary types for convenience
pub use decode::{try_decode, LayerDecoder, LocalDecoder};
pub use engine::{Analysis, Artifact, Engine, EngineConfig, LayerSummary, Termination};
pub use error::{Error, Result};
pub use identify::{identify, identify_with_params, Identification};
pub use knowledge::KnowledgeBase;
pub use oracle::{FactorDb, FactorOracle, HashOracle, LinkGenerator, NoOracle, Nitrxgen, ReferenceLinks};
pub use poly::{solve_single_byte_xor, solve_vigenere, VigenereHit, XorOutcome};
pub use report::{NullReporter, Reporter, Stage, TextReporter};
pub use rsa::{RsaParams, RsaSolver};
pub use solution::Solution;
pub use stats::{EntropyBucket, LayerStats};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
