//! External collaborators consulted by the engine.
//!
//! The engine only sees the traits defined here:
//!
//! - [`FactorOracle`]: prime factors of an RSA modulus
//! - [`HashOracle`]: plaintext for a known hash
//! - [`LinkGenerator`]: reference links for manual follow-up
//!
//! Network-backed implementations ([`FactorDb`], [`Nitrxgen`]) fold every
//! transport or protocol failure into "no answer", so a flaky service never
//! interrupts an analysis.

mod factordb;
mod http;
mod links;
mod nitrxgen;

use num_bigint::BigUint;

pub use factordb::{parse_factordb_response, FactorDb, FactorValue};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use links::ReferenceLinks;
pub use nitrxgen::Nitrxgen;

/// Source of prime factorizations
pub trait FactorOracle {
    /// Short name used in algorithm labels and logs
    fn name(&self) -> &str;

    /// Two factors `(p, q)` of `n`, or `None` if unknown.
    ///
    /// `p == q` signals `n = p²`.
    fn factor(&self, n: &BigUint) -> Option<(BigUint, BigUint)>;
}

/// Source of hash reversals
pub trait HashOracle {
    /// Plaintext for `hash`, interpreted as a `kind` hash (e.g. `MD5`)
    fn lookup(&self, hash: &str, kind: &str) -> Option<String>;
}

/// Formats reference links for an undecoded artifact
pub trait LinkGenerator {
    /// Informational links for `data`
    fn links(&self, data: &[u8]) -> Vec<String>;
}

/// Oracle that never knows anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl FactorOracle for NoOracle {
    fn name(&self) -> &str {
        "none"
    }

    fn factor(&self, _n: &BigUint) -> Option<(BigUint, BigUint)> {
        None
    }
}

impl HashOracle for NoOracle {
    fn lookup(&self, _hash: &str, _kind: &str) -> Option<String> {
        None
    }
}

impl LinkGenerator for NoOracle {
    fn links(&self, _data: &[u8]) -> Vec<String> {
        Vec::new()
    }
}
