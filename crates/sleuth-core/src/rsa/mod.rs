//! RSA parameter extraction and weak-key attacks.
//!
//! Challenge text commonly spells out `n`, `e` and `c`. Once all three are
//! present two attacks are tried in order:
//!
//! 1. **Small exponent**: when `m^e < n` the ciphertext is just `m^e` over
//!    the integers, so an integer `e`-th root recovers `m`.
//! 2. **Known factors**: a [`FactorOracle`] supplies `p` and `q`, from
//!    which the private exponent is rebuilt and `c` decrypted.
//!
//! The oracle output is trusted as-is; a wrong factorization yields garbage
//! plaintext, not an error.

mod math;

use crate::oracle::FactorOracle;
use crate::report::Reporter;
use crate::solution::Solution;
use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use regex::bytes::Regex;
use tracing::{debug, info};

pub use math::{integer_root, mod_inverse, to_message_bytes};

/// Exponents at or above this value are not tried with the root attack
pub const DEFAULT_SMALL_EXPONENT_BOUND: u64 = 100_000;

lazy_static! {
    static ref MODULUS_PATTERN: Regex =
        Regex::new(r"(?i)(?:n|modulus)\s*[:=]\s*((?:0x)?[0-9a-f]+)").unwrap();
    static ref EXPONENT_PATTERN: Regex =
        Regex::new(r"(?i)(?:e|exponent)\s*[:=]\s*((?:0x)?[0-9a-f]+)").unwrap();
    static ref CIPHERTEXT_PATTERN: Regex =
        Regex::new(r"(?i)(?:c|ciphertext)\s*[:=]\s*((?:0x)?[0-9a-f]+)").unwrap();
}

/// RSA values found in challenge text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsaParams {
    /// Public modulus
    pub n: Option<BigUint>,
    /// Public exponent
    pub e: Option<BigUint>,
    /// Ciphertext
    pub c: Option<BigUint>,
}

impl RsaParams {
    /// Creates a complete parameter set
    pub fn new(n: BigUint, e: BigUint, c: BigUint) -> Self {
        Self {
            n: Some(n),
            e: Some(e),
            c: Some(c),
        }
    }

    /// Scan free-form text for `n`, `e` and `c` assignments.
    ///
    /// Accepts `name: value` or `name = value`, case-insensitively, with
    /// `modulus`, `exponent` and `ciphertext` as long forms. Values are
    /// decimal or `0x`-prefixed hex. Only the first assignment of each name
    /// is considered; if it does not parse, the field stays absent.
    pub fn parse(text: &[u8]) -> Self {
        Self {
            n: extract(&MODULUS_PATTERN, text),
            e: extract(&EXPONENT_PATTERN, text),
            c: extract(&CIPHERTEXT_PATTERN, text),
        }
    }

    /// True when `n`, `e` and `c` are all present
    pub fn is_complete(&self) -> bool {
        self.n.is_some() && self.e.is_some() && self.c.is_some()
    }

    /// Borrow all three values, if present
    pub fn values(&self) -> Option<(&BigUint, &BigUint, &BigUint)> {
        match (&self.n, &self.e, &self.c) {
            (Some(n), Some(e), Some(c)) => Some((n, e, c)),
            _ => None,
        }
    }
}

fn extract(pattern: &Regex, text: &[u8]) -> Option<BigUint> {
    let captures = pattern.captures(text)?;
    let literal = captures.get(1)?.as_bytes();
    parse_literal(literal)
}

/// Parse a decimal or `0x`-prefixed hexadecimal literal
pub fn parse_literal(literal: &[u8]) -> Option<BigUint> {
    match literal {
        [b'0', b'x' | b'X', digits @ ..] if !digits.is_empty() => {
            BigUint::parse_bytes(digits, 16)
        }
        digits => BigUint::parse_bytes(digits, 10),
    }
}

/// Runs the RSA attacks against a parameter set
#[derive(Debug, Clone)]
pub struct RsaSolver {
    exponent_bound: BigUint,
}

impl Default for RsaSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SMALL_EXPONENT_BOUND)
    }
}

impl RsaSolver {
    /// Creates a solver trying the root attack for `e < exponent_bound`
    pub fn new(exponent_bound: u64) -> Self {
        Self {
            exponent_bound: BigUint::from(exponent_bound),
        }
    }

    /// Try the small-exponent attack, then the factor attack if an oracle
    /// is available. The oracle's answer is passed on to `reporter`.
    pub fn solve(
        &self,
        params: &RsaParams,
        oracle: Option<&dyn FactorOracle>,
        reporter: &mut dyn Reporter,
    ) -> Option<Solution> {
        let (n, e, c) = params.values()?;

        if let Some(solution) = self.small_exponent(e, c) {
            return Some(solution);
        }

        let oracle = oracle?;
        factor_attack(n, e, c, oracle, reporter)
    }

    /// Recover `m` from `c = m^e` when the modulus never wrapped
    pub fn small_exponent(&self, e: &BigUint, c: &BigUint) -> Option<Solution> {
        if e.is_zero() || e >= &self.exponent_bound {
            debug!("Exponent {} outside small-exponent range", e);
            return None;
        }
        let k = e.to_u32()?;

        let root = integer_root(c, k);
        let next = &root + 1u32;

        for candidate in [root, next] {
            if &candidate.pow(k) == c {
                debug!("Found exact {}-th root of ciphertext", k);
                return Some(Solution::new(
                    format!("RSA Small Exponent (e={})", e),
                    to_message_bytes(&candidate),
                ));
            }
        }

        debug!("Ciphertext is not a perfect {}-th power", k);
        None
    }
}

/// Decrypt using factors supplied by `oracle`
pub fn factor_attack(
    n: &BigUint,
    e: &BigUint,
    c: &BigUint,
    oracle: &dyn FactorOracle,
    reporter: &mut dyn Reporter,
) -> Option<Solution> {
    if n.is_zero() {
        return None;
    }

    let Some((p, q)) = oracle.factor(n) else {
        info!("{}: N not factored", oracle.name());
        reporter.factor_lookup(oracle.name(), false);
        return None;
    };
    reporter.factor_lookup(oracle.name(), true);
    info!("{}: factored N into {} bit and {} bit primes", oracle.name(), p.bits(), q.bits());

    if p.is_zero() || q.is_zero() {
        return None;
    }
    let one = BigUint::one();
    let phi = (&p - &one) * (&q - &one);

    let Some(d) = mod_inverse(e, &phi) else {
        debug!("e has no inverse modulo phi");
        return None;
    };

    let m = c.modpow(&d, n);
    Some(Solution::new(
        format!("RSA {} (Weak Key)", oracle.name()),
        to_message_bytes(&m),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{NullReporter, TextReporter};
    use pretty_assertions::assert_eq;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    struct FixedFactors(Option<(u64, u64)>);

    impl FactorOracle for FixedFactors {
        fn name(&self) -> &str {
            "FactorDB"
        }

        fn factor(&self, _n: &BigUint) -> Option<(BigUint, BigUint)> {
            self.0.map(|(p, q)| (big(p), big(q)))
        }
    }

    #[test]
    fn test_parse_mixed_formats() {
        let params = RsaParams::parse(b"N: 12345\ne: 3\nC = 0x1a");
        assert_eq!(params.n, Some(big(12345)));
        assert_eq!(params.e, Some(big(3)));
        assert_eq!(params.c, Some(big(26)));
        assert!(params.is_complete());
    }

    #[test]
    fn test_parse_long_names() {
        let text = b"Modulus = 0xC5\nExponent: 65537\nCiphertext=42";
        let params = RsaParams::parse(text);
        assert_eq!(params, RsaParams::new(big(0xC5), big(65537), big(42)));
    }

    #[test]
    fn test_parse_missing_fields() {
        let params = RsaParams::parse(b"n = 77\nsomething else");
        assert_eq!(params.n, Some(big(77)));
        assert_eq!(params.e, None);
        assert_eq!(params.c, None);
        assert!(!params.is_complete());
        assert!(params.values().is_none());
    }

    #[test]
    fn test_parse_failure_leaves_field_absent() {
        // Bare hex without the 0x prefix is not a decimal literal
        let params = RsaParams::parse(b"n = 1f\ne = 3\nc = 8");
        assert_eq!(params.n, None);
        assert_eq!(params.e, Some(big(3)));
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal(b"0x1A"), Some(big(26)));
        assert_eq!(parse_literal(b"0X10"), Some(big(16)));
        assert_eq!(parse_literal(b"987654321"), Some(big(987654321)));
        assert_eq!(parse_literal(b"12ab"), None);
    }

    #[test]
    fn test_small_exponent_attack() {
        let params = RsaParams::new(big(100000), big(3), big(74088));
        let solution = RsaSolver::default().solve(&params, None, &mut NullReporter).unwrap();
        assert_eq!(solution.algorithm, "RSA Small Exponent (e=3)");
        assert_eq!(solution.decoded, b"*".to_vec());
    }

    #[test]
    fn test_small_exponent_long_message() {
        let m = BigUint::from_bytes_be(b"picoCTF{n0_p4dd1ng}");
        let n = BigUint::one() << 2048u32;
        let params = RsaParams::new(n, big(3), m.pow(3));
        let solution = RsaSolver::default().solve(&params, None, &mut NullReporter).unwrap();
        assert_eq!(solution.decoded, b"picoCTF{n0_p4dd1ng}".to_vec());
    }

    #[test]
    fn test_small_exponent_rejects_non_power() {
        let params = RsaParams::new(big(100000), big(3), big(74089));
        assert!(RsaSolver::default().solve(&params, None, &mut NullReporter).is_none());
    }

    #[test]
    fn test_large_exponent_skips_root_attack() {
        let solver = RsaSolver::default();
        assert!(solver.small_exponent(&big(100000), &big(1)).is_none());
        assert!(solver.small_exponent(&big(65537), &big(1)).is_some());
        assert!(solver.small_exponent(&big(0), &big(1)).is_none());
    }

    #[test]
    fn test_factor_attack() {
        // Textbook key: p = 61, q = 53, e = 17, d = 2753
        let n = big(3233);
        let e = big(17);
        let c = big(65).modpow(&e, &n);
        assert_eq!(c, big(2790));
        let params = RsaParams::new(n, e, c);

        // Bound of 3 keeps the root attack out of the way
        let oracle = FixedFactors(Some((61, 53)));
        let solution = RsaSolver::new(3).solve(&params, Some(&oracle), &mut NullReporter).unwrap();
        assert_eq!(solution.algorithm, "RSA FactorDB (Weak Key)");
        assert_eq!(solution.decoded, b"A".to_vec());
    }

    #[test]
    fn test_factor_attack_failures() {
        let params = RsaParams::new(big(3233), big(65537), big(1000));

        let not_found = FixedFactors(None);
        assert!(RsaSolver::new(3).solve(&params, Some(&not_found), &mut NullReporter).is_none());

        // gcd(e, phi) != 1
        let params = RsaParams::new(big(3233), big(3120), big(1000));
        let oracle = FixedFactors(Some((61, 53)));
        assert!(RsaSolver::new(3).solve(&params, Some(&oracle), &mut NullReporter).is_none());

        // No oracle, no factor attack
        let params = RsaParams::new(big(3233), big(65537), big(1000));
        assert!(RsaSolver::new(3).solve(&params, None, &mut NullReporter).is_none());
    }

    #[test]
    fn test_factor_lookup_is_reported() {
        let params = RsaParams::new(big(3233), big(17), big(2790));

        let mut reporter = TextReporter::new(Vec::new());
        let oracle = FixedFactors(Some((61, 53)));
        assert!(RsaSolver::new(3).solve(&params, Some(&oracle), &mut reporter).is_some());
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert_eq!(out, "    [+] Attack: FactorDB Lookup (Success)\n");

        let mut reporter = TextReporter::new(Vec::new());
        let not_found = FixedFactors(None);
        assert!(RsaSolver::new(3).solve(&params, Some(&not_found), &mut reporter).is_none());
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert_eq!(out, "    [!] FactorDB: N not factored.\n");
    }

    #[test]
    fn test_small_exponent_skips_oracle() {
        let params = RsaParams::new(big(100000), big(3), big(74088));
        let mut reporter = TextReporter::new(Vec::new());
        let oracle = FixedFactors(None);
        assert!(RsaSolver::default().solve(&params, Some(&oracle), &mut reporter).is_some());
        assert!(reporter.finish().unwrap().is_empty());
    }
}
