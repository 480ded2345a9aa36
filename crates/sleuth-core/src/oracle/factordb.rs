//! factordb.com lookup.
//!
//! The API answers with a status code and a list of `[factor, exponent]`
//! pairs. Factors arrive as strings for large values and as JSON numbers
//! for small ones, so both are accepted.

use super::http::HttpClient;
use super::FactorOracle;
use crate::error::{Error, Result};
use crate::rsa::parse_literal;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Deserialize;
use tracing::debug;

const FACTORDB_API: &str = "http://factordb.com/api";

/// A factor or exponent as found in the JSON document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    /// Decimal string, used for values beyond JSON number precision
    Text(String),
    /// Plain JSON number
    Number(serde_json::Number),
}

impl FactorValue {
    /// Interpret as a non-negative integer
    pub fn to_biguint(&self) -> Option<BigUint> {
        match self {
            FactorValue::Text(text) => parse_literal(text.trim().as_bytes()),
            FactorValue::Number(number) => {
                if let Some(value) = number.as_u64() {
                    Some(BigUint::from(value))
                } else {
                    let value = number.as_f64()?;
                    if value.is_finite() && value >= 0.0 {
                        parse_literal(format!("{:.0}", value).as_bytes())
                    } else {
                        None
                    }
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FactorDbResponse {
    status: String,
    #[serde(default)]
    factors: Vec<(FactorValue, FactorValue)>,
}

/// Extract `(p, q)` from a factordb API response body.
///
/// Only fully factored (`FF`) or composite-with-known-factors (`CF`)
/// answers are used. Two or more factors yield the first two; a single
/// factor with exponent 2 yields `(p, p)`.
pub fn parse_factordb_response(body: &str) -> Result<Option<(BigUint, BigUint)>> {
    let response: FactorDbResponse = serde_json::from_str(body)
        .map_err(|e| Error::malformed_response(FACTORDB_API, e.to_string()))?;

    if response.status != "FF" && response.status != "CF" {
        debug!("factordb status {}: not factored", response.status);
        return Ok(None);
    }

    let positive = |value: &FactorValue| value.to_biguint().filter(|v| !v.is_zero());

    if let [(first, _), (second, _), ..] = response.factors.as_slice() {
        if let (Some(p), Some(q)) = (positive(first), positive(second)) {
            return Ok(Some((p, q)));
        }
    }

    if let [(factor, exponent)] = response.factors.as_slice() {
        if exponent.to_biguint() == Some(BigUint::from(2u32)) {
            return Ok(positive(factor).map(|p| (p.clone(), p)));
        }
    }

    Ok(None)
}

/// factordb.com client
#[derive(Debug, Clone, Default)]
pub struct FactorDb {
    client: HttpClient,
}

impl FactorDb {
    /// Creates a client with the given HTTP settings
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn query(&self, n: &BigUint) -> Result<Option<(BigUint, BigUint)>> {
        let url = format!("{}?query={}", FACTORDB_API, n);
        let body = self.client.get_text(&url)?;
        parse_factordb_response(&body)
    }
}

impl FactorOracle for FactorDb {
    fn name(&self) -> &str {
        "FactorDB"
    }

    fn factor(&self, n: &BigUint) -> Option<(BigUint, BigUint)> {
        match self.query(n) {
            Ok(factors) => factors,
            Err(e) => {
                debug!("factordb lookup failed: {}", e);
                None
            }
        }
    }
}
