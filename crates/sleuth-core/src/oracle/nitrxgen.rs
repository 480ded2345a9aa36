//! nitrxgen.net MD5 database lookup.

use super::http::HttpClient;
use super::HashOracle;
use tracing::debug;

const MD5DB_URL: &str = "https://www.nitrxgen.net/md5db";

/// Hash reversal through the nitrxgen MD5 database.
///
/// NTLM digests share the MD5 shape and are sent to the same service.
#[derive(Debug, Clone, Default)]
pub struct Nitrxgen {
    client: HttpClient,
}

impl Nitrxgen {
    /// Creates a client with the given HTTP settings
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Whether the service can answer for this hash kind
    pub fn supports(kind: &str) -> bool {
        matches!(kind, "MD5" | "NTLM")
    }
}

impl HashOracle for Nitrxgen {
    fn lookup(&self, hash: &str, kind: &str) -> Option<String> {
        if !Self::supports(kind) {
            debug!("No online lookup for {} hashes", kind);
            return None;
        }

        let url = format!("{}/{}", MD5DB_URL, hash);
        match self.client.get_text(&url) {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => None,
            Err(e) => {
                debug!("md5db lookup failed: {}", e);
                None
            }
        }
    }
}
