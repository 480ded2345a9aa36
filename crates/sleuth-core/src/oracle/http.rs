//! Blocking HTTP plumbing shared by the online oracles.

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::trace;

/// Client-side timeout for every oracle request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; CipherSleuth/1.0; +https://github.com/byteoverride/cipher-sleuth)";

/// Thin wrapper around a `ureq` agent with a fixed timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpClient {
    /// Creates a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }

    /// GET `url` and return the body of a 200 response
    pub fn get_text(&self, url: &str) -> Result<String> {
        trace!("GET {}", url);

        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(Error::HttpStatus {
                    url: url.to_string(),
                    status,
                })
            }
            Err(e) => return Err(Error::transport(url, e.to_string())),
        };

        if response.status() != 200 {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response
            .into_string()
            .map_err(|e| Error::malformed_response(url, e.to_string()))
    }
}
