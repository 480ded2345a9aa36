//! Error types for the sleuth-core library.
//!
//! Analysis itself never fails: a strategy that does not apply simply
//! yields no solution. The variants here cover the setup paths (loading a
//! knowledge base) and the transport layer behind the online oracles, which
//! convert them into "no answer" at their trait boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sleuth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all fallible sleuth operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Knowledge base document is not valid JSON for the expected schema
    #[error("failed to parse knowledge base: {0}")]
    KnowledgeBaseParse(#[from] serde_json::Error),

    /// A configured pattern does not compile
    #[error("invalid pattern for '{name}': {source}")]
    InvalidPattern {
        /// Table entry the pattern belongs to
        name: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// A configured magic-byte signature is not valid hex
    #[error("invalid signature for '{name}': {details}")]
    InvalidSignature {
        /// Table entry the signature belongs to
        name: String,
        /// Detailed description of the issue
        details: String,
    },

    /// HTTP transport failure (DNS, connect, timeout)
    #[error("request to {url} failed: {details}")]
    Transport {
        /// Requested URL
        url: String,
        /// Transport error description
        details: String,
    },

    /// Remote service answered with a non-success status
    #[error("request to {url} returned status {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Remote service answered with a body we could not interpret
    #[error("malformed response from {url}: {details}")]
    MalformedResponse {
        /// Requested URL
        url: String,
        /// Detailed description of the issue
        details: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new invalid pattern error
    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }

    /// Creates a new invalid signature error
    pub fn invalid_signature(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidSignature {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Creates a new transport error
    pub fn transport(url: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            details: details.into(),
        }
    }

    /// Creates a new malformed response error
    pub fn malformed_response(url: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_signature("PNG", "odd number of digits");
        assert!(err.to_string().contains("PNG"));
        assert!(err.to_string().contains("odd number of digits"));
    }
}
