//! Error types for upkeep-info

use thiserror::Error;

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by inventory lookups
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote resource does not exist (permanent)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (transient)
    #[error("Rate limit exceeded for URL: {0}")]
    RateLimited(String),

    /// Unexpected HTTP status
    #[error("HTTP request to {url} failed with status {status}")]
    Status {
        /// The URL that was requested
        url: String,
        /// The response status code
        status: u16,
    },

    /// Response body failed to parse as YAML
    #[error("Failed to parse YAML response: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid header value (e.g., a malformed token)
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Rate limits, server errors, and transport-level failures are
    /// retryable; not-found responses and parse errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::RateLimited("u".to_string()).is_transient());
        assert!(Error::Status {
            url: "u".to_string(),
            status: 503
        }
        .is_transient());
        assert!(!Error::Status {
            url: "u".to_string(),
            status: 403
        }
        .is_transient());
        assert!(!Error::NotFound("u".to_string()).is_transient());
    }
}
