//! Error types for upkeep-git

use thiserror::Error;

/// Errors from working-tree operations
#[derive(Debug, Error)]
pub enum GitError {
    /// Underlying git operation failed
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No default branch could be detected
    #[error("Cannot detect default branch for {0}")]
    NoDefaultBranch(String),

    /// Pushing a branch was rejected by the remote
    #[error("Pushing {branch} failed: {message}")]
    Push {
        /// The branch that was pushed
        branch: String,
        /// The remote's rejection message
        message: String,
    },
}

/// Errors from pull request publishing
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected a request
    #[error("GitHub API request to {url} failed with status {status}: {message}")]
    Api {
        /// The URL that was requested
        url: String,
        /// The response status code
        status: u16,
        /// The response body
        message: String,
    },

    /// A header value could not be constructed
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}
