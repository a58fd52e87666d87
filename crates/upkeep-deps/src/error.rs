//! Error types for upkeep-deps

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using upkeep-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in upkeep-deps
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A declaration file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Invalid version string
    #[error("Invalid version '{0}': {1}")]
    InvalidVersion(String, String),

    /// Declaration not found when applying an update
    #[error("Cannot find declaration for '{name}' in {path}")]
    DependencyNotFound {
        /// Identity of the missing declaration
        name: String,
        /// File that was expected to contain it
        path: PathBuf,
    },

    /// External regeneration command failed
    #[error("Regeneration command '{command}' failed: {message}")]
    Regeneration {
        /// The command that was run
        command: String,
        /// Captured failure output
        message: String,
    },
}
