//! Error types for upkeep-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors from analysis or processing
#[derive(Debug, Error)]
pub enum Error {
    /// Scanning or applying a declaration update failed
    #[error(transparent)]
    Deps(#[from] upkeep_deps::Error),

    /// An inventory lookup failed
    #[error(transparent)]
    Info(#[from] upkeep_info::Error),

    /// A working-tree operation failed
    #[error(transparent)]
    Git(#[from] upkeep_git::GitError),

    /// Publishing a pull request failed
    #[error(transparent)]
    Publish(#[from] upkeep_git::PublishError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frozen analysis needs a clean tree to attribute changes to the
    /// regeneration command
    #[error("Working tree at {0} has uncommitted changes")]
    DirtyTree(PathBuf),

    /// Pushing and publishing require an API token
    #[error("No GitHub token configured")]
    MissingToken,
}

/// Result alias for upkeep-core
pub type Result<T> = std::result::Result<T, Error>;
