//! Working-tree management and pull request publishing for upkeep
//!
//! [`Repository`] owns a single working-tree checkout for the duration of
//! one processing pass: acquire (clone fresh or reset a persistent
//! checkout to the upstream default branch tip), branch, commit, push.
//! [`PullRequester`] finds or creates the pull request for the pushed
//! branch and attempts auto-merge as a best effort.

#![warn(missing_docs)]

mod error;
mod pr;
mod repository;

pub use error::{GitError, PublishError};
pub use pr::{CommitMessage, PullRequester};
pub use repository::{Repository, UPDATE_BRANCH};
