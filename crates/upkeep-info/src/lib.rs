//! Upstream version inventories for upkeep
//!
//! This library answers one question per upstream source: what is the
//! latest version available? Two providers exist:
//!
//! - [`GitHubInventory`] lists a repository's tags and returns the largest
//!   strict semantic version. Tags that do not parse as semver are
//!   unorderable and never proposed as update targets.
//! - [`HelmInventory`] fetches a chart repository's index document and
//!   answers lookups by chart name.
//!
//! Both providers cache results for the duration of one pipeline run with
//! at-most-once-per-key fetching, so concurrent lookups of the same
//! upstream share a single remote call. Remote failures are classified as
//! transient (retried with backoff by the HTTP client) or permanent via
//! [`Error::is_transient`].

#![warn(missing_docs)]

mod cache;
mod client;
mod error;
mod github;
mod helm;

pub use client::HttpClient;
pub use error::{Error, Result};
pub use github::GitHubInventory;
pub use helm::HelmInventory;
