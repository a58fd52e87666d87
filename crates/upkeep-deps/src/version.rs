//! Version parsing and freshness comparison

use crate::{Error, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// A strict semantic version that remembers its original spelling.
///
/// Upstream tags and pinned revisions frequently carry a leading `v`
/// (`v3.4.0`). The prefix is stripped for parsing and comparison but
/// preserved for display, so a rewritten declaration keeps the convention
/// the file already used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    raw: String,
    parsed: Version,
}

impl ParsedVersion {
    /// Parse a version string, tolerating a leading `v`.
    pub fn parse(raw: &str) -> Result<Self> {
        let bare = raw.strip_prefix('v').unwrap_or(raw);
        let parsed = Version::parse(bare)
            .map_err(|e| Error::InvalidVersion(raw.to_string(), e.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// Whether a string parses as a strict semantic version.
    pub fn is_valid(raw: &str) -> bool {
        let bare = raw.strip_prefix('v').unwrap_or(raw);
        Version::parse(bare).is_ok()
    }

    /// The original spelling, including any `v` prefix.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed semantic version.
    pub fn semver(&self) -> &Version {
        &self.parsed
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Decide whether `latest` is an update relative to `current`.
///
/// `latest` must be a valid semantic version (inventories only ever propose
/// semver tags). A `current` value that does not parse sorts below every
/// valid version: a garbage pin is always considered stale.
pub fn is_newer(current: &str, latest: &str) -> Result<bool> {
    let latest = ParsedVersion::parse(latest)?;
    match ParsedVersion::parse(current) {
        Ok(current) => Ok(latest > current),
        Err(_) => Ok(true),
    }
}
