//! Kustomize remote resource update

use super::write_if_changed;
use crate::{Error, Result};
use std::path::PathBuf;

/// An update to a Kustomize external resource reference.
#[derive(Debug, Clone)]
pub struct KustomizeUpdate {
    /// File containing the declaration
    pub path: PathBuf,
    /// The full resource URL as currently written
    pub url: String,
    /// `owner/repo` of the referenced repository
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// The current pinned ref
    pub current: String,
    /// The latest available tag
    pub latest: String,
}

impl KustomizeUpdate {
    /// Short description of this update.
    pub fn description(&self) -> String {
        format!(
            "Update {}/{} Kustomize resource from {} to {}",
            self.owner, self.repo, self.current, self.latest
        )
    }

    /// Rewrite the resource's `?ref=` query parameter, leaving unrelated
    /// resource entries and formatting untouched.
    pub fn apply(&self) -> Result<()> {
        let suffix = format!("?ref={}", self.current);
        let Some(base) = self.url.strip_suffix(&suffix) else {
            // The pinned ref changed since the scan; nothing to rewrite.
            return Err(Error::DependencyNotFound {
                name: self.url.clone(),
                path: self.path.clone(),
            });
        };
        let new_url = format!("{}?ref={}", base, self.latest);

        let content = std::fs::read_to_string(&self.path)?;
        if !content.contains(&self.url) {
            // Already rewritten by an earlier application of this update.
            if content.contains(&new_url) {
                return Ok(());
            }
            return Err(Error::DependencyNotFound {
                name: self.url.clone(),
                path: self.path.clone(),
            });
        }
        let rewritten = content.replace(&self.url, &new_url);
        write_if_changed(&self.path, &content, &rewritten)
    }
}
