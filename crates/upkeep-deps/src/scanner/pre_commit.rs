//! pre-commit hook pin scanning

use super::{ScanFailure, ScanOutcome, Scanner};
use crate::types::{Dependency, DependencyKind, PreCommitDependency};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

const CONFIG_FILE: &str = ".pre-commit-config.yaml";

#[derive(Debug, Default, Deserialize)]
struct PreCommitConfig {
    #[serde(default)]
    repos: Vec<serde_yaml::Value>,
}

/// Scan a source tree for pre-commit hook revision pins.
///
/// Only the tree root is consulted; pre-commit reads a single
/// `.pre-commit-config.yaml` at the repository root.
pub struct PreCommitScanner;

impl PreCommitScanner {
    /// Create a new pre-commit scanner.
    pub fn new() -> Self {
        Self
    }

    fn scan_file(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let config: PreCommitConfig = serde_yaml::from_str(&content).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut results = Vec::new();
        for hook in &config.repos {
            let repository = hook.get("repo").and_then(|v| v.as_str());
            let rev = hook.get("rev").and_then(|v| v.as_str());
            let (Some(repository), Some(rev)) = (repository, rev) else {
                // Meta repositories ("local", "meta") have no rev to track.
                continue;
            };
            let Some((owner, repo)) = parse_github_url(repository) else {
                warn!(repository, "Hook repository is not on GitHub, skipping");
                continue;
            };
            results.push(Dependency::PreCommit(PreCommitDependency {
                repository: repository.to_string(),
                owner,
                repo,
                version: rev.to_string(),
                path: path.to_path_buf(),
            }));
        }
        Ok(results)
    }
}

/// Extract the owner and repository name from a GitHub URL.
fn parse_github_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let mut segments = rest.splitn(2, '/');
    let owner = segments.next()?;
    let repo = segments.next()?.trim_end_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

impl Default for PreCommitScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for PreCommitScanner {
    fn kind(&self) -> DependencyKind {
        DependencyKind::PreCommit
    }

    fn scan(&self, root: &Path) -> ScanOutcome {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return ScanOutcome::default();
        }
        match self.scan_file(&path) {
            Ok(dependencies) => ScanOutcome {
                dependencies,
                failures: Vec::new(),
            },
            Err(error) => ScanOutcome {
                dependencies: Vec::new(),
                failures: vec![ScanFailure { path, error }],
            },
        }
    }
}
