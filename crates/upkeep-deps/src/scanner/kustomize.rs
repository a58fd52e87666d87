//! Kustomize remote resource scanning

use super::{find_files, ScanFailure, ScanOutcome, Scanner};
use crate::types::{Dependency, DependencyKind, KustomizeDependency};
use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

const KUSTOMIZATION_FILES: &[&str] = &["kustomization.yaml"];

/// Matches external resources of the form
/// `github.com/<owner>/<repo>(.git)?//<path>?ref=<version>`, in either the
/// short form or a full URL. Captures owner, repo, and the pinned ref.
fn resource_regex() -> &'static Regex {
    static RESOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
    RESOURCE_REGEX
        .get_or_init(|| Regex::new(r"github\.com/([^/]+)/([^/.]+).*?\?ref=(.*)").unwrap())
}

#[derive(Debug, Default, Deserialize)]
struct KustomizationFile {
    #[serde(default)]
    resources: Vec<serde_yaml::Value>,
}

/// Scan a source tree for Kustomize external resource references.
///
/// Local resource paths are not dependencies and are ignored; only entries
/// referencing a GitHub repository with an explicit `?ref=` pin count.
pub struct KustomizeScanner;

impl KustomizeScanner {
    /// Create a new Kustomize scanner.
    pub fn new() -> Self {
        Self
    }

    fn scan_file(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let kustomization: KustomizationFile =
            serde_yaml::from_str(&content).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut results = Vec::new();
        for resource in &kustomization.resources {
            let Some(resource) = resource.as_str() else {
                continue;
            };
            let Some(captures) = resource_regex().captures(resource) else {
                continue;
            };
            results.push(Dependency::Kustomize(KustomizeDependency {
                url: resource.to_string(),
                owner: captures[1].to_string(),
                repo: captures[2].to_string(),
                version: captures[3].to_string(),
                path: path.to_path_buf(),
            }));
        }
        Ok(results)
    }
}

impl Default for KustomizeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for KustomizeScanner {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Kustomize
    }

    fn scan(&self, root: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for path in find_files(root, KUSTOMIZATION_FILES) {
            match self.scan_file(&path) {
                Ok(deps) => outcome.dependencies.extend(deps),
                Err(error) => outcome.failures.push(ScanFailure { path, error }),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_remote_resources() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("manifests");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("kustomization.yaml"),
            r#"resources:
  - ../local/base
  - github.com/lsst-sqre/sqre-tms-aws//manifests/base?ref=0.6.0
  - https://github.com/lsst-sqre/gafaelfawr.git//manifests/base?ref=v1.0.0
"#,
        )
        .unwrap();

        let outcome = KustomizeScanner::new().scan(tmp.path());
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.dependencies.len(), 2);

        let Dependency::Kustomize(short) = &outcome.dependencies[0] else {
            panic!("expected a Kustomize dependency");
        };
        assert_eq!(short.owner, "lsst-sqre");
        assert_eq!(short.repo, "sqre-tms-aws");
        assert_eq!(short.version, "0.6.0");

        let Dependency::Kustomize(full) = &outcome.dependencies[1] else {
            panic!("expected a Kustomize dependency");
        };
        assert_eq!(full.repo, "gafaelfawr");
        assert_eq!(full.version, "v1.0.0");
    }

    #[test]
    fn test_resources_without_ref_are_ignored() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("kustomization.yaml"),
            "resources:\n  - github.com/owner/repo//manifests/base\n",
        )
        .unwrap();

        let outcome = KustomizeScanner::new().scan(tmp.path());
        assert!(outcome.dependencies.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
