//! Helm chart dependency scanning

use super::{find_files, ScanFailure, ScanOutcome, Scanner};
use crate::types::{Dependency, DependencyKind, HelmDependency};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Chart manifests that may declare dependencies. `Chart.yaml` is the
/// current syntax; `requirements.yaml` is the Helm 2 layout.
const CHART_FILES: &[&str] = &["Chart.yaml", "requirements.yaml"];

#[derive(Debug, Default, Deserialize)]
struct ChartFile {
    #[serde(default)]
    dependencies: Vec<serde_yaml::Value>,
}

/// Scan a source tree for Helm chart dependency declarations.
pub struct HelmScanner;

impl HelmScanner {
    /// Create a new Helm scanner.
    pub fn new() -> Self {
        Self
    }

    fn scan_file(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let chart: ChartFile = serde_yaml::from_str(&content).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut results = Vec::new();
        for entry in &chart.dependencies {
            let name = entry.get("name").and_then(|v| v.as_str());
            let version = entry.get("version").and_then(|v| v.as_str());
            let repository = entry.get("repository").and_then(|v| v.as_str());
            let (Some(name), Some(version), Some(repository)) = (name, version, repository)
            else {
                warn!(path = %path.display(), "Malformed chart dependency entry");
                continue;
            };
            results.push(Dependency::Helm(HelmDependency {
                name: name.to_string(),
                version: version.to_string(),
                repository: repository.to_string(),
                path: path.to_path_buf(),
            }));
        }
        Ok(results)
    }
}

impl Default for HelmScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for HelmScanner {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Helm
    }

    fn scan(&self, root: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for path in find_files(root, CHART_FILES) {
            match self.scan_file(&path) {
                Ok(deps) => outcome.dependencies.extend(deps),
                Err(error) => outcome.failures.push(ScanFailure { path, error }),
            }
        }
        outcome
    }
}
