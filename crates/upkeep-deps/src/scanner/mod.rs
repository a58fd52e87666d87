//! Read-only tree walkers producing dependency records

mod frozen;
mod helm;
mod kustomize;
mod pre_commit;

pub use frozen::FrozenScanner;
pub use helm::HelmScanner;
pub use kustomize::KustomizeScanner;
pub use pre_commit::PreCommitScanner;

use crate::types::{Dependency, DependencyKind};
use crate::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A parse failure scoped to one file.
///
/// A malformed declaration file never aborts a scan; the failure is
/// recorded here and the rest of the tree is still scanned.
#[derive(Debug)]
pub struct ScanFailure {
    /// The file that failed to parse
    pub path: PathBuf,
    /// The parse error
    pub error: Error,
}

/// Result of scanning one tree for one dependency kind.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// All successfully parsed dependencies
    pub dependencies: Vec<Dependency>,
    /// Files that could not be parsed
    pub failures: Vec<ScanFailure>,
}

impl ScanOutcome {
    /// Fold another outcome into this one.
    pub fn extend(&mut self, other: ScanOutcome) {
        self.dependencies.extend(other.dependencies);
        self.failures.extend(other.failures);
    }
}

/// All scanners, in the kind order of [`DependencyKind::all`].
pub fn all_scanners() -> Vec<Box<dyn Scanner>> {
    vec![
        Box::new(FrozenScanner::new()),
        Box::new(HelmScanner::new()),
        Box::new(KustomizeScanner::new()),
        Box::new(PreCommitScanner::new()),
    ]
}

/// Scan a source tree with every scanner, folding the outcomes together.
pub fn scan_all(root: &Path) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    for scanner in all_scanners() {
        outcome.extend(scanner.scan(root));
    }
    outcome
}

/// A read-only scanner for one dependency declaration format.
pub trait Scanner: Send + Sync {
    /// The kind of declaration this scanner recognizes.
    fn kind(&self) -> DependencyKind;

    /// Scan a source tree for dependency declarations.
    fn scan(&self, root: &Path) -> ScanOutcome;
}

/// Find files with one of the wanted names under a root.
///
/// Anything under the root's `tests/` directory is ignored, since test
/// fixtures routinely contain deliberately stale declarations.
pub(crate) fn find_files(root: &Path, wanted: &[&str]) -> Vec<PathBuf> {
    let tests = root.join("tests");

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != tests)
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| wanted.contains(&name))
        })
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_files_skips_tests_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("services/gafaelfawr")).unwrap();
        std::fs::create_dir_all(root.join("tests/fixtures")).unwrap();
        std::fs::write(root.join("services/gafaelfawr/Chart.yaml"), "").unwrap();
        std::fs::write(root.join("tests/fixtures/Chart.yaml"), "").unwrap();

        let found = find_files(root, &["Chart.yaml"]);
        assert_eq!(found, vec![root.join("services/gafaelfawr/Chart.yaml")]);
    }
}
