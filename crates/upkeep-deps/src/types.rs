//! Core types for dependency declarations

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The supported dependency declaration formats.
///
/// Every scanner, analyzer, and updater is keyed by one of these kinds, so
/// dispatch stays exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// Helm chart dependencies (`Chart.yaml` / `requirements.yaml`)
    Helm,
    /// Kustomize remote resources (`kustomization.yaml`)
    Kustomize,
    /// pre-commit hook pins (`.pre-commit-config.yaml`)
    PreCommit,
    /// Frozen requirements regenerated by an external tool
    Frozen,
}

impl DependencyKind {
    /// Stable name used in reports and commit messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Helm => "helm",
            Self::Kustomize => "kustomize",
            Self::PreCommit => "pre-commit",
            Self::Frozen => "frozen",
        }
    }

    /// All kinds, in the order they are scanned and reported.
    pub fn all() -> [DependencyKind; 4] {
        [Self::Frozen, Self::Helm, Self::Kustomize, Self::PreCommit]
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Helm chart dependency declared in a chart manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelmDependency {
    /// Chart name
    pub name: String,
    /// Declared version, as written in the file
    pub version: String,
    /// URL of the chart repository providing the chart
    pub repository: String,
    /// File containing the declaration
    pub path: PathBuf,
}

/// A Kustomize remote resource pinned to a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KustomizeDependency {
    /// The full resource URL, as written in the file
    pub url: String,
    /// Owner of the referenced GitHub repository
    pub owner: String,
    /// Name of the referenced GitHub repository
    pub repo: String,
    /// The pinned ref from the `?ref=` query parameter
    pub version: String,
    /// File containing the declaration
    pub path: PathBuf,
}

/// A pre-commit hook repository pinned to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreCommitDependency {
    /// URL of the repository providing the hook
    pub repository: String,
    /// Owner of the GitHub repository
    pub owner: String,
    /// Name of the GitHub repository
    pub repo: String,
    /// The pinned revision, as written in the file
    pub version: String,
    /// File containing the declaration
    pub path: PathBuf,
}

/// A frozen requirements group regenerated by an external tool.
///
/// This represents the whole lockfile set as one dependency; freshness is
/// determined by regenerating and diffing, never by per-package comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrozenDependency {
    /// Directory containing the frozen requirements
    pub path: PathBuf,
}

/// One dependency occurrence discovered by a scan.
///
/// A `Dependency` identifies a single declaration in a single file; the
/// same upstream package may appear as several instances across files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Dependency {
    /// Helm chart dependency
    Helm(HelmDependency),
    /// Kustomize remote resource
    Kustomize(KustomizeDependency),
    /// pre-commit hook pin
    PreCommit(PreCommitDependency),
    /// Frozen requirements group
    Frozen(FrozenDependency),
}

impl Dependency {
    /// The declaration format this dependency was found in.
    pub fn kind(&self) -> DependencyKind {
        match self {
            Self::Helm(_) => DependencyKind::Helm,
            Self::Kustomize(_) => DependencyKind::Kustomize,
            Self::PreCommit(_) => DependencyKind::PreCommit,
            Self::Frozen(_) => DependencyKind::Frozen,
        }
    }

    /// The file containing the declaration.
    pub fn path(&self) -> &Path {
        match self {
            Self::Helm(d) => &d.path,
            Self::Kustomize(d) => &d.path,
            Self::PreCommit(d) => &d.path,
            Self::Frozen(d) => &d.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DependencyKind::Helm.as_str(), "helm");
        assert_eq!(DependencyKind::PreCommit.to_string(), "pre-commit");
    }

    #[test]
    fn test_dependency_kind_dispatch() {
        let dep = Dependency::Helm(HelmDependency {
            name: "gafaelfawr".to_string(),
            version: "1.3.1".to_string(),
            repository: "https://example.org/charts".to_string(),
            path: PathBuf::from("/tree/Chart.yaml"),
        });
        assert_eq!(dep.kind(), DependencyKind::Helm);
        assert_eq!(dep.path(), Path::new("/tree/Chart.yaml"));
    }
}
