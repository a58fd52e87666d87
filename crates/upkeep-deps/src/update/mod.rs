//! Declaration updates and their in-place application

mod frozen;
mod helm;
mod kustomize;
mod pre_commit;

pub use frozen::FrozenUpdate;
pub use helm::HelmUpdate;
pub use kustomize::KustomizeUpdate;
pub use pre_commit::PreCommitUpdate;

use crate::types::DependencyKind;
use crate::Result;
use std::path::Path;

/// A needed dependency update.
///
/// Invariant: for version-carrying kinds, `latest` strictly exceeds
/// `current` under the kind's ordering rule (see [`crate::version`]); the
/// analyzers never construct an update otherwise.
#[derive(Debug, Clone)]
pub enum Update {
    /// Helm chart dependency update
    Helm(HelmUpdate),
    /// Kustomize remote resource update
    Kustomize(KustomizeUpdate),
    /// pre-commit hook pin update
    PreCommit(PreCommitUpdate),
    /// Frozen requirements regeneration
    Frozen(FrozenUpdate),
}

impl Update {
    /// The declaration format this update applies to.
    pub fn kind(&self) -> DependencyKind {
        match self {
            Self::Helm(_) => DependencyKind::Helm,
            Self::Kustomize(_) => DependencyKind::Kustomize,
            Self::PreCommit(_) => DependencyKind::PreCommit,
            Self::Frozen(_) => DependencyKind::Frozen,
        }
    }

    /// Short description, used in commit messages and pull request bodies.
    pub fn description(&self) -> String {
        match self {
            Self::Helm(u) => u.description(),
            Self::Kustomize(u) => u.description(),
            Self::PreCommit(u) => u.description(),
            Self::Frozen(u) => u.description(),
        }
    }

    /// Apply the update by mutating the declaration in place.
    ///
    /// Applying the same update twice produces output byte-identical to
    /// applying it once.
    pub fn apply(&self) -> Result<()> {
        match self {
            Self::Helm(u) => u.apply(),
            Self::Kustomize(u) => u.apply(),
            Self::PreCommit(u) => u.apply(),
            Self::Frozen(u) => u.apply(),
        }
    }
}

/// Write new file contents via a temporary file and rename.
///
/// The temporary file lives in the same directory so the rename stays on
/// one filesystem. Nothing is written when the contents are unchanged,
/// keeping repeated applications byte-identical and mtime-stable.
pub(crate) fn write_if_changed(path: &Path, old: &str, new: &str) -> Result<()> {
    if old == new {
        return Ok(());
    }
    let temp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
    ));
    std::fs::write(&temp_path, new)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
