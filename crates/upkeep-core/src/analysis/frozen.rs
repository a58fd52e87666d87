//! Frozen requirements analysis
//!
//! Frozen lockfiles have no comparable versions; the only way to learn
//! whether they are stale is to run the regeneration command and see if
//! the working tree changed. That makes this the one analyzer with side
//! effects, and it refuses to run on a tree that is already dirty since
//! it could not then attribute changes to the regeneration.

use super::{AnalysisMode, Analyzer};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};
use upkeep_deps::{
    Dependency, DependencyKind, FrozenDependency, FrozenUpdate, Update,
};
use upkeep_git::Repository;

/// Determine frozen requirements freshness by regenerating and diffing.
pub struct FrozenAnalyzer {
    command: Vec<String>,
}

impl FrozenAnalyzer {
    /// Create an analyzer invoking `command` to regenerate lockfiles.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Analyzer for FrozenAnalyzer {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Frozen
    }

    async fn analyze(
        &self,
        root: &Path,
        dependencies: &[Dependency],
        mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let frozen: Vec<&FrozenDependency> = dependencies
            .iter()
            .filter_map(|dependency| match dependency {
                Dependency::Frozen(group) => Some(group),
                _ => None,
            })
            .collect();
        if frozen.is_empty() {
            return Ok(Vec::new());
        }

        let repository = Repository::open(root)?;
        if repository.is_dirty()? {
            return Err(Error::DirtyTree(root.to_path_buf()));
        }

        for group in &frozen {
            let regeneration = FrozenUpdate {
                path: group.path.clone(),
                command: self.command.clone(),
                applied: false,
            };
            regeneration.apply()?;
        }

        if !repository.is_dirty()? {
            debug!(root = %root.display(), "Frozen requirements are current");
            return Ok(Vec::new());
        }
        info!(root = %root.display(), "Frozen requirements are stale");

        // On a check-only pass the regenerated files are discarded; an
        // update pass keeps them so the command never runs twice.
        let applied = match mode {
            AnalysisMode::Check => {
                repository.restore()?;
                false
            }
            AnalysisMode::Update => true,
        };
        Ok(frozen
            .into_iter()
            .map(|group| {
                Update::Frozen(FrozenUpdate {
                    path: group.path.clone(),
                    command: self.command.clone(),
                    applied,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use std::path::PathBuf;

    fn str_vec(command: &[&str]) -> Vec<String> {
        command.iter().map(|s| s.to_string()).collect()
    }

    /// A committed tree with a constraints file the fake regeneration
    /// command rewrites.
    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        fs::create_dir(root.join("requirements")).unwrap();
        fs::write(root.join("requirements/main.txt"), "alpha==1.0\n").unwrap();
        fs::write(root.join("Makefile"), "update-deps:\n").unwrap();

        let repo = git2::Repository::init(&root).unwrap();
        {
            let mut index = repo.index().unwrap();
            index
                .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
                .unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = Signature::now("Someone", "someone@example.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
                .unwrap();
        }
        drop(repo);

        (tmp, root)
    }

    fn dependencies(root: &std::path::Path) -> Vec<Dependency> {
        vec![Dependency::Frozen(FrozenDependency {
            path: root.join("requirements"),
        })]
    }

    #[tokio::test]
    async fn test_check_restores_tree() {
        let (_tmp, root) = fixture();
        let analyzer = FrozenAnalyzer::new(str_vec(&[
            "sh",
            "-c",
            "echo 'alpha==2.0' > requirements/main.txt",
        ]));
        let updates = analyzer
            .analyze(&root, &dependencies(&root), AnalysisMode::Check)
            .await
            .unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].description(), "Update frozen dependencies");
        let content =
            fs::read_to_string(root.join("requirements/main.txt")).unwrap();
        assert_eq!(content, "alpha==1.0\n");
    }

    #[tokio::test]
    async fn test_update_keeps_regenerated_files() {
        let (_tmp, root) = fixture();
        let analyzer = FrozenAnalyzer::new(str_vec(&[
            "sh",
            "-c",
            "echo 'alpha==2.0' > requirements/main.txt",
        ]));
        let updates = analyzer
            .analyze(&root, &dependencies(&root), AnalysisMode::Update)
            .await
            .unwrap();

        assert_eq!(updates.len(), 1);
        // Applying is a no-op since analysis already regenerated.
        updates[0].apply().unwrap();
        let content =
            fs::read_to_string(root.join("requirements/main.txt")).unwrap();
        assert_eq!(content, "alpha==2.0\n");
    }

    #[tokio::test]
    async fn test_current_requirements_yield_nothing() {
        let (_tmp, root) = fixture();
        let analyzer = FrozenAnalyzer::new(str_vec(&["true"]));
        let updates = analyzer
            .analyze(&root, &dependencies(&root), AnalysisMode::Check)
            .await
            .unwrap();
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_dirty_tree_is_refused() {
        let (_tmp, root) = fixture();
        fs::write(root.join("requirements/main.txt"), "edited\n").unwrap();
        let analyzer = FrozenAnalyzer::new(str_vec(&["true"]));
        let error = analyzer
            .analyze(&root, &dependencies(&root), AnalysisMode::Check)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::DirtyTree(_)));
    }
}
