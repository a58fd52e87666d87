//! Per-kind dependency analyzers
//!
//! An analyzer takes the declarations one scan discovered, inventories
//! their upstreams, and emits an [`Update`] for every declaration whose
//! upstream has a strictly newer version. Analyzers never mutate
//! declarations; the sole exception is the frozen analyzer, which must
//! run the regeneration command to learn anything at all and restores
//! the tree afterwards on a check-only pass.

mod frozen;
mod helm;
mod kustomize;
mod pre_commit;

pub use frozen::FrozenAnalyzer;
pub use helm::HelmAnalyzer;
pub use kustomize::KustomizeAnalyzer;
pub use pre_commit::PreCommitAnalyzer;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use upkeep_deps::{Dependency, DependencyKind, Update};
use upkeep_info::{GitHubInventory, HelmInventory};

/// Whether an analysis pass may leave changes in the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Report staleness only; the tree is left exactly as found.
    Check,
    /// Analysis feeds an update pass; regenerated files may stay in
    /// place to avoid running external tools twice.
    Update,
}

/// Compares declarations of one kind against their upstream inventory.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// The kind of declaration this analyzer handles.
    fn kind(&self) -> DependencyKind;

    /// Emit an update for every declaration with a newer upstream.
    ///
    /// `dependencies` is the full scan result; declarations of other
    /// kinds are ignored. `root` is the tree the scan ran over.
    async fn analyze(
        &self,
        root: &Path,
        dependencies: &[Dependency],
        mode: AnalysisMode,
    ) -> Result<Vec<Update>>;
}

/// The full set of analyzers, one per dependency kind.
pub struct AnalyzerSet {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerSet {
    /// Build the analyzer set over shared inventories.
    ///
    /// The inventories carry the per-run caches, so one set should be
    /// reused across every repository of a run.
    pub fn new(
        github: Arc<GitHubInventory>,
        helm: Arc<HelmInventory>,
        regen_command: Vec<String>,
        allow_expressions: bool,
    ) -> Self {
        Self {
            analyzers: vec![
                Box::new(FrozenAnalyzer::new(regen_command)),
                Box::new(
                    HelmAnalyzer::new(helm)
                        .allow_expressions(allow_expressions),
                ),
                Box::new(KustomizeAnalyzer::new(Arc::clone(&github))),
                Box::new(PreCommitAnalyzer::new(github)),
            ],
        }
    }

    /// Run every analyzer over one scan result, in kind order.
    pub async fn analyze(
        &self,
        root: &Path,
        dependencies: &[Dependency],
        mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        self.analyze_kinds(root, dependencies, &DependencyKind::all(), mode)
            .await
    }

    /// Run the analyzers for a chosen subset of kinds, in kind order.
    ///
    /// Analyzers for other kinds never run, so none of their inventory
    /// lookups happen either.
    pub async fn analyze_kinds(
        &self,
        root: &Path,
        dependencies: &[Dependency],
        kinds: &[DependencyKind],
        mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let mut updates = Vec::new();
        for analyzer in &self.analyzers {
            if !kinds.contains(&analyzer.kind()) {
                continue;
            }
            updates.extend(analyzer.analyze(root, dependencies, mode).await?);
        }
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use upkeep_deps::{HelmDependency, PreCommitDependency};
    use upkeep_info::HttpClient;

    #[tokio::test]
    async fn test_analyze_kinds_restricts_evaluation() {
        let mut server = mockito::Server::new_async().await;
        let index = server
            .mock("GET", "/charts/index.yaml")
            .expect(0)
            .create_async()
            .await;
        let tags = server
            .mock("GET", "/repos/psf/black/tags")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"[{"name": "24.1.0"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let github = Arc::new(GitHubInventory::with_api_url(
            client.clone(),
            None,
            server.url(),
        ));
        let helm = Arc::new(HelmInventory::new(client));
        let set =
            AnalyzerSet::new(github, helm, vec!["true".to_string()], false);

        let dependencies = vec![
            Dependency::Helm(HelmDependency {
                name: "gafaelfawr".to_string(),
                version: "1.0.0".to_string(),
                repository: format!("{}/charts", server.url()),
                path: PathBuf::from("Chart.yaml"),
            }),
            Dependency::PreCommit(PreCommitDependency {
                repository: "https://github.com/psf/black".to_string(),
                owner: "psf".to_string(),
                repo: "black".to_string(),
                version: "23.12.1".to_string(),
                path: PathBuf::from(".pre-commit-config.yaml"),
            }),
        ];
        let updates = set
            .analyze_kinds(
                Path::new("."),
                &dependencies,
                &[DependencyKind::PreCommit],
                AnalysisMode::Check,
            )
            .await
            .unwrap();

        // Only the requested kind is evaluated; the chart repository is
        // never contacted.
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind(), DependencyKind::PreCommit);
        index.assert_async().await;
        tags.assert_async().await;
    }
}
