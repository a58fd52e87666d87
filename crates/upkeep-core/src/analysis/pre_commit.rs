//! pre-commit hook pin analysis

use super::kustomize::latest_tags;
use super::{AnalysisMode, Analyzer};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use upkeep_deps::{
    is_newer, Dependency, DependencyKind, PreCommitDependency, PreCommitUpdate,
    Update,
};
use upkeep_info::GitHubInventory;

/// Compare pre-commit hook pins against GitHub tag inventories.
pub struct PreCommitAnalyzer {
    inventory: Arc<GitHubInventory>,
}

impl PreCommitAnalyzer {
    /// Create an analyzer over a shared GitHub tag inventory.
    pub fn new(inventory: Arc<GitHubInventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Analyzer for PreCommitAnalyzer {
    fn kind(&self) -> DependencyKind {
        DependencyKind::PreCommit
    }

    async fn analyze(
        &self,
        _root: &Path,
        dependencies: &[Dependency],
        _mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let hooks: Vec<&PreCommitDependency> = dependencies
            .iter()
            .filter_map(|dependency| match dependency {
                Dependency::PreCommit(hook) => Some(hook),
                _ => None,
            })
            .collect();
        if hooks.is_empty() {
            return Ok(Vec::new());
        }

        let latest = latest_tags(
            &self.inventory,
            hooks.iter().map(|h| (h.owner.as_str(), h.repo.as_str())),
        )
        .await?;

        let mut updates = Vec::new();
        for hook in hooks {
            let key = format!("{}/{}", hook.owner, hook.repo);
            let Some(Some(tag)) = latest.get(&key) else {
                continue;
            };
            if is_newer(&hook.version, tag)? {
                updates.push(Update::PreCommit(PreCommitUpdate {
                    path: hook.path.clone(),
                    repository: hook.repository.clone(),
                    current: hook.version.clone(),
                    latest: tag.clone(),
                }));
            }
        }
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use upkeep_info::HttpClient;

    fn hook(owner: &str, repo: &str, version: &str) -> Dependency {
        Dependency::PreCommit(PreCommitDependency {
            repository: format!("https://github.com/{owner}/{repo}"),
            owner: owner.to_string(),
            repo: repo.to_string(),
            version: version.to_string(),
            path: PathBuf::from(".pre-commit-config.yaml"),
        })
    }

    #[tokio::test]
    async fn test_analyze() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/psf/black/tags")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"[{"name": "24.1.0"}, {"name": "23.12.1"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/pre-commit/pre-commit-hooks/tags")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"[{"name": "v4.5.0"}]"#)
            .create_async()
            .await;

        let inventory = Arc::new(GitHubInventory::with_api_url(
            HttpClient::new().unwrap(),
            None,
            server.url(),
        ));
        let analyzer = PreCommitAnalyzer::new(inventory);
        let dependencies = vec![
            hook("psf", "black", "23.12.1"),
            hook("pre-commit", "pre-commit-hooks", "v4.5.0"),
        ];
        let updates = analyzer
            .analyze(Path::new("."), &dependencies, AnalysisMode::Check)
            .await
            .unwrap();

        // The up-to-date hook produces nothing; the winning tag keeps its
        // upstream spelling.
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0].description(),
            "Update psf/black pre-commit hook from 23.12.1 to 24.1.0"
        );
    }
}
