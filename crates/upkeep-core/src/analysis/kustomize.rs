//! Kustomize remote resource analysis

use super::{AnalysisMode, Analyzer};
use crate::error::Result;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use upkeep_deps::{
    is_newer, Dependency, DependencyKind, KustomizeDependency, KustomizeUpdate,
    Update,
};
use upkeep_info::GitHubInventory;

/// Compare Kustomize resource refs against GitHub tag inventories.
pub struct KustomizeAnalyzer {
    inventory: Arc<GitHubInventory>,
}

impl KustomizeAnalyzer {
    /// Create an analyzer over a shared GitHub tag inventory.
    pub fn new(inventory: Arc<GitHubInventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Analyzer for KustomizeAnalyzer {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Kustomize
    }

    async fn analyze(
        &self,
        _root: &Path,
        dependencies: &[Dependency],
        _mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let resources: Vec<&KustomizeDependency> = dependencies
            .iter()
            .filter_map(|dependency| match dependency {
                Dependency::Kustomize(resource) => Some(resource),
                _ => None,
            })
            .collect();
        if resources.is_empty() {
            return Ok(Vec::new());
        }

        let latest =
            latest_tags(&self.inventory, resources.iter().map(|r| (r.owner.as_str(), r.repo.as_str())))
                .await?;

        let mut updates = Vec::new();
        for resource in resources {
            let key = format!("{}/{}", resource.owner, resource.repo);
            // Repositories without any semver tag are unorderable and
            // never proposed.
            let Some(Some(tag)) = latest.get(&key) else {
                continue;
            };
            if is_newer(&resource.version, tag)? {
                updates.push(Update::Kustomize(KustomizeUpdate {
                    path: resource.path.clone(),
                    url: resource.url.clone(),
                    owner: resource.owner.clone(),
                    repo: resource.repo.clone(),
                    current: resource.version.clone(),
                    latest: tag.clone(),
                }));
            }
        }
        Ok(updates)
    }
}

/// Look up the latest tag of every distinct repository, concurrently.
pub(super) async fn latest_tags<'a>(
    inventory: &Arc<GitHubInventory>,
    repositories: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<HashMap<String, Option<String>>> {
    let distinct: BTreeSet<(&str, &str)> = repositories.collect();
    let fetches = distinct.into_iter().map(|(owner, repo)| {
        let inventory = Arc::clone(inventory);
        async move {
            let tag = inventory.latest_tag(owner, repo).await?;
            Ok::<_, crate::Error>((format!("{owner}/{repo}"), tag))
        }
    });
    Ok(try_join_all(fetches).await?.into_iter().collect())
}
