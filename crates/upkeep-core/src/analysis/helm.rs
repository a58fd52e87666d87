//! Helm chart dependency analysis

use super::{AnalysisMode, Analyzer};
use crate::error::Result;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use upkeep_deps::{
    is_newer, Dependency, DependencyKind, HelmDependency, HelmUpdate,
    ParsedVersion, Update,
};
use upkeep_info::HelmInventory;

/// Compare Helm chart pins against their chart repository indexes.
pub struct HelmAnalyzer {
    inventory: Arc<HelmInventory>,
    allow_expressions: bool,
}

impl HelmAnalyzer {
    /// Create an analyzer over a shared chart repository inventory.
    pub fn new(inventory: Arc<HelmInventory>) -> Self {
        Self {
            inventory,
            allow_expressions: false,
        }
    }

    /// Treat an unparseable current pin as a deliberate version match
    /// expression (`>=1.4.0`) and propose nothing for it, instead of
    /// considering it stale.
    pub fn allow_expressions(mut self, allow: bool) -> Self {
        self.allow_expressions = allow;
        self
    }
}

#[async_trait]
impl Analyzer for HelmAnalyzer {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Helm
    }

    async fn analyze(
        &self,
        _root: &Path,
        dependencies: &[Dependency],
        _mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let charts: Vec<&HelmDependency> = dependencies
            .iter()
            .filter_map(|dependency| match dependency {
                Dependency::Helm(chart) => Some(chart),
                _ => None,
            })
            .collect();
        if charts.is_empty() {
            return Ok(Vec::new());
        }

        // Each chart repository index is fetched once, no matter how many
        // charts it provides.
        let repositories: BTreeSet<&str> =
            charts.iter().map(|c| c.repository.as_str()).collect();
        let fetches = repositories.iter().map(|url| {
            let inventory = Arc::clone(&self.inventory);
            async move {
                let available = inventory.inventory(url).await?;
                Ok::<_, crate::Error>((url.to_string(), available))
            }
        });
        let inventories: HashMap<String, HashMap<String, String>> =
            try_join_all(fetches).await?.into_iter().collect();

        let mut updates = Vec::new();
        for chart in charts {
            if self.allow_expressions && !ParsedVersion::is_valid(&chart.version) {
                debug!(
                    chart = %chart.name,
                    version = %chart.version,
                    "Skipping version match expression"
                );
                continue;
            }
            let Some(available) = inventories.get(&chart.repository) else {
                continue;
            };
            let Some(latest) = available.get(&chart.name) else {
                debug!(
                    chart = %chart.name,
                    repository = %chart.repository,
                    "Chart not present in its repository index"
                );
                continue;
            };
            if is_newer(&chart.version, latest)? {
                updates.push(Update::Helm(HelmUpdate {
                    path: chart.path.clone(),
                    name: chart.name.clone(),
                    current: chart.version.clone(),
                    latest: latest.clone(),
                }));
            }
        }
        Ok(updates)
    }
}
