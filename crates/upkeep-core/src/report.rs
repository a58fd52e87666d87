//! Run reports and YAML formatting for pipeline results

use serde::Serialize;
use std::collections::BTreeMap;
use upkeep_config::GitHubRepository;
use upkeep_deps::{Dependency, DependencyKind, Update};

/// Outcome of one pipeline run over the configured repositories.
///
/// Failures are recorded per repository rather than aborting the run, so
/// one broken repository never hides results for the others.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Repositories with pending updates, with one line per update
    pub pending: BTreeMap<String, Vec<String>>,
    /// Repositories whose processing failed, with the failure message
    pub failures: BTreeMap<String, String>,
}

impl RunReport {
    /// Record the pending updates of one repository, if any.
    pub fn record_pending(
        &mut self,
        repository: &GitHubRepository,
        updates: &[Update],
    ) {
        if updates.is_empty() {
            return;
        }
        self.pending.insert(
            repository.to_string(),
            updates.iter().map(Update::description).collect(),
        );
    }

    /// Record a repository whose processing failed.
    pub fn record_failure(
        &mut self,
        repository: &GitHubRepository,
        error: &crate::Error,
    ) {
        self.failures.insert(repository.to_string(), error.to_string());
    }

    /// Whether any repository has a pending update.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether any repository failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Render the report as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Render updates as a YAML mapping of kind to update descriptions.
///
/// Kinds appear in scan order and kinds without updates are omitted.
pub fn format_updates(updates: &[Update]) -> Result<String, serde_yaml::Error> {
    let mut mapping = serde_yaml::Mapping::new();
    for kind in DependencyKind::all() {
        let descriptions: Vec<serde_yaml::Value> = updates
            .iter()
            .filter(|update| update.kind() == kind)
            .map(|update| serde_yaml::Value::String(update.description()))
            .collect();
        if !descriptions.is_empty() {
            mapping.insert(
                serde_yaml::Value::String(kind.as_str().to_string()),
                serde_yaml::Value::Sequence(descriptions),
            );
        }
    }
    serde_yaml::to_string(&mapping)
}

/// Render scanned dependencies as a YAML mapping of kind to declarations.
pub fn format_dependencies(
    dependencies: &[Dependency],
) -> Result<String, serde_yaml::Error> {
    let mut mapping = serde_yaml::Mapping::new();
    for kind in DependencyKind::all() {
        let of_kind: Vec<&Dependency> = dependencies
            .iter()
            .filter(|dependency| dependency.kind() == kind)
            .collect();
        if !of_kind.is_empty() {
            mapping.insert(
                serde_yaml::Value::String(kind.as_str().to_string()),
                serde_yaml::to_value(&of_kind)?,
            );
        }
    }
    serde_yaml::to_string(&mapping)
}
