//! Frozen requirements detection

use super::{ScanOutcome, Scanner};
use crate::types::{Dependency, DependencyKind, FrozenDependency};
use std::path::Path;

/// Detect a frozen requirements group in a source tree.
///
/// Unlike the other scanners this does not enumerate individual packages:
/// the entire regenerate-from-inputs lockfile set is one dependency, and
/// its freshness is determined by running the regeneration tool, not by
/// diffing pinned versions. A tree qualifies when it carries both the
/// regeneration entrypoint (`Makefile`) and the loose input constraints
/// (`requirements/main.in`).
pub struct FrozenScanner;

impl FrozenScanner {
    /// Create a new frozen requirements scanner.
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrozenScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for FrozenScanner {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Frozen
    }

    fn scan(&self, root: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let has_entrypoint = root.join("Makefile").is_file();
        let has_inputs = root.join("requirements/main.in").is_file();
        if has_entrypoint && has_inputs {
            outcome.dependencies.push(Dependency::Frozen(FrozenDependency {
                path: root.join("requirements"),
            }));
        }
        outcome
    }
}
