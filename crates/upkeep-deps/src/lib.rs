//! # upkeep-deps
//!
//! Dependency declaration scanning and updating for upkeep.
//!
//! This crate provides functionality to:
//! - Scan a source tree for dependency declarations (Helm chart manifests,
//!   Kustomize remote resources, pre-commit hook pins, frozen requirements)
//! - Compare declared versions using strict semantic versioning
//! - Apply targeted, format-preserving edits to declaration files
//!
//! ## Architecture
//!
//! Every supported declaration format is one [`DependencyKind`]. Each kind
//! has a scanner producing [`Dependency`] records and an update type that
//! knows how to rewrite its declaration in place. Malformed files never
//! abort a scan; they are reported alongside the successfully parsed
//! dependencies in a [`ScanOutcome`].

#![warn(missing_docs)]

pub mod error;
pub mod scanner;
pub mod types;
pub mod update;
pub mod version;

pub use error::{Error, Result};
pub use scanner::{
    all_scanners, scan_all, FrozenScanner, HelmScanner, KustomizeScanner, PreCommitScanner,
    ScanOutcome, ScanFailure, Scanner,
};
pub use types::{
    Dependency, DependencyKind, FrozenDependency, HelmDependency, KustomizeDependency,
    PreCommitDependency,
};
pub use update::{FrozenUpdate, HelmUpdate, KustomizeUpdate, PreCommitUpdate, Update};
pub use version::{is_newer, ParsedVersion};
