//! Analysis and processing pipeline for upkeep
//!
//! This crate ties the scanners, inventories, and repository controller
//! together: per-kind [`analysis::Analyzer`]s compare scanned
//! declarations against upstream inventories and emit updates, and the
//! [`Processor`] drives the full pipeline over every configured
//! repository, isolating failures so one broken repository never stops
//! the rest of the run.

#![warn(missing_docs)]

pub mod analysis;
mod error;
mod processor;
mod report;

pub use analysis::{AnalysisMode, Analyzer, AnalyzerSet};
pub use error::{Error, Result};
pub use processor::Processor;
pub use report::{format_dependencies, format_updates, RunReport};
