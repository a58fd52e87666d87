//! upkeep - keep pinned dependencies fresh across repositories

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use upkeep_config::Config;
use upkeep_core::{
    format_dependencies, format_updates, AnalysisMode, AnalyzerSet, Processor,
    RunReport,
};
use upkeep_deps::{scan_all, Update};
use upkeep_info::{GitHubInventory, HelmInventory, HttpClient};

#[derive(Parser, Debug)]
#[command(name = "upkeep")]
#[command(about = "Keep pinned dependencies fresh across repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dependency declarations found in a source tree
    Scan {
        /// Root of the source tree
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Print pending updates for a source tree without changing it
    Analyze {
        /// Root of the source tree
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Leave unparseable Helm chart pins (version match expressions)
        /// alone
        #[arg(long)]
        allow_expressions: bool,
    },

    /// Apply pending updates to a source tree
    Update {
        /// Root of the source tree
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Leave unparseable Helm chart pins (version match expressions)
        /// alone
        #[arg(long)]
        allow_expressions: bool,
    },

    /// Print the latest version of every chart in a Helm chart repository
    Inventory {
        /// Chart repository URL
        repository: String,
    },

    /// Report staleness for every configured repository
    ///
    /// Exits non-zero when any repository has a pending update.
    Check {
        /// Configuration file
        #[arg(long)]
        config: PathBuf,
    },

    /// Update every configured repository and open pull requests
    ///
    /// Exits non-zero when processing any repository failed.
    Process {
        /// Configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { path } => run_scan(&path),
        Command::Analyze {
            path,
            allow_expressions,
        } => run_analyze(&path, allow_expressions).await,
        Command::Update {
            path,
            allow_expressions,
        } => run_update(&path, allow_expressions).await,
        Command::Inventory { repository } => run_inventory(&repository).await,
        Command::Check { config } => run_check(&config).await,
        Command::Process { config } => run_process(&config).await,
    }
}

fn run_scan(path: &Path) -> Result<ExitCode> {
    let outcome = scan_all(path);
    warn_failures(&outcome);
    print!("{}", format_dependencies(&outcome.dependencies)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_analyze(path: &Path, allow_expressions: bool) -> Result<ExitCode> {
    let updates =
        analyze_tree(path, AnalysisMode::Check, allow_expressions).await?;
    print!("{}", format_updates(&updates)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_update(path: &Path, allow_expressions: bool) -> Result<ExitCode> {
    let updates =
        analyze_tree(path, AnalysisMode::Update, allow_expressions).await?;
    for update in &updates {
        tracing::info!("{}", update.description());
        update.apply()?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_inventory(repository: &str) -> Result<ExitCode> {
    let inventory = HelmInventory::new(HttpClient::new()?);
    let charts: BTreeMap<String, String> =
        inventory.inventory(repository).await?.into_iter().collect();
    print!("{}", serde_yaml::to_string(&charts)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_check(config: &Path) -> Result<ExitCode> {
    let config = Config::from_file(config)?;
    let processor = Processor::new(config)?;
    let report = processor.check().await?;
    print_report(&report)?;
    if report.has_pending() || report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn run_process(config: &Path) -> Result<ExitCode> {
    let config = Config::from_file(config)?;
    let processor = Processor::new(config)?;
    let report = processor.process().await?;
    print_report(&report)?;
    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Run scanners and analyzers over a local tree, outside any configured
/// work area.
async fn analyze_tree(
    path: &Path,
    mode: AnalysisMode,
    allow_expressions: bool,
) -> Result<Vec<Update>> {
    let mut config = Config::default();
    config.apply_env();

    let client = HttpClient::new()?;
    let github =
        Arc::new(GitHubInventory::new(client.clone(), config.token()));
    let helm = Arc::new(HelmInventory::new(client));
    let analyzers =
        AnalyzerSet::new(github, helm, config.regen_command, allow_expressions);

    let outcome = scan_all(path);
    warn_failures(&outcome);
    Ok(analyzers.analyze(path, &outcome.dependencies, mode).await?)
}

fn warn_failures(outcome: &upkeep_deps::ScanOutcome) {
    for failure in &outcome.failures {
        warn!(
            path = %failure.path.display(),
            error = %failure.error,
            "Skipping unparseable declaration file"
        );
    }
}

fn print_report(report: &RunReport) -> Result<()> {
    print!("{}", report.to_yaml()?);
    Ok(())
}
