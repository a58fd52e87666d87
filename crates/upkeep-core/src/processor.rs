//! Pipeline driver over the configured repositories

use crate::analysis::{AnalysisMode, AnalyzerSet};
use crate::error::{Error, Result};
use crate::report::RunReport;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{error, info, warn};
use upkeep_config::{Config, GitHubRepository};
use upkeep_deps::{scan_all, Update};
use upkeep_git::{
    CommitMessage, PullRequester, Repository, UPDATE_BRANCH,
};
use upkeep_info::{GitHubInventory, HelmInventory, HttpClient};

/// Client-side request rate against inventory endpoints.
const REQUESTS_PER_SECOND: u32 = 10;

/// Where repository checkouts live for the duration of a run.
enum WorkArea {
    /// Configured directory, reused between runs to avoid recloning.
    Persistent(PathBuf),
    /// Temporary directory removed when the run ends.
    Ephemeral(TempDir),
}

impl WorkArea {
    fn path(&self) -> &Path {
        match self {
            Self::Persistent(path) => path,
            Self::Ephemeral(dir) => dir.path(),
        }
    }
}

/// Drives the scan, analyze, update, publish pipeline over every
/// configured repository.
///
/// Repositories are processed sequentially; a failure in one is recorded
/// in the run report and processing continues with the next. Inventory
/// caches are shared across repositories, so common upstreams are fetched
/// once per run.
pub struct Processor {
    config: Config,
    analyzers: AnalyzerSet,
    requester: Option<PullRequester>,
    work_area: WorkArea,
}

impl Processor {
    /// Build a processor from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let client = HttpClient::with_rate_limit(REQUESTS_PER_SECOND)?;
        let github = Arc::new(GitHubInventory::new(
            client.clone(),
            config.token(),
        ));
        let helm = Arc::new(HelmInventory::new(client));
        let analyzers = AnalyzerSet::new(
            github,
            helm,
            config.regen_command.clone(),
            config.allow_expressions,
        );

        let requester = match config.token() {
            Some(token) => Some(PullRequester::new(&token)?),
            None => None,
        };
        let work_area = match &config.work_area {
            Some(path) => {
                fs::create_dir_all(path)?;
                WorkArea::Persistent(path.clone())
            }
            None => WorkArea::Ephemeral(TempDir::new()?),
        };

        Ok(Self {
            config,
            analyzers,
            requester,
            work_area,
        })
    }

    /// Report staleness for every configured repository, mutating nothing
    /// upstream.
    pub async fn check(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        for github_repo in &self.config.repositories {
            info!(repository = %github_repo, "Checking repository");
            match self.check_repository(github_repo).await {
                Ok(updates) => report.record_pending(github_repo, &updates),
                Err(cause) => {
                    error!(repository = %github_repo, error = %cause, "Check failed");
                    report.record_failure(github_repo, &cause);
                }
            }
        }
        Ok(report)
    }

    /// Run the full pipeline, publishing a pull request for every
    /// repository with pending updates.
    pub async fn process(&self) -> Result<RunReport> {
        let requester =
            self.requester.as_ref().ok_or(Error::MissingToken)?;

        let mut report = RunReport::default();
        for github_repo in &self.config.repositories {
            info!(repository = %github_repo, "Processing repository");
            match self.process_repository(github_repo, requester).await {
                Ok(updates) => report.record_pending(github_repo, &updates),
                Err(cause) => {
                    error!(repository = %github_repo, error = %cause, "Processing failed");
                    report.record_failure(github_repo, &cause);
                }
            }
        }
        Ok(report)
    }

    async fn check_repository(
        &self,
        github_repo: &GitHubRepository,
    ) -> Result<Vec<Update>> {
        let repository = self.acquire(github_repo)?;
        self.analyze_tree(&repository, AnalysisMode::Check).await
    }

    async fn process_repository(
        &self,
        github_repo: &GitHubRepository,
        requester: &PullRequester,
    ) -> Result<Vec<Update>> {
        let token = self.config.token().ok_or(Error::MissingToken)?;
        let repository = self.acquire(github_repo)?;
        repository.switch_update_branch()?;

        let updates =
            self.analyze_tree(&repository, AnalysisMode::Update).await?;
        if updates.is_empty() {
            info!(repository = %github_repo, "Nothing to update");
            repository.restore_branch()?;
            return Ok(updates);
        }

        // A failed edit must never leave a half-mutated tree behind for
        // the commit below to pick up.
        if let Err(cause) = apply_all(&updates) {
            repository.restore()?;
            repository.restore_branch()?;
            return Err(cause);
        }

        let message = CommitMessage::new(&updates);
        repository.commit_all(
            &message.to_string(),
            &self.config.commit_name,
            &self.config.commit_email,
        )?;
        repository.push(
            UPDATE_BRANCH,
            &self.config.github_user,
            &token,
        )?;
        requester
            .publish(
                github_repo,
                UPDATE_BRANCH,
                repository.default_branch(),
                &message,
            )
            .await?;

        repository.restore_branch()?;
        info!(
            repository = %github_repo,
            updates = updates.len(),
            "Published update pull request"
        );
        Ok(updates)
    }

    fn acquire(&self, github_repo: &GitHubRepository) -> Result<Repository> {
        let path = self.repository_path(github_repo);
        Ok(Repository::clone_or_update(&path, &github_repo.url())?)
    }

    async fn analyze_tree(
        &self,
        repository: &Repository,
        mode: AnalysisMode,
    ) -> Result<Vec<Update>> {
        let outcome = scan_all(repository.path());
        for failure in &outcome.failures {
            warn!(
                path = %failure.path.display(),
                error = %failure.error,
                "Skipping unparseable declaration file"
            );
        }
        self.analyzers
            .analyze(repository.path(), &outcome.dependencies, mode)
            .await
    }

    fn repository_path(&self, github_repo: &GitHubRepository) -> PathBuf {
        self.work_area
            .path()
            .join(&github_repo.owner)
            .join(&github_repo.repo)
    }
}

/// Apply every update, stopping at the first failure.
fn apply_all(updates: &[Update]) -> Result<()> {
    for update in updates {
        info!("{}", update.description());
        update.apply()?;
    }
    Ok(())
}
