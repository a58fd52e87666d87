//! Configuration for upkeep
//!
//! The configuration is loaded once from a YAML file, adjusted from the
//! environment, and then threaded through the processor as an immutable
//! value. Nothing here is global state.

#![warn(missing_docs)]

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the GitHub token.
const TOKEN_ENV: &str = "UPKEEP_GITHUB_TOKEN";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read configuration file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {0}: {1}")]
    Parse(PathBuf, #[source] serde_yaml::Error),
}

/// One target GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubRepository {
    /// The owner of the repository
    pub owner: String,
    /// The name of the repository
    pub repo: String,
}

impl GitHubRepository {
    /// The repository's clone URL.
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for GitHubRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// upkeep configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GitHub token used for API calls and pushes.
    ///
    /// Usually supplied through the `UPKEEP_GITHUB_TOKEN` environment
    /// variable rather than the file.
    #[serde(default)]
    pub github_token: String,

    /// GitHub username the token belongs to.
    #[serde(default = "default_github_user")]
    pub github_user: String,

    /// Author name for generated commits.
    ///
    /// Commit identity is configured separately from the API credentials
    /// so that token types without a queryable user profile still produce
    /// attributable commits.
    #[serde(default = "default_commit_name")]
    pub commit_name: String,

    /// Author email for generated commits.
    #[serde(default = "default_commit_email")]
    pub commit_email: String,

    /// Repositories to process.
    #[serde(default)]
    pub repositories: Vec<GitHubRepository>,

    /// Writable working area for checkouts.
    ///
    /// When set, checkouts persist there and are reused (fetched and
    /// reset) across runs. When unset, each run clones into a temporary
    /// directory that is destroyed afterwards.
    #[serde(default)]
    pub work_area: Option<PathBuf>,

    /// Command regenerating frozen requirements, argv style.
    #[serde(default = "default_regen_command")]
    pub regen_command: Vec<String>,

    /// Treat unparseable Helm chart pins as deliberate version match
    /// expressions and leave them alone.
    #[serde(default)]
    pub allow_expressions: bool,
}

fn default_github_user() -> String {
    "upkeep".to_string()
}

fn default_commit_name() -> String {
    "upkeep".to_string()
}

fn default_commit_email() -> String {
    "upkeep@example.org".to_string()
}

fn default_regen_command() -> Vec<String> {
    vec!["make".to_string(), "update-deps".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            github_user: default_github_user(),
            commit_name: default_commit_name(),
            commit_email: default_commit_email(),
            repositories: Vec::new(),
            work_area: None,
            regen_command: default_regen_command(),
            allow_expressions: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.github_token = token;
            }
        }
    }

    /// The token, if one was configured.
    pub fn token(&self) -> Option<String> {
        if self.github_token.is_empty() {
            None
        } else {
            Some(self.github_token.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("upkeep.yaml");
        std::fs::write(
            &path,
            r#"github_user: sqrbot
commit_name: SQuaRE Bot
commit_email: sqrbot@example.org
work_area: /var/lib/upkeep
repositories:
  - owner: lsst-sqre
    repo: gafaelfawr
  - owner: lsst-sqre
    repo: mobu
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.github_user, "sqrbot");
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[0].to_string(), "lsst-sqre/gafaelfawr");
        assert_eq!(
            config.repositories[1].url(),
            "https://github.com/lsst-sqre/mobu"
        );
        assert_eq!(config.work_area, Some(PathBuf::from("/var/lib/upkeep")));
        assert_eq!(config.regen_command, vec!["make", "update-deps"]);
        assert!(!config.allow_expressions);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("upkeep.yaml");
        std::fs::write(&path, "githubtoken: oops\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn test_token_empty_means_none() {
        let config = Config::default();
        assert_eq!(config.token(), None);
    }
}
