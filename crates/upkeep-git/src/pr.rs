//! Pull request creation and maintenance via the GitHub API

use crate::error::PublishError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use upkeep_config::GitHubRepository;
use upkeep_deps::{DependencyKind, Update};

const GITHUB_API_URL: &str = "https://api.github.com";

/// A commit (and pull request) message describing a set of updates.
///
/// The title is fixed and the body lists one line per update, grouped by
/// dependency kind in a stable order, so regenerating the message for the
/// same set of updates always yields identical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    /// Subject line
    pub title: String,
    /// Bulleted list of the changes the commit makes
    pub body: String,
}

impl CommitMessage {
    /// Build the message for a set of updates.
    pub fn new(updates: &[Update]) -> Self {
        let mut lines = Vec::new();
        for kind in DependencyKind::all() {
            for update in updates.iter().filter(|u| u.kind() == kind) {
                lines.push(format!("- {}", update.description()));
            }
        }
        Self {
            title: "Update dependencies".to_string(),
            body: lines.join("\n"),
        }
    }
}

impl std::fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n\n{}", self.title, self.body)
    }
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    node_id: String,
}

/// Create or refresh the pull request for a pushed update branch.
///
/// At most one open pull request exists per repository and branch; if one
/// is already open its title and body are amended in place, otherwise a
/// new one is created. Enabling auto-merge is attempted after either path
/// and downgraded to a warning when the repository does not allow it.
pub struct PullRequester {
    client: reqwest::Client,
    api_url: String,
    graphql_url: String,
    token: String,
}

impl PullRequester {
    /// Create a new pull requester authenticating with `token`.
    pub fn new(token: &str) -> Result<Self, PublishError> {
        Self::with_api_url(token, GITHUB_API_URL)
    }

    /// Create a pull requester against a non-default API base URL.
    pub fn with_api_url(
        token: &str,
        api_url: impl Into<String>,
    ) -> Result<Self, PublishError> {
        let api_url = api_url.into();
        let graphql_url = format!("{api_url}/graphql");
        let client = reqwest::Client::builder()
            .user_agent(format!("upkeep/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url,
            graphql_url,
            token: token.to_string(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, PublishError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let bearer = format!("Bearer {}", self.token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| PublishError::InvalidHeader(e.to_string()))?,
        );
        Ok(headers)
    }

    /// Open or amend the pull request for `branch` against `base`.
    pub async fn publish(
        &self,
        github_repo: &GitHubRepository,
        branch: &str,
        base: &str,
        message: &CommitMessage,
    ) -> Result<(), PublishError> {
        let pr = match self.find_open(github_repo, branch, base).await? {
            Some(existing) => {
                info!(
                    repository = %github_repo,
                    number = existing.number,
                    "Amending existing pull request"
                );
                self.amend(github_repo, &existing, message).await?;
                existing
            }
            None => {
                let created =
                    self.create(github_repo, branch, base, message).await?;
                info!(
                    repository = %github_repo,
                    number = created.number,
                    "Created pull request"
                );
                created
            }
        };

        // Auto-merge requires repository settings we do not control, so a
        // refusal here is not a processing failure.
        if let Err(error) = self.enable_auto_merge(&pr).await {
            warn!(
                repository = %github_repo,
                number = pr.number,
                %error,
                "Cannot enable auto-merge"
            );
        }
        Ok(())
    }

    async fn find_open(
        &self,
        github_repo: &GitHubRepository,
        branch: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, PublishError> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_url, github_repo.owner, github_repo.repo
        );
        let head = format!("{}:{}", github_repo.owner, branch);
        debug!(%url, %head, "Looking for open pull request");
        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(&[("state", "open"), ("head", &head), ("base", base)])
            .send()
            .await?;
        let open: Vec<PullRequest> = Self::parse_response(response).await?;
        Ok(open.into_iter().next())
    }

    async fn create(
        &self,
        github_repo: &GitHubRepository,
        branch: &str,
        base: &str,
        message: &CommitMessage,
    ) -> Result<PullRequest, PublishError> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_url, github_repo.owner, github_repo.repo
        );
        let payload = json!({
            "title": message.title,
            "body": message.body,
            "head": branch,
            "base": base,
            "maintainer_can_modify": true,
            "draft": false,
        });
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn amend(
        &self,
        github_repo: &GitHubRepository,
        pr: &PullRequest,
        message: &CommitMessage,
    ) -> Result<(), PublishError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, github_repo.owner, github_repo.repo, pr.number
        );
        let payload = json!({
            "title": message.title,
            "body": message.body,
        });
        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn enable_auto_merge(
        &self,
        pr: &PullRequest,
    ) -> Result<(), PublishError> {
        let mutation = "mutation($id: ID!) {\
             enablePullRequestAutoMerge(\
                 input: {pullRequestId: $id, mergeMethod: SQUASH}\
             ) { clientMutationId }\
         }";
        let payload = json!({
            "query": mutation,
            "variables": {"id": pr.node_id},
        });
        let response = self
            .client
            .post(&self.graphql_url)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await?;
        let body: serde_json::Value = Self::parse_response(response).await?;
        if let Some(errors) = body.get("errors") {
            return Err(PublishError::Api {
                url: self.graphql_url.clone(),
                status: 200,
                message: errors.to_string(),
            });
        }
        Ok(())
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let url = response.url().to_string();
            let message = response.text().await.unwrap_or_default();
            Err(PublishError::Api {
                url,
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PublishError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}
