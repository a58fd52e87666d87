//! Inventory of available GitHub tags

use crate::cache::FetchCache;
use crate::client::HttpClient;
use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};
use upkeep_deps::ParsedVersion;

const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub's maximum and our requested page size for tag listings.
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Inventory the available tags of GitHub repositories.
///
/// Lookups are cached per `owner/repo` for the lifetime of the inventory,
/// which the processor scopes to one pipeline run.
pub struct GitHubInventory {
    client: HttpClient,
    api_url: String,
    token: Option<String>,
    cache: FetchCache<Option<String>>,
}

impl GitHubInventory {
    /// Create a new GitHub tag inventory.
    ///
    /// A token raises the API rate limit and grants access to private
    /// repositories; without one, requests are anonymous.
    pub fn new(client: HttpClient, token: Option<String>) -> Self {
        Self::with_api_url(client, token, GITHUB_API_URL)
    }

    /// Create an inventory against a non-default API base URL.
    pub fn with_api_url(
        client: HttpClient,
        token: Option<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token,
            cache: FetchCache::new(),
        }
    }

    /// Return the latest semantic-version tag of a repository.
    ///
    /// Tags that do not parse as strict semantic versions are unorderable
    /// and excluded; if no tag qualifies, the repository has no comparable
    /// latest version and `None` is returned. The winning tag keeps its
    /// original spelling (including any `v` prefix).
    pub async fn latest_tag(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let key = format!("{owner}/{repo}");
        self.cache
            .get_or_fetch(&key, || self.fetch_latest_tag(owner, repo))
            .await
    }

    async fn fetch_latest_tag(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        info!(owner, repo, "Inventorying GitHub repository tags");

        let mut latest: Option<ParsedVersion> = None;
        let mut page = 1;
        loop {
            let url = format!(
                "{}/repos/{}/{}/tags?per_page={}&page={}",
                self.api_url, owner, repo, PER_PAGE, page
            );
            let tags: Vec<Tag> = self.client.get_json(&url, self.headers()?).await?;
            let full_page = tags.len() == PER_PAGE;

            for tag in tags {
                let Ok(version) = ParsedVersion::parse(&tag.name) else {
                    continue;
                };
                if latest.as_ref().is_none_or(|v| version > *v) {
                    latest = Some(version);
                }
            }

            if !full_page {
                break;
            }
            page += 1;
        }

        if latest.is_none() {
            debug!(owner, repo, "No semantic-version tags found");
        }
        Ok(latest.map(|v| v.as_str().to_string()))
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "application/vnd.github+json"
                .parse()
                .map_err(|_| Error::InvalidHeader("Accept".to_string()))?,
        );
        if let Some(token) = &self.token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .map_err(|_| Error::InvalidHeader("Authorization".to_string()))?,
            );
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(server: &mockito::Server) -> GitHubInventory {
        GitHubInventory::with_api_url(HttpClient::new().unwrap(), None, server.url())
    }

    #[tokio::test]
    async fn test_latest_tag_prefers_semver_ordering() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/pre-commit/pre-commit-hooks/tags")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "v3.4.0"}, {"name": "v3.10.0"}, {"name": "v3.9.0"}]"#)
            .create_async()
            .await;

        let latest = inventory(&server)
            .latest_tag("pre-commit", "pre-commit-hooks")
            .await
            .unwrap();
        assert_eq!(latest.as_deref(), Some("v3.10.0"));
    }

    #[tokio::test]
    async fn test_non_semver_tags_are_excluded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/example/repo/tags")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "20200101-build"}, {"name": "v1.2.0"}]"#)
            .create_async()
            .await;

        let latest = inventory(&server).latest_tag("example", "repo").await.unwrap();
        // The date tag is lexically larger but unorderable; never chosen.
        assert_eq!(latest.as_deref(), Some("v1.2.0"));
    }

    #[tokio::test]
    async fn test_only_non_semver_tags_yields_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/example/repo/tags")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "20200101-build"}, {"name": "latest"}]"#)
            .create_async()
            .await;

        let latest = inventory(&server).latest_tag("example", "repo").await.unwrap();
        assert_eq!(latest, None);
    }

    #[tokio::test]
    async fn test_lookup_is_cached_per_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/example/repo/tags")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "v1.0.0"}]"#)
            .expect(1)
            .create_async()
            .await;

        let inventory = inventory(&server);
        for _ in 0..3 {
            let latest = inventory.latest_tag("example", "repo").await.unwrap();
            assert_eq!(latest.as_deref(), Some("v1.0.0"));
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_repository_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/example/gone/tags")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let result = inventory(&server).latest_tag("example", "gone").await;
        match result {
            Err(e) => assert!(!e.is_transient()),
            Ok(_) => panic!("expected a not-found error"),
        }
    }
}
