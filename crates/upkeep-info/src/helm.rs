//! Inventory of available Helm chart versions

use crate::cache::FetchCache;
use crate::client::HttpClient;
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;
use upkeep_deps::ParsedVersion;

#[derive(Debug, Default, Deserialize)]
struct HelmIndex {
    #[serde(default)]
    entries: HashMap<String, Vec<HelmRelease>>,
}

#[derive(Debug, Deserialize)]
struct HelmRelease {
    version: Option<String>,
}

/// Inventory the chart versions available from Helm chart repositories.
///
/// The repository's index document is fetched once per distinct URL per
/// run; lookups by chart name are answered from the cached index.
pub struct HelmInventory {
    client: HttpClient,
    cache: FetchCache<HashMap<String, String>>,
}

impl HelmInventory {
    /// Create a new Helm chart inventory.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            cache: FetchCache::new(),
        }
    }

    /// Canonicalize a chart repository URL to its index document.
    pub fn canonicalize_url(url: &str) -> String {
        if url.ends_with("/index.yaml") {
            return url.to_string();
        }
        format!("{}/index.yaml", url.trim_end_matches('/'))
    }

    /// Return the latest version of every chart in a repository.
    ///
    /// Only strict semantic versions are considered; a chart whose
    /// releases all carry unorderable versions is absent from the result.
    pub async fn inventory(&self, url: &str) -> Result<HashMap<String, String>> {
        let index_url = Self::canonicalize_url(url);
        url::Url::parse(&index_url)?;
        self.cache
            .get_or_fetch(&index_url, || self.fetch_index(&index_url))
            .await
    }

    async fn fetch_index(&self, index_url: &str) -> Result<HashMap<String, String>> {
        info!(url = index_url, "Inventorying Helm chart repository");
        let body = self.client.get_text(index_url).await?;
        let index: HelmIndex = serde_yaml::from_str(&body)?;

        let mut results = HashMap::new();
        for (name, releases) in index.entries {
            let latest = releases
                .iter()
                .filter_map(|release| release.version.as_deref())
                .filter_map(|version| ParsedVersion::parse(version).ok())
                .max();
            if let Some(latest) = latest {
                results.insert(name, latest.as_str().to_string());
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"apiVersion: v1
entries:
  gafaelfawr:
    - version: 1.3.1
    - version: 1.4.0
    - version: 1.3.2
  sqlproxy:
    - version: unreleased
"#;

    #[test]
    fn test_canonicalize_url() {
        assert_eq!(
            HelmInventory::canonicalize_url("https://example.org/charts"),
            "https://example.org/charts/index.yaml"
        );
        assert_eq!(
            HelmInventory::canonicalize_url("https://example.org/charts/"),
            "https://example.org/charts/index.yaml"
        );
        assert_eq!(
            HelmInventory::canonicalize_url("https://example.org/charts/index.yaml"),
            "https://example.org/charts/index.yaml"
        );
    }

    #[tokio::test]
    async fn test_inventory_returns_semver_max_per_chart() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/charts/index.yaml")
            .with_body(INDEX)
            .create_async()
            .await;

        let inventory = HelmInventory::new(HttpClient::new().unwrap());
        let results = inventory
            .inventory(&format!("{}/charts", server.url()))
            .await
            .unwrap();

        assert_eq!(results.get("gafaelfawr").map(String::as_str), Some("1.4.0"));
        // All releases unorderable: the chart is absent, not mapped to junk.
        assert!(!results.contains_key("sqlproxy"));
    }

    #[tokio::test]
    async fn test_index_fetched_once_per_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/charts/index.yaml")
            .with_body(INDEX)
            .expect(1)
            .create_async()
            .await;

        let inventory = HelmInventory::new(HttpClient::new().unwrap());
        let url = format!("{}/charts", server.url());
        inventory.inventory(&url).await.unwrap();
        inventory.inventory(&url).await.unwrap();
        mock.assert_async().await;
    }
}
