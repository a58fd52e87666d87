//! HTTP client wrapper with rate limiting and bounded retry

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rate limiter shared by clones of one client
type ClientRateLimiter = Arc<
    RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

/// Maximum attempts for one logical request, counting the first.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retries.
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// HTTP client for inventory and API requests.
///
/// Wraps reqwest with a request timeout, optional client-side rate
/// limiting, and a small bounded retry with exponential backoff. Only
/// transient failures are retried; 404s and other permanent responses are
/// surfaced immediately.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<ClientRateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration (no rate limiting)
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Self::build_client()?,
            rate_limiter: None,
        })
    }

    /// Create a new HTTP client limited to `requests_per_second`.
    pub fn with_rate_limit(requests_per_second: u32) -> Result<Self> {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN),
        );
        Ok(Self {
            client: Self::build_client()?,
            rate_limiter: Some(Arc::new(RateLimiter::direct(quota))),
        })
    }

    fn build_client() -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(format!("upkeep/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?)
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Make a GET request and deserialize the JSON response.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: reqwest::header::HeaderMap,
    ) -> Result<T> {
        let response = self.get_with_retry(url, headers).await?;
        Ok(response.json().await?)
    }

    /// Make a GET request and return the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .get_with_retry(url, reqwest::header::HeaderMap::new())
            .await?;
        Ok(response.text().await?)
    }

    async fn get_with_retry(
        &self,
        url: &str,
        headers: reqwest::header::HeaderMap,
    ) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_once(url, headers.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt - 1);
                    debug!(url, attempt, error = %e, "Transient failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(
        &self,
        url: &str,
        headers: reqwest::header::HeaderMap,
    ) -> Result<reqwest::Response> {
        self.wait_for_rate_limit().await;

        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(url.to_string()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result = client.get_text(&format!("{}/missing", server.url())).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result = client.get_text(&format!("{}/flaky", server.url())).await;
        assert!(matches!(result, Err(Error::Status { status: 503, .. })));
        failing.assert_async().await;
    }
}
