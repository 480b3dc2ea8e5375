//! HTTP page fetcher for `{results, next, previous, count}` endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::adapters::ReqwestHttpClient;
use crate::config::{is_absolute_url, validate_url, DEFAULT_TIMEOUT_SECS};
use crate::error::{ConfigError, FetchError};
use crate::models::{Page, PageEnvelope, PageRequest};
use crate::traits::{Headers, HttpClient, PageFetcher};

/// Longest slice of an error body kept in a `FetchError::Server` message.
const MAX_ERROR_BODY: usize = 200;

/// Settings for [`HttpPageFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Joined onto relative endpoints. Cursors are always absolute.
    pub base_url: Option<String>,
    /// Sent with every request.
    pub headers: Headers,
    /// Transport timeout; expiry is reported as a network error.
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            base_url: None,
            headers,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FetcherConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches pages over HTTP and decodes the paginated JSON envelope.
///
/// Holds no per-collection state: the same fetcher can back any number of
/// loaders.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher<C = ReqwestHttpClient> {
    client: C,
    config: FetcherConfig,
}

impl HttpPageFetcher<ReqwestHttpClient> {
    /// Build a fetcher backed by reqwest, honouring the configured timeout.
    pub fn from_config(config: FetcherConfig) -> Result<Self, ConfigError> {
        let client = ReqwestHttpClient::with_timeout(config.timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Self::with_client(client, config)
    }
}

impl<C: HttpClient> HttpPageFetcher<C> {
    /// Build a fetcher over any [`HttpClient`].
    pub fn with_client(client: C, config: FetcherConfig) -> Result<Self, ConfigError> {
        if let Some(base) = &config.base_url {
            validate_url(base)?;
        }
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve the request target to an absolute URL.
    pub fn resolve(&self, target: &str) -> Option<String> {
        if is_absolute_url(target) {
            return Some(target.to_string());
        }
        let base = self.config.base_url.as_deref()?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            target.trim_start_matches('/')
        ))
    }
}

#[async_trait]
impl<T, C> PageFetcher<T> for HttpPageFetcher<C>
where
    T: DeserializeOwned + Send + 'static,
    C: HttpClient,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, FetchError> {
        let target = request.target();
        let url = self.resolve(target).ok_or_else(|| FetchError::Request {
            url: target.to_string(),
            message: "relative URL and no base URL configured".to_string(),
        })?;

        let response = self
            .client
            .get(&url, &self.config.headers)
            .await
            .map_err(|e| FetchError::from_transport(e, &url))?;

        if !response.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Server {
                status: response.status,
                message: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let envelope: PageEnvelope<T> = response.json()?;
        let page = Page::from(envelope);
        tracing::trace!(url = %url, items = page.items.len(), "Fetched page");
        Ok(page)
    }
}

fn truncate(body: &str, max: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::models::Cursor;
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;
    use serde_json::{json, Value};

    const ASSETS: &str = "https://repo.example.com/api/v0/assets/";

    fn fetcher(client: &MockHttpClient) -> HttpPageFetcher<MockHttpClient> {
        HttpPageFetcher::with_client(client.clone(), FetcherConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_first_page_uses_endpoint() {
        let client = MockHttpClient::new();
        client.set_response(
            ASSETS,
            MockResponse::Success(Response::json_body(&json!({
                "count": 3,
                "next": "https://repo.example.com/api/v0/assets/?page=2",
                "previous": null,
                "results": [{"name": "a.png"}, {"name": "b.png"}]
            }))),
        );

        let page: Page<Value> = fetcher(&client)
            .fetch_page(&PageRequest::first(ASSETS))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.count, Some(3));
        assert_eq!(
            page.next_cursor,
            Some(Cursor::new("https://repo.example.com/api/v0/assets/?page=2"))
        );
        let requests = client.get_requests();
        assert_eq!(requests[0].url, ASSETS);
        assert_eq!(
            requests[0].headers.get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[tokio::test]
    async fn test_cursor_used_verbatim() {
        let client = MockHttpClient::new();
        let next = "https://cdn.example.com/other/?cursor=opaque%3D%3D";
        client.set_response(
            next,
            MockResponse::Success(Response::json_body(&json!({"results": [], "next": null}))),
        );

        let request = PageRequest {
            endpoint: ASSETS.to_string(),
            cursor: Some(Cursor::new(next)),
        };
        let page: Page<Value> = fetcher(&client).fetch_page(&request).await.unwrap();

        assert!(page.is_last());
        assert_eq!(client.get_requests()[0].url, next);
    }

    #[tokio::test]
    async fn test_non_2xx_is_server_error() {
        let client = MockHttpClient::new();
        client.set_response(
            ASSETS,
            MockResponse::Success(Response::new(500, Bytes::from("Internal Server Error"))),
        );

        let result: Result<Page<Value>, _> =
            fetcher(&client).fetch_page(&PageRequest::first(ASSETS)).await;

        assert_eq!(
            result.unwrap_err(),
            FetchError::Server {
                status: 500,
                message: "Internal Server Error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let client = MockHttpClient::new();
        client.set_response(
            ASSETS,
            MockResponse::Success(Response::new(200, Bytes::from("<html>login</html>"))),
        );

        let result: Result<Page<Value>, _> =
            fetcher(&client).fetch_page(&PageRequest::first(ASSETS)).await;
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let client = MockHttpClient::new();
        client.set_response(
            ASSETS,
            MockResponse::Error(HttpError::Timeout("deadline elapsed".to_string())),
        );

        let result: Result<Page<Value>, _> =
            fetcher(&client).fetch_page(&PageRequest::first(ASSETS)).await;
        match result {
            Err(FetchError::Network { url, message }) => {
                assert_eq!(url, ASSETS);
                assert!(message.contains("deadline elapsed"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relative_endpoint_joined_onto_base() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::json_body(
            &json!({"results": [1, 2]}),
        )));
        let config = FetcherConfig::default()
            .with_base_url("https://repo.example.com/")
            .with_header("X-CSRFToken", "tok");
        let fetcher = HttpPageFetcher::with_client(client.clone(), config).unwrap();

        let page: Page<u32> = fetcher
            .fetch_page(&PageRequest::first("/api/v0/vocabularies/"))
            .await
            .unwrap();

        assert_eq!(page.items, vec![1, 2]);
        let request = &client.get_requests()[0];
        assert_eq!(request.url, "https://repo.example.com/api/v0/vocabularies/");
        assert_eq!(request.headers.get("X-CSRFToken"), Some(&"tok".to_string()));
    }

    #[tokio::test]
    async fn test_relative_endpoint_without_base_fails() {
        let client = MockHttpClient::new();
        let result: Result<Page<Value>, _> = fetcher(&client)
            .fetch_page(&PageRequest::first("/api/v0/assets/"))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
        assert!(!err.is_retryable());
        assert!(client.get_requests().is_empty());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = FetcherConfig::default().with_base_url("repo.example.com");
        assert!(HttpPageFetcher::with_client(MockHttpClient::new(), config).is_err());
    }

    #[test]
    fn test_truncate_long_bodies() {
        let body = "x".repeat(500);
        let truncated = truncate(&body, MAX_ERROR_BODY);
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate("  short  ", 10), "short");
    }
}
