//! HTTP client trait abstraction.
//!
//! The collection loader only ever reads, so the transport surface is a
//! single GET. Keeping it behind a trait lets the page fetcher run against
//! reqwest in production and a scripted client in tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// Request or response headers, name to value.
pub type Headers = HashMap<String, String>;

/// A fully buffered response. Pages are small, so nothing streams.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A 200 with `value` serialised as the body, as a page endpoint would send it.
    pub fn json_body(value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::with_headers(200, headers, Bytes::from(value.to_string()))
    }

    /// 2xx only; redirects are followed by the transport before we see them.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8, used for error messages.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport-level HTTP errors.
///
/// A non-2xx status is not an error at this layer; it comes back as a
/// [`Response`] and the caller decides what it means.
#[derive(Debug, Clone)]
pub enum HttpError {
    /// No connection to the host could be made.
    ConnectionFailed(String),
    /// The configured timeout elapsed.
    Timeout(String),
    Cancelled,
    /// The body could not be read off the wire.
    Io(String),
    /// The URL could not be turned into a request. Not worth retrying.
    InvalidUrl(String),
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "could not connect: {}", msg),
            HttpError::Timeout(msg) => write!(f, "timed out: {}", msg),
            HttpError::Cancelled => f.write_str("cancelled before a response arrived"),
            HttpError::Io(msg) => write!(f, "failed reading response body: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "unusable URL: {}", msg),
            HttpError::Other(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// GET transport used by the page fetcher.
///
/// Status codes are not interpreted here; only failures to obtain a
/// response at all are errors.
///
/// # Example
///
/// ```ignore
/// use curator::traits::{HttpClient, Headers, HttpError};
///
/// async fn fetch_text<C: HttpClient>(client: &C) -> Result<String, HttpError> {
///     let response = client.get("https://repo.example.com/api/v0/assets/", &Headers::new()).await?;
///     response.text().map_err(|e| HttpError::Other(e.to_string()))
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;
}
