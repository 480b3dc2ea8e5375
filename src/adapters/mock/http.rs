//! Scripted [`HttpClient`] for fetcher tests.
//!
//! Page URLs map to canned responses or transport failures, and every GET
//! is recorded along with its headers.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// One request as the fetcher sent it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Fully resolved, after base-URL joining
    pub url: String,
    pub headers: Headers,
}

/// What a scripted URL answers with.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Any status, including 4xx/5xx pages
    Success(Response),
    Error(HttpError),
}

/// In-memory page server.
///
/// Lookup order for a URL: the next queued one-shot response, then the
/// exact-match response, then the longest configured prefix, then the
/// default.
///
/// # Example
///
/// ```ignore
/// use curator::adapters::mock::{MockHttpClient, MockResponse};
/// use curator::traits::{Headers, HttpClient, HttpError, Response};
///
/// let client = MockHttpClient::new();
/// client.push_response(url, MockResponse::Error(HttpError::Timeout("30s".into())));
/// client.set_response(url, MockResponse::Success(Response::json_body(&page)));
///
/// assert!(client.get(url, &Headers::new()).await.is_err());
/// assert!(client.get(url, &Headers::new()).await.is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Responses consumed one at a time, ahead of `responses`
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a URL (matched exactly, or as a prefix).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a response that is returned once for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        let mut queued = self.queued.lock().unwrap();
        queued.entry(url.to_string()).or_default().push_back(response);
    }

    /// Fallback for URLs nothing else matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Requests in the order they were sent.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(queue) = self.queued.lock().unwrap().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        let prefix_match = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefix_match.is_some() {
            return prefix_match;
        }

        self.default_response.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers);

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("nothing scripted for {}", url))),
        }
    }
}
