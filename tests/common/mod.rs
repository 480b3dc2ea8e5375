//! Common test utilities for integration tests.
//!
//! Builders for page envelopes and fetchers pointed at a wiremock server.

#![allow(dead_code)]

use curator::config::LoaderConfig;
use curator::fetcher::HttpPageFetcher;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Collection path used by most tests.
pub const ASSETS_PATH: &str = "/api/v0/assets/";

/// Absolute cursor URL on the mock server.
pub fn cursor_url(server: &MockServer, cursor: &str) -> String {
    format!("{}{}?cursor={}", server.uri(), ASSETS_PATH, cursor)
}

/// A `{results, next, previous, count}` body with one object per id.
pub fn envelope(ids: &[u32], next: Option<String>, count: Option<u64>) -> Value {
    json!({
        "count": count,
        "next": next,
        "previous": null,
        "results": ids.iter().map(|id| json!({ "id": id, "title": format!("Asset {}", id) })).collect::<Vec<_>>(),
    })
}

/// Configuration whose base URL is the mock server.
pub fn config_for(server: &MockServer) -> LoaderConfig {
    LoaderConfig::default()
        .with_base_url(server.uri())
        .with_timeout_secs(5)
}

/// A real reqwest-backed fetcher pointed at the mock server.
pub fn fetcher_for(server: &MockServer) -> HttpPageFetcher {
    HttpPageFetcher::from_config(config_for(server).fetcher_config())
        .expect("mock server URL is valid")
}

/// Extract the `id` field of every loaded item.
pub fn ids(items: &[Value]) -> Vec<u64> {
    items.iter().filter_map(|item| item["id"].as_u64()).collect()
}
