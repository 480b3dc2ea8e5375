//! Mock implementations for testing.
//!
//! These let the loader and page fetcher be exercised without network
//! access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`ScriptedFetcher`] - page fetcher answering from a queue
//! - [`ManualFetcher`] - page fetcher answered by the test

pub mod fetcher;
pub mod http;

pub use fetcher::{ManualFetcher, PendingFetch, ScriptedFetcher};
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
