//! Page fetcher implementations.

pub mod http;

pub use http::{FetcherConfig, HttpPageFetcher};
