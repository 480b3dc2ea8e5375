//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP GET transport
//! - [`PageFetcher`] - loads one page of a collection for a cursor

pub mod fetcher;
pub mod http;

pub use fetcher::PageFetcher;
pub use http::{Headers, HttpClient, HttpError, Response};
