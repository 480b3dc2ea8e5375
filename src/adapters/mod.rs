//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::ScriptedFetcher`] - Page results played back in order
//! - [`mock::ManualFetcher`] - Page results supplied by the test on demand

pub mod mock;
pub mod reqwest_http;

pub use mock::{ManualFetcher, MockHttpClient, ScriptedFetcher};
pub use reqwest_http::ReqwestHttpClient;
