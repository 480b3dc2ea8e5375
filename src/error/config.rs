//! Configuration errors.

use thiserror::Error;

use super::category::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// A base URL or endpoint was not an http(s) URL.
    #[error("invalid URL '{0}': expected an http:// or https:// URL")]
    InvalidUrl(String),

    /// A relative endpoint was given but no base URL is configured.
    #[error("endpoint '{0}' is relative but no base URL is configured")]
    MissingBaseUrl(String),

        /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}
