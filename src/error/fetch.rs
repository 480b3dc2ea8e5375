//! Errors reported by page fetchers.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Why a page could not be fetched.
///
/// The loader treats every variant the same way (the phase becomes
/// `Errored` and accumulated items are kept); the kind is preserved so a
/// view can show a meaningful message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure, including timeouts.
    #[error("Network error fetching '{url}': {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("Server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body was not a valid page envelope.
    #[error("Could not parse page: {message}")]
    Parse { message: String },

    /// The request could not be built: a relative endpoint without a base
    /// URL, or a URL the transport refuses. Retrying cannot help.
    #[error("Invalid request target '{url}': {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Classify a transport error for the given URL.
    pub fn from_transport(err: HttpError, url: &str) -> Self {
        match err {
            HttpError::InvalidUrl(message) => FetchError::Request {
                url: url.to_string(),
                message,
            },
            other => FetchError::Network {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::Network { .. } => ErrorCategory::Network,
            FetchError::Server { .. } => ErrorCategory::Server,
            FetchError::Parse { .. } | FetchError::Request { .. } => ErrorCategory::Client,
        }
    }

    /// Whether retrying the same cursor is likely to help.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Server { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            FetchError::Parse { .. } | FetchError::Request { .. } => false,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "E_FETCH_NETWORK",
            FetchError::Server { .. } => "E_FETCH_SERVER",
            FetchError::Parse { .. } => "E_FETCH_PARSE",
            FetchError::Request { .. } => "E_FETCH_REQUEST",
        }
    }

    /// Message suitable for rendering next to a retry button.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network { .. } => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            FetchError::Server { status, .. } => match *status {
                401 | 403 => "You don't have permission to view this collection.".to_string(),
                404 => "The requested collection was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            FetchError::Parse { .. } => {
                "Received an invalid response from the server.".to_string()
            }
            FetchError::Request { .. } => {
                "The collection address is invalid. Check the endpoint and base URL.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse {
            message: err.to_string(),
        }
    }
}
