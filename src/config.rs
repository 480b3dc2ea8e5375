//! Loader and fetcher configuration.
//!
//! Settings that would otherwise live in process-wide request setup (base
//! URL, default headers such as the CSRF token) are passed explicitly when
//! the page fetcher is built.

use std::time::Duration;

use crate::error::ConfigError;
use crate::fetcher::FetcherConfig;

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the CSRF token expected by the repository API.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Configuration for loaders and the HTTP page fetcher.
///
/// # Example
///
/// ```ignore
/// use curator::config::LoaderConfig;
///
/// let config = LoaderConfig::default()
///     .with_base_url("https://repo.example.com")
///     .with_timeout_secs(10)
///     .with_page_limit(5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Base URL that relative endpoints are joined onto
    pub base_url: Option<String>,
    /// Transport timeout (default: 30s)
    pub timeout_secs: u64,
    /// CSRF token sent as a base header
    pub csrf_token: Option<String>,
    /// Treat an empty page as the end of the collection (default: true)
    pub exhaust_on_empty_page: bool,
    /// Cap on pages loaded by one `load_all` call
    pub page_limit: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            csrf_token: None,
            exhaust_on_empty_page: true,
            page_limit: None,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_exhaust_on_empty_page(mut self, enabled: bool) -> Self {
        self.exhaust_on_empty_page = enabled;
        self
    }

    pub fn with_page_limit(mut self, pages: usize) -> Self {
        self.page_limit = Some(pages);
        self
    }

    /// Read configuration from the environment.
    ///
    /// - `CURATOR_BASE_URL`
    /// - `CURATOR_TIMEOUT_SECS`
    /// - `CURATOR_CSRF_TOKEN`
    /// - `CURATOR_PAGE_LIMIT`
    /// - `CURATOR_EXHAUST_ON_EMPTY_PAGE` (`0`/`false` to disable)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_var("CURATOR_BASE_URL") {
            validate_url(&url)?;
            config.base_url = Some(url);
        }
        if let Some(secs) = env_var("CURATOR_TIMEOUT_SECS") {
            config.timeout_secs = parse_positive("CURATOR_TIMEOUT_SECS", secs)?;
        }
        if let Some(token) = env_var("CURATOR_CSRF_TOKEN") {
            config.csrf_token = Some(token);
        }
        if let Some(limit) = env_var("CURATOR_PAGE_LIMIT") {
            config.page_limit = Some(parse_positive("CURATOR_PAGE_LIMIT", limit)?);
        }
        if let Some(flag) = env_var("CURATOR_EXHAUST_ON_EMPTY_PAGE") {
            config.exhaust_on_empty_page = parse_flag("CURATOR_EXHAUST_ON_EMPTY_PAGE", flag)?;
        }

        Ok(config)
    }

    /// Check that `endpoint` can be turned into an absolute URL.
    pub fn check_endpoint(&self, endpoint: &str) -> Result<(), ConfigError> {
        if is_absolute_url(endpoint) || self.base_url.is_some() {
            Ok(())
        } else {
            Err(ConfigError::MissingBaseUrl(endpoint.to_string()))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Derive the page fetcher settings.
    pub fn fetcher_config(&self) -> FetcherConfig {
        let mut fetcher = FetcherConfig::default().with_timeout(self.timeout());
        if let Some(base) = &self.base_url {
            fetcher = fetcher.with_base_url(base.clone());
        }
        if let Some(token) = &self.csrf_token {
            fetcher = fetcher.with_header(CSRF_HEADER, token.clone());
        }
        fetcher
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<N>(var: &'static str, value: String) -> Result<N, ConfigError>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: N::Err| ConfigError::InvalidEnv {
        var,
        reason: e.to_string(),
        value,
    })
}

/// A zero timeout would fail every request and a zero page limit would
/// load nothing, so both must be at least 1.
fn parse_positive<N>(var: &'static str, value: String) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialEq + Default,
    N::Err: std::fmt::Display,
{
    let parsed: N = parse_env(var, value.clone())?;
    if parsed == N::default() {
        return Err(ConfigError::InvalidEnv {
            var,
            value,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Whether `url` starts with an http(s) scheme.
pub fn is_absolute_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<(), ConfigError> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}
