//! Error types for the collection loader.
//!
//! | Type | Raised by | Crosses the loader contract? |
//! |------|-----------|------------------------------|
//! | [`FetchError`] | page fetchers | No, recovered into `Errored` |
//! | [`LoaderError`] | the cursor state machine | Logged as a defect |
//! | [`ConfigError`] | configuration loading | Yes |
//!
//! Every error maps onto an [`ErrorCategory`] so views can pick a
//! presentation and decide whether to offer a retry.

mod category;
mod config;
mod fetch;
mod loader;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use fetch::FetchError;
pub use loader::LoaderError;
