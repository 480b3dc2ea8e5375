//! Errors raised by the cursor state machine itself.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::loader::{Generation, Phase};

/// Internal invariant violations.
///
/// Fetch failures never surface here; they are folded into the
/// `Errored` phase. A `LoaderError` means completions and generation
/// tokens got out of step, which risks corrupting loaded state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// A current-generation completion arrived while no fetch was in flight.
    #[error("invalid transition: completion for generation {generation} arrived in phase {found}")]
    InvalidTransition { generation: Generation, found: Phase },
}

impl LoaderError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Client
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LoaderError::InvalidTransition { .. } => "E_LOADER_TRANSITION",
        }
    }
}
