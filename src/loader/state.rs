//! Cursor state machine.
//!
//! Pure transition logic for an incrementally loaded collection: no I/O and
//! no async. The driver in [`super::handle`] asks the machine for a
//! [`FetchTicket`], runs the fetch, and feeds the result back through
//! [`CursorMachine::complete`].
//!
//! ```text
//! Idle ──request──▶ Loading ──page(next)──▶ Idle
//!   ▲                  │ ──page(no next)──▶ Exhausted (terminal)
//!   │                  └──error──────────▶ Errored ──retry──▶ Loading
//!   └──────────── reset (from any phase) ◀──────────────────────┘
//! ```
//!
//! "In flight" and "exhausted" live in one [`Phase`] enum so the machine
//! cannot represent a fetch past the last page.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{FetchError, LoaderError};
use crate::models::{Cursor, Page, PageRequest};

/// Token stamped on a loader at creation and on every reset or destroy.
pub type Generation = u64;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Generations are unique across loader instances, so a completion can
/// never be applied to a different collection that happens to reuse a view.
fn next_generation() -> Generation {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle state of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Initial state; more pages may exist.
    Idle,
    /// Exactly one fetch is outstanding.
    Loading,
    /// No further pages exist. Terminal until reset.
    Exhausted,
    /// The last fetch failed; items and cursor are intact.
    Errored,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Exhausted => "exhausted",
            Phase::Errored => "errored",
        }
    }

    /// Whether a fetch may be started from this phase.
    pub fn can_request(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Errored)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission to run one fetch, bound to the generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub request: PageRequest,
}

/// Snapshot of a loader, published to subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderStatus {
    pub generation: Generation,
    pub phase: Phase,
    pub endpoint: String,
    pub cursor: Option<Cursor>,
    pub item_count: usize,
    pub pages_loaded: usize,
    /// Collection size as last reported by the server.
    pub total_count: Option<u64>,
    #[serde(skip)]
    pub last_error: Option<FetchError>,
    pub destroyed: bool,
}

impl LoaderStatus {
    /// True once the most recent request has finished, one way or the other.
    pub fn is_settled(&self) -> bool {
        self.phase != Phase::Loading
    }

    pub fn has_more(&self) -> bool {
        !self.destroyed && self.phase != Phase::Exhausted
    }
}

/// Outcome of feeding a fetch result back into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The result was applied; carries the new status.
    Applied(LoaderStatus),
    /// The ticket belonged to a superseded generation and was ignored.
    Stale,
}

/// Loader state for one collection binding.
#[derive(Debug)]
pub struct CursorMachine<T> {
    endpoint: String,
    items: Vec<T>,
    cursor: Option<Cursor>,
    phase: Phase,
    last_error: Option<FetchError>,
    generation: Generation,
    pages_loaded: usize,
    total_count: Option<u64>,
    exhaust_on_empty_page: bool,
    destroyed: bool,
}

impl<T> CursorMachine<T> {
    /// A fresh machine bound to `endpoint`, positioned before the first page.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            items: Vec::new(),
            cursor: None,
            phase: Phase::Idle,
            last_error: None,
            generation: next_generation(),
            pages_loaded: 0,
            total_count: None,
            exhaust_on_empty_page: true,
            destroyed: false,
        }
    }

    /// Treat a page with zero items as the end of the collection even when
    /// the server still reports a `next` cursor.
    pub fn with_exhaust_on_empty_page(mut self, enabled: bool) -> Self {
        self.exhaust_on_empty_page = enabled;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn status(&self) -> LoaderStatus {
        LoaderStatus {
            generation: self.generation,
            phase: self.phase,
            endpoint: self.endpoint.clone(),
            cursor: self.cursor.clone(),
            item_count: self.items.len(),
            pages_loaded: self.pages_loaded,
            total_count: self.total_count,
            last_error: self.last_error.clone(),
            destroyed: self.destroyed,
        }
    }

    /// Start fetching the next page.
    ///
    /// Returns `None` without touching state while a fetch is in flight,
    /// once the collection is exhausted, or after destroy.
    pub fn request_next_page(&mut self) -> Option<FetchTicket> {
        if self.destroyed || !self.phase.can_request() {
            return None;
        }

        self.phase = Phase::Loading;
        self.last_error = None;

        Some(FetchTicket {
            generation: self.generation,
            request: PageRequest {
                endpoint: self.endpoint.clone(),
                cursor: self.cursor.clone(),
            },
        })
    }

    /// Re-issue the failed request. Only valid from `Errored`.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.phase != Phase::Errored {
            return None;
        }
        self.request_next_page()
    }

    /// Apply the result of the fetch described by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Page<T>, FetchError>,
    ) -> Result<Completion, LoaderError> {
        if ticket.generation != self.generation {
            return Ok(Completion::Stale);
        }
        if self.phase != Phase::Loading {
            return Err(LoaderError::InvalidTransition {
                generation: ticket.generation,
                found: self.phase,
            });
        }

        match result {
            Ok(page) => {
                let empty = page.items.is_empty();
                self.items.extend(page.items);
                self.pages_loaded += 1;
                if page.count.is_some() {
                    self.total_count = page.count;
                }

                let exhausted = page.next_cursor.is_none() || (empty && self.exhaust_on_empty_page);
                self.cursor = if exhausted { None } else { page.next_cursor };
                self.phase = if exhausted { Phase::Exhausted } else { Phase::Idle };
            }
            Err(err) => {
                self.last_error = Some(err);
                self.phase = Phase::Errored;
            }
        }

        Ok(Completion::Applied(self.status()))
    }

    /// Rebind to `endpoint`, dropping everything loaded so far.
    ///
    /// Any fetch still in flight becomes stale. Returns `None` only after
    /// destroy.
    pub fn reset(&mut self, endpoint: impl Into<String>, cursor: Option<Cursor>) -> Option<LoaderStatus> {
        if self.destroyed {
            return None;
        }

        self.endpoint = endpoint.into();
        self.items.clear();
        self.cursor = cursor;
        self.phase = Phase::Idle;
        self.last_error = None;
        self.pages_loaded = 0;
        self.total_count = None;
        self.generation = next_generation();

        Some(self.status())
    }

    /// Tear down: invalidate outstanding tickets and refuse further work.
    ///
    /// Returns false if already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }

        self.destroyed = true;
        self.generation = next_generation();
        if self.phase == Phase::Loading {
            self.phase = Phase::Idle;
        }
        true
    }
}
