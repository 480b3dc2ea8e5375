//! Page and cursor types for cursor-based collection endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying where the next page starts.
///
/// For the repository's REST API this is the absolute `next` URL of the
/// previous response, used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One batch of items plus the cursor for the batch after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` means no further pages exist.
    pub next_cursor: Option<Cursor>,
    /// Cursor of the preceding page, when the server reports one.
    pub previous_cursor: Option<Cursor>,
    /// Total size of the collection, when the server reports one.
    pub count: Option<u64>,
}

impl<T> Page<T> {
    /// A page with more pages after it.
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self {
            items,
            next_cursor,
            previous_cursor: None,
            count: None,
        }
    }

    /// The final page of a collection.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Wire envelope returned by paginated list endpoints.
///
/// ```json
/// { "count": 42, "next": "https://host/api/v0/assets/?page=2", "previous": null, "results": [...] }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageEnvelope<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> From<PageEnvelope<T>> for Page<T> {
    fn from(envelope: PageEnvelope<T>) -> Self {
        // Some endpoints send "" rather than null on the last page.
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty()).map(Cursor);
        Page {
            items: envelope.results,
            next_cursor: non_empty(envelope.next),
            previous_cursor: non_empty(envelope.previous),
            count: envelope.count,
        }
    }
}

/// What a page fetcher is asked to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Collection endpoint the loader is bound to.
    pub endpoint: String,
    /// `None` requests the first page.
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    pub fn first(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cursor: None,
        }
    }

    /// The location to GET: the cursor when present, otherwise the endpoint.
    pub fn target(&self) -> &str {
        match &self.cursor {
            Some(cursor) => cursor.as_str(),
            None => &self.endpoint,
        }
    }
}
