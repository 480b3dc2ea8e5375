//! Page fetcher trait.
//!
//! The fetcher is the only I/O boundary of the loader. It must be
//! stateless between calls: the cursor state machine is the single source
//! of truth for where the collection stands.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Page, PageRequest};

/// Loads one page of a cursor-based collection.
///
/// Each call resolves exactly once, to either a page or an error. Calls
/// for the same request are idempotent and have no client-side effects.
///
/// # Example
///
/// ```ignore
/// use curator::models::PageRequest;
/// use curator::traits::PageFetcher;
///
/// async fn first_page<F: PageFetcher<serde_json::Value>>(fetcher: &F) {
///     let page = fetcher.fetch_page(&PageRequest::first("/api/v0/assets/")).await;
///     println!("{:?}", page.map(|p| p.items.len()));
/// }
/// ```
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, FetchError>;
}

#[async_trait]
impl<T, F> PageFetcher<T> for std::sync::Arc<F>
where
    T: Send + 'static,
    F: PageFetcher<T> + ?Sized,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, FetchError> {
        (**self).fetch_page(request).await
    }
}
