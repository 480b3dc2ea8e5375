//! Curator - incremental loading of cursor-paginated collections
//!
//! A [`loader::Loader`] is bound to one collection endpoint and walks it a
//! page at a time, following the opaque `next` cursor returned with each
//! page. Fetching goes through the [`traits::PageFetcher`] seam; the
//! production fetcher speaks the `{results, next, previous, count}` JSON
//! envelope over HTTP.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod facets;
pub mod fetcher;
pub mod loader;
pub mod models;
pub mod traits;
