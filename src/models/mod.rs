//! Data types shared by the loader, fetchers and views.

pub mod page;

pub use page::{Cursor, Page, PageEnvelope, PageRequest};
