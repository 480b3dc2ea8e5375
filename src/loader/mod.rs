//! Incremental paginated collection loader.
//!
//! - [`state`]: the pure cursor state machine
//! - [`handle`]: the async driver views talk to

pub mod handle;
pub mod state;

pub use handle::{Loader, Subscription};
pub use state::{Completion, CursorMachine, FetchTicket, Generation, LoaderStatus, Phase};
