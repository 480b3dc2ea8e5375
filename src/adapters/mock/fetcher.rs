//! Test doubles for [`PageFetcher`].
//!
//! - [`ScriptedFetcher`] answers immediately from a queue of results.
//! - [`ManualFetcher`] parks every request until the test answers it, which
//!   makes interleavings such as "reset while a fetch is in flight"
//!   deterministic.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use crate::error::FetchError;
use crate::models::{Page, PageRequest};
use crate::traits::PageFetcher;

type PageResult<T> = Result<Page<T>, FetchError>;

/// Answers requests in order from a fixed script.
///
/// Once the script runs out every request fails with a network error.
#[derive(Debug)]
pub struct ScriptedFetcher<T> {
    script: Arc<Mutex<VecDeque<PageResult<T>>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl<T> Clone for ScriptedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            requests: Arc::clone(&self.requests),
        }
    }
}

impl<T> ScriptedFetcher<T> {
    pub fn new(script: Vec<PageResult<T>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append another result to the script.
    pub fn push(&self, result: PageResult<T>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl<T: Send + 'static> PageFetcher<T> for ScriptedFetcher<T> {
    async fn fetch_page(&self, request: &PageRequest) -> PageResult<T> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(FetchError::Network {
                url: request.target().to_string(),
                message: "script exhausted".to_string(),
            })
        })
    }
}

/// A request parked inside a [`ManualFetcher`], waiting for an answer.
#[derive(Debug)]
pub struct PendingFetch<T> {
    pub request: PageRequest,
    responder: oneshot::Sender<PageResult<T>>,
}

impl<T> PendingFetch<T> {
    /// Resolve the fetch. Returns false if the requester is gone (the task
    /// was aborted or the loader dropped).
    pub fn respond(self, result: PageResult<T>) -> bool {
        self.responder.send(result).is_ok()
    }
}

#[derive(Debug)]
struct ManualState<T> {
    pending: VecDeque<PendingFetch<T>>,
    requests: Vec<PageRequest>,
}

/// Fetcher whose requests complete only when the test says so.
#[derive(Debug)]
pub struct ManualFetcher<T> {
    state: Arc<Mutex<ManualState<T>>>,
    arrived: Arc<Notify>,
}

impl<T> Clone for ManualFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            arrived: Arc::clone(&self.arrived),
        }
    }
}

impl<T> Default for ManualFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ManualFetcher<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                pending: VecDeque::new(),
                requests: Vec::new(),
            })),
            arrived: Arc::new(Notify::new()),
        }
    }

    /// Wait for the next parked request.
    pub async fn next_pending(&self) -> PendingFetch<T> {
        loop {
            if let Some(pending) = self.try_next_pending() {
                return pending;
            }
            self.arrived.notified().await;
        }
    }

    pub fn try_next_pending(&self) -> Option<PendingFetch<T>> {
        self.state.lock().unwrap().pending.pop_front()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl<T: Send + 'static> PageFetcher<T> for ManualFetcher<T> {
    async fn fetch_page(&self, request: &PageRequest) -> PageResult<T> {
        let (responder, answer) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.pending.push_back(PendingFetch {
                request: request.clone(),
                responder,
            });
        }
        self.arrived.notify_one();

        answer.await.unwrap_or_else(|_| {
            Err(FetchError::Network {
                url: request.target().to_string(),
                message: "pending fetch dropped without an answer".to_string(),
            })
        })
    }
}
