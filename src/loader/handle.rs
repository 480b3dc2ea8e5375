//! Loader handle: drives a [`CursorMachine`] against a [`PageFetcher`].
//!
//! This is the contract views and scroll triggers use. Calls return as soon
//! as the transition is recorded; the fetch itself runs as a tokio task and
//! its result is fed back into the machine when it arrives. Status changes
//! are pushed to subscribers in the order they happen.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::state::{Completion, CursorMachine, FetchTicket, LoaderStatus, Phase};
use crate::config::LoaderConfig;
use crate::error::FetchError;
use crate::traits::PageFetcher;

/// Receives a [`LoaderStatus`] after every effective transition.
///
/// The channel closes when the loader is destroyed or dropped.
pub type Subscription = mpsc::UnboundedReceiver<LoaderStatus>;

struct Inner<T> {
    machine: CursorMachine<T>,
    subscribers: Vec<mpsc::UnboundedSender<LoaderStatus>>,
    inflight: Option<JoinHandle<()>>,
}

impl<T> Inner<T> {
    fn notify(&mut self, status: &LoaderStatus) {
        self.subscribers.retain(|tx| tx.send(status.clone()).is_ok());
    }

    fn cancel_inflight(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

type Shared<T> = Mutex<Inner<T>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, Inner<T>> {
    // A panicking subscriber callback must not wedge the loader.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Incremental loader for one collection endpoint.
///
/// Must be used from within a tokio runtime. Dropping the loader destroys
/// it, cancelling any fetch in flight.
///
/// # Example
///
/// ```ignore
/// use curator::fetcher::{FetcherConfig, HttpPageFetcher};
/// use curator::loader::Loader;
///
/// let fetcher = HttpPageFetcher::from_config(FetcherConfig::default())?;
/// let loader: Loader<serde_json::Value, _> =
///     Loader::new("https://repo.example.com/api/v0/assets/", fetcher);
/// let mut changes = loader.subscribe();
/// loader.request_next_page();
/// while let Some(status) = changes.recv().await {
///     if status.is_settled() {
///         break;
///     }
/// }
/// ```
pub struct Loader<T, F> {
    shared: Arc<Shared<T>>,
    fetcher: Arc<F>,
    page_limit: Option<usize>,
}

impl<T, F> Loader<T, F>
where
    T: Send + 'static,
    F: PageFetcher<T> + 'static,
{
    /// Create a loader bound to `endpoint`, positioned before the first page.
    pub fn new(endpoint: impl Into<String>, fetcher: F) -> Self {
        Self::from_machine(CursorMachine::new(endpoint), fetcher, None)
    }

    /// Create a loader using the exhaustion and page-limit settings of `config`.
    pub fn with_config(endpoint: impl Into<String>, fetcher: F, config: &LoaderConfig) -> Self {
        let machine =
            CursorMachine::new(endpoint).with_exhaust_on_empty_page(config.exhaust_on_empty_page);
        Self::from_machine(machine, fetcher, config.page_limit)
    }

    fn from_machine(machine: CursorMachine<T>, fetcher: F, page_limit: Option<usize>) -> Self {
        tracing::debug!(
            endpoint = machine.endpoint(),
            generation = machine.generation(),
            "Loader created"
        );
        Self {
            shared: Arc::new(Mutex::new(Inner {
                machine,
                subscribers: Vec::new(),
                inflight: None,
            })),
            fetcher: Arc::new(fetcher),
            page_limit,
        }
    }

    /// Request the next page.
    ///
    /// Returns false (and notifies nobody) when a fetch is already in flight,
    /// the collection is exhausted, or the loader was destroyed.
    pub fn request_next_page(&self) -> bool {
        let mut inner = lock(&self.shared);
        let ticket = inner.machine.request_next_page();
        self.start(&mut inner, ticket)
    }

    /// Re-issue the failed request. Only has an effect in `Errored`.
    pub fn retry(&self) -> bool {
        let mut inner = lock(&self.shared);
        let ticket = inner.machine.retry();
        self.start(&mut inner, ticket)
    }

    /// Rebind to a different endpoint, discarding loaded items.
    ///
    /// A fetch in flight for the previous binding is cancelled and, if its
    /// result still arrives, ignored.
    pub fn reset(&self, endpoint: impl Into<String>) -> bool {
        let mut inner = lock(&self.shared);
        let Some(status) = inner.machine.reset(endpoint, None) else {
            return false;
        };
        inner.cancel_inflight();
        tracing::debug!(
            endpoint = %status.endpoint,
            generation = status.generation,
            "Loader reset"
        );
        inner.notify(&status);
        true
    }

    /// Tear the loader down: cancel in-flight work and close subscriptions.
    pub fn destroy(&self) {
        let mut inner = lock(&self.shared);
        if !inner.machine.destroy() {
            return;
        }
        inner.cancel_inflight();
        let status = inner.machine.status();
        tracing::debug!(endpoint = %status.endpoint, "Loader destroyed");
        inner.notify(&status);
        inner.subscribers.clear();
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.shared);
        if !inner.machine.is_destroyed() {
            inner.subscribers.push(tx);
        }
        rx
    }

    /// Invoke `on_change` for every status change until the loader is torn down.
    pub fn on_change<C>(&self, on_change: C) -> JoinHandle<()>
    where
        C: Fn(&LoaderStatus) + Send + 'static,
    {
        let mut changes = self.subscribe();
        tokio::spawn(async move {
            while let Some(status) = changes.recv().await {
                on_change(&status);
            }
        })
    }

    pub fn status(&self) -> LoaderStatus {
        lock(&self.shared).machine.status()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.shared).machine.phase()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        lock(&self.shared).machine.last_error().cloned()
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.shared).machine.is_destroyed()
    }

    /// Borrow the loaded items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(lock(&self.shared).machine.items())
    }

    /// Request the next page and wait for that request to settle.
    ///
    /// Returns the current status straight away when nothing can be requested.
    pub async fn load_next_page(&self) -> LoaderStatus {
        let changes = self.subscribe();
        let started = self.request_next_page();
        self.wait_settled(started, changes).await
    }

    /// Retry the failed request and wait for it to settle.
    pub async fn retry_page(&self) -> LoaderStatus {
        let changes = self.subscribe();
        let started = self.retry();
        self.wait_settled(started, changes).await
    }

    async fn wait_settled(&self, started: bool, mut changes: Subscription) -> LoaderStatus {
        if !started {
            return self.status();
        }
        let generation = self.status().generation;
        while let Some(status) = changes.recv().await {
            if status.generation != generation || status.is_settled() {
                return status;
            }
        }
        self.status()
    }

    /// Keep loading until the collection is exhausted, a fetch fails, or
    /// `max_pages` pages (falling back to the configured page limit) have
    /// been loaded by this call.
    pub async fn load_all(&self, max_pages: Option<usize>) -> LoaderStatus {
        let limit = max_pages.or(self.page_limit);
        let mut loaded = 0usize;

        loop {
            if limit.is_some_and(|limit| loaded >= limit) {
                return self.status();
            }
            let status = self.load_next_page().await;
            if status.phase != Phase::Idle || status.destroyed {
                return status;
            }
            loaded += 1;
        }
    }

    /// Record the transition and spawn the fetch for `ticket`, if any.
    fn start(&self, inner: &mut Inner<T>, ticket: Option<FetchTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        tracing::debug!(
            target_url = ticket.request.target(),
            generation = ticket.generation,
            "Requesting page"
        );
        let status = inner.machine.status();
        inner.notify(&status);

        let shared = Arc::downgrade(&self.shared);
        let fetcher = Arc::clone(&self.fetcher);
        inner.inflight = Some(tokio::spawn(async move {
            let result = fetcher.as_ref().fetch_page(&ticket.request).await;
            finish(shared, ticket, result);
        }));
        true
    }
}

impl<T: Clone, F> Loader<T, F> {
    /// Clone out every loaded item.
    pub fn items(&self) -> Vec<T> {
        lock(&self.shared).machine.items().to_vec()
    }

    /// Clone out the items loaded at or after `offset`.
    pub fn items_from(&self, offset: usize) -> Vec<T> {
        let inner = lock(&self.shared);
        inner.machine.items().get(offset..).map(<[T]>::to_vec).unwrap_or_default()
    }
}

impl<T, F> Drop for Loader<T, F> {
    fn drop(&mut self) {
        let mut inner = lock(&self.shared);
        if inner.machine.destroy() {
            inner.cancel_inflight();
            inner.subscribers.clear();
        }
    }
}

/// Feed a fetch result back into the loader that issued `ticket`.
fn finish<T>(
    shared: Weak<Shared<T>>,
    ticket: FetchTicket,
    result: Result<crate::models::Page<T>, FetchError>,
) {
    let Some(shared) = shared.upgrade() else {
        tracing::debug!(generation = ticket.generation, "Loader dropped before page arrived");
        return;
    };

    let mut inner = lock(&shared);
    if let Err(err) = &result {
        tracing::warn!(
            target_url = ticket.request.target(),
            error_code = err.error_code(),
            "Page fetch failed: {}",
            err
        );
    }

    match inner.machine.complete(&ticket, result) {
        Ok(Completion::Applied(status)) => {
            inner.inflight = None;
            tracing::debug!(
                phase = %status.phase,
                items = status.item_count,
                "Page applied"
            );
            inner.notify(&status);
        }
        Ok(Completion::Stale) => {
            tracing::debug!(
                generation = ticket.generation,
                current = inner.machine.generation(),
                "Ignoring completion from superseded fetch"
            );
        }
        Err(err) => {
            tracing::error!(error_code = err.error_code(), "{}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{ManualFetcher, ScriptedFetcher};
    use crate::models::{Cursor, Page};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(items: &[&str], next: Option<&str>) -> Page<String> {
        Page::new(
            items.iter().map(|s| s.to_string()).collect(),
            next.map(Cursor::new),
        )
    }

    async fn settle(changes: &mut Subscription) -> LoaderStatus {
        loop {
            let status = changes.recv().await.expect("subscription closed");
            if status.is_settled() {
                return status;
            }
        }
    }

    #[tokio::test]
    async fn test_request_returns_after_recording_loading() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());
        let mut changes = loader.subscribe();

        assert!(loader.request_next_page());
        assert_eq!(loader.phase(), Phase::Loading);
        assert_eq!(changes.recv().await.unwrap().phase, Phase::Loading);

        let pending = fetcher.next_pending().await;
        assert_eq!(pending.request.cursor, None);
        assert!(pending.respond(Ok(page(&["a"], Some("p2")))));

        let status = settle(&mut changes).await;
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(loader.items(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_requests_while_loading_issue_one_fetch() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        assert!(loader.request_next_page());
        assert!(!loader.request_next_page());
        assert!(!loader.request_next_page());

        let pending = fetcher.next_pending().await;
        let mut changes = loader.subscribe();
        pending.respond(Ok(page(&["a"], None)));
        settle(&mut changes).await;

        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(loader.phase(), Phase::Exhausted);
    }

    #[tokio::test]
    async fn test_no_notification_for_noops() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(&["a"], None))]);
        let loader = Loader::new("/api/v0/assets/", fetcher);
        loader.load_next_page().await;

        let mut changes = loader.subscribe();
        assert!(!loader.request_next_page());
        assert!(!loader.retry());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_scenario_two_pages_to_exhaustion() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&["a", "b"], Some("p2"))),
            Ok(page(&["c"], None)),
        ]);
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        loader.load_next_page().await;
        let status = loader.load_next_page().await;

        assert_eq!(status.phase, Phase::Exhausted);
        assert_eq!(loader.items(), vec!["a", "b", "c"]);
        let cursors: Vec<_> = fetcher.requests().into_iter().map(|r| r.cursor).collect();
        assert_eq!(cursors, vec![None, Some(Cursor::new("p2"))]);

        let again = loader.load_next_page().await;
        assert_eq!(again.phase, Phase::Exhausted);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_server_error_then_retry() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(FetchError::Server {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
            Ok(page(&["a"], None)),
        ]);
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        let status = loader.load_next_page().await;
        assert_eq!(status.phase, Phase::Errored);
        assert_eq!(status.item_count, 0);
        assert!(matches!(
            loader.last_error(),
            Some(FetchError::Server { status: 503, .. })
        ));

        let status = loader.retry_page().await;
        assert_eq!(status.phase, Phase::Exhausted);
        assert_eq!(loader.items(), vec!["a"]);
        assert!(loader.last_error().is_none());

        let requests = fetcher.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_scenario_reset_mid_loading() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        loader.request_next_page();
        let old = fetcher.next_pending().await;

        assert!(loader.reset("/api/v0/assets/?selected_facets=kind:video"));
        assert_eq!(loader.phase(), Phase::Idle);

        // The old task was aborted; even if the response gets through it must not apply.
        old.respond(Ok(page(&["stale"], Some("p2"))));
        tokio::task::yield_now().await;
        assert!(loader.items().is_empty());
        assert_eq!(loader.phase(), Phase::Idle);

        loader.request_next_page();
        let fresh = fetcher.next_pending().await;
        assert_eq!(fresh.request.endpoint, "/api/v0/assets/?selected_facets=kind:video");
        assert_eq!(fresh.request.cursor, None);
    }

    #[tokio::test]
    async fn test_stale_completion_after_reset_emits_nothing() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        loader.request_next_page();
        let old = fetcher.next_pending().await;
        let old_ticket = FetchTicket {
            generation: loader.status().generation,
            request: old.request.clone(),
        };

        let mut changes = loader.subscribe();
        assert!(loader.reset("/api/v0/assets/?selected_facets=kind:video"));

        // Deliver the superseded result as if the aborted task had already
        // finished its fetch.
        old.respond(Ok(page(&["stale"], Some("p2"))));
        finish(
            Arc::downgrade(&loader.shared),
            old_ticket,
            Ok(page(&["stale"], Some("p2"))),
        );
        tokio::task::yield_now().await;

        let status = changes.recv().await.unwrap();
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.endpoint, "/api/v0/assets/?selected_facets=kind:video");
        assert!(changes.try_recv().is_err());
        assert!(loader.items().is_empty());
        assert_eq!(loader.status().pages_loaded, 0);
    }

    #[tokio::test]
    async fn test_stale_completion_after_destroy_emits_nothing() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());

        loader.request_next_page();
        let pending = fetcher.next_pending().await;
        let ticket = FetchTicket {
            generation: loader.status().generation,
            request: pending.request.clone(),
        };
        let mut changes = loader.subscribe();
        loader.destroy();

        finish(Arc::downgrade(&loader.shared), ticket, Ok(page(&["late"], None)));

        assert!(changes.recv().await.unwrap().destroyed);
        assert!(changes.recv().await.is_none());
        assert!(loader.items().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_while_loading_ignores_late_completion() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());
        let mut changes = loader.subscribe();

        loader.request_next_page();
        let pending = fetcher.next_pending().await;
        let before = loader.status();

        loader.destroy();
        pending.respond(Ok(page(&["late"], None)));
        tokio::task::yield_now().await;

        let after = loader.status();
        assert!(after.destroyed);
        assert_eq!(after.item_count, before.item_count);
        assert_ne!(after.phase, Phase::Loading);
        assert!(!loader.request_next_page());
        assert!(!loader.reset("/elsewhere/"));

        // Loading, then the destroyed status, then the channel closes.
        assert_eq!(changes.recv().await.unwrap().phase, Phase::Loading);
        assert!(changes.recv().await.unwrap().destroyed);
        assert!(changes.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_inflight_fetch() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher.clone());
        let mut changes = loader.subscribe();
        loader.request_next_page();
        let pending = fetcher.next_pending().await;

        drop(loader);
        pending.respond(Ok(page(&["late"], None)));
        tokio::task::yield_now().await;
        assert_eq!(changes.recv().await.unwrap().phase, Phase::Loading);
        assert!(changes.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_on_change_sees_every_transition() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(&["a"], Some("p2"))), Ok(page(&["b"], None))]);
        let loader = Loader::new("/api/v0/assets/", fetcher);
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let watcher = loader.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        loader.load_all(None).await;
        loader.destroy();
        watcher.await.unwrap();

        // Two requests and two completions, then the destroyed status.
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_load_all_respects_page_limit() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&["a"], Some("p2"))),
            Ok(page(&["b"], Some("p3"))),
            Ok(page(&["c"], Some("p4"))),
        ]);
        let config = LoaderConfig::default().with_page_limit(2);
        let loader = Loader::with_config("/api/v0/assets/", fetcher.clone(), &config);

        let status = loader.load_all(None).await;
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.pages_loaded, 2);
        assert_eq!(loader.items_from(1), vec!["b"]);

        let status = loader.load_all(Some(1)).await;
        assert_eq!(status.pages_loaded, 3);
    }

    #[tokio::test]
    async fn test_load_all_stops_on_error() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&["a"], Some("p2"))),
            Err(FetchError::Parse {
                message: "missing field `results`".to_string(),
            }),
        ]);
        let loader = Loader::new("/api/v0/assets/", fetcher);

        let status = loader.load_all(None).await;
        assert_eq!(status.phase, Phase::Errored);
        assert_eq!(loader.with_items(|items| items.len()), 1);
        assert_eq!(loader.status().cursor, Some(Cursor::new("p2")));
    }

    #[tokio::test]
    async fn test_subscribe_after_destroy_is_closed() {
        let fetcher: ManualFetcher<String> = ManualFetcher::new();
        let loader = Loader::new("/api/v0/assets/", fetcher);
        loader.destroy();
        let mut changes = loader.subscribe();
        assert!(changes.recv().await.is_none());
        assert!(loader.is_destroyed());
    }
}
