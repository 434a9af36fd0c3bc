//! Debounced live search with a single rate-limit retry
//!
//! [`LiveSearch`] backs one search box. Every [`LiveSearch::update`] cancels
//! whatever the previous term was doing (debounce, request or pending retry)
//! and starts over, so at most one request is in flight per controller and
//! stale responses never reach the published state.

use crate::client::{ClientError, FetchClient};
use crate::types::{ProductType, ProductTypeQuery};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_millis(2000);

pub const RATE_LIMITED_MESSAGE: &str = "Demasiadas solicitudes. Reintentando en unos segundos...";
pub const SEARCH_FAILED_MESSAGE: &str = "No se pudieron cargar los resultados. Intentalo nuevamente.";

/// Timing of a [`LiveSearch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Quiet period after the last keystroke
    pub debounce: Duration,
    /// Wait before the single retry of a 429
    pub retry_delay: Duration,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            debounce: SEARCH_DEBOUNCE,
            retry_delay: RATE_LIMIT_RETRY_DELAY,
        }
    }
}

/// User-facing notice attached to a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchNotice {
    /// Throttled; a retry is pending
    RateLimited,
    /// Gave up
    Failed,
}

impl SearchNotice {
    pub fn message(self) -> &'static str {
        match self {
            Self::RateLimited => RATE_LIMITED_MESSAGE,
            Self::Failed => SEARCH_FAILED_MESSAGE,
        }
    }
}

/// Snapshot published after every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState<T> {
    /// Term the state refers to
    pub term: String,
    pub loading: bool,
    pub results: Vec<T>,
    pub notice: Option<SearchNotice>,
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            term: String::new(),
            loading: false,
            results: Vec::new(),
            notice: None,
        }
    }
}

type Fetcher<T> =
    Arc<dyn Fn(String, CancellationToken) -> BoxFuture<'static, Result<Vec<T>, ClientError>> + Send + Sync>;

struct InFlight {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Live search controller
///
/// Must be driven from inside a tokio runtime. Dropping it aborts any work
/// still pending.
pub struct LiveSearch<T> {
    fetcher: Fetcher<T>,
    policy: SearchPolicy,
    state: Arc<watch::Sender<SearchState<T>>>,
    current: Mutex<Option<InFlight>>,
}

impl<T> LiveSearch<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller around `fetcher`
    ///
    /// The fetcher receives the term and a cancellation token it should pass
    /// on to the client so superseded requests are torn down.
    pub fn new<F, Fut>(policy: SearchPolicy, fetcher: F) -> Self
    where
        F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ClientError>> + Send + 'static,
    {
        let fetcher: Fetcher<T> = Arc::new(move |term, cancel| fetcher(term, cancel).boxed());
        let (state, _) = watch::channel(SearchState::default());
        Self {
            fetcher,
            policy,
            state: Arc::new(state),
            current: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState<T> {
        self.state.borrow().clone()
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }

    /// Search for `term`, superseding any earlier term
    pub fn update(&self, term: impl Into<String>) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_search(
            term.into(),
            Arc::clone(&self.fetcher),
            self.policy,
            Arc::clone(&self.state),
            cancel.clone(),
        ));
        *current = Some(InFlight { cancel, task });
    }

    /// Abort pending work; the last published state is kept
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel.cancel();
        }
        self.state
            .send_if_modified(|state| std::mem::replace(&mut state.loading, false));
    }
}

impl LiveSearch<ProductType> {
    /// Live search over the product type catalogue
    pub fn product_types(client: FetchClient, policy: SearchPolicy) -> Self {
        Self::new(policy, move |term, cancel| {
            let client = client.clone();
            async move {
                client
                    .list_product_types(&ProductTypeQuery::search(term), Some(cancel))
                    .await
                    .map(|page| page.results)
            }
        })
    }
}

impl<T> Drop for LiveSearch<T> {
    fn drop(&mut self) {
        let current = self
            .current
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(in_flight) = current.take() {
            in_flight.cancel.cancel();
            in_flight.task.abort();
        }
    }
}

/// Sleep unless cancelled first; returns whether the sleep completed
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

async fn run_search<T>(
    term: String,
    fetcher: Fetcher<T>,
    policy: SearchPolicy,
    state: Arc<watch::Sender<SearchState<T>>>,
    cancel: CancellationToken,
) where
    T: Clone + Send + Sync + 'static,
{
    if !pause(policy.debounce, &cancel).await {
        return;
    }

    state.send_modify(|s| {
        s.term.clone_from(&term);
        s.loading = true;
        s.notice = None;
    });
    debug!(%term, "Searching");

    let mut outcome = fetcher(term.clone(), cancel.clone()).await;

    if matches!(&outcome, Err(e) if e.is_rate_limited()) && !cancel.is_cancelled() {
        debug!(%term, delay_ms = policy.retry_delay.as_millis(), "Rate limited, retrying once");
        state.send_modify(|s| s.notice = Some(SearchNotice::RateLimited));
        if !pause(policy.retry_delay, &cancel).await {
            return;
        }
        outcome = fetcher(term.clone(), cancel.clone()).await;
    }

    if cancel.is_cancelled() {
        return;
    }

    match outcome {
        Ok(results) => state.send_modify(|s| {
            s.results = results;
            s.loading = false;
            s.notice = None;
        }),
        Err(e) if e.is_aborted() => {}
        Err(e) => {
            warn!(%term, error = %e, "Search failed");
            state.send_modify(|s| {
                s.loading = false;
                s.notice = Some(SearchNotice::Failed);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = SearchPolicy::default();
        assert_eq!(policy.debounce, Duration::from_millis(300));
        assert_eq!(policy.retry_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(SearchNotice::RateLimited.message(), RATE_LIMITED_MESSAGE);
        assert_eq!(SearchNotice::Failed.message(), SEARCH_FAILED_MESSAGE);
    }
}
