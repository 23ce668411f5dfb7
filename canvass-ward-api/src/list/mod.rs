use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use canvass_types::resources::Record;

use crate::snapshot::{CacheKey, SnapshotCache};
use crate::ward::ClientError;

pub mod projection;

mod tests;

pub use projection::{project, Filter, ListQuery, Page, ProjectedPage, Sort, SortDirection};

/// Failure of a load or mutation request, reduced to what the UI needs:
/// whether the backend was reached, and a human-readable message.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum LoadError {
    #[error("{message}")]
    Transport { message: String },
    #[error("{message}")]
    Backend { message: String },
}

impl <E> From<ClientError<E>> for LoadError
where
    E: Display
{
    fn from(cause: ClientError<E>) -> Self {
        match cause {
            ClientError::Transport(cause) => LoadError::Transport { message: cause.to_string() },
            ClientError::InvalidResponse(message) => LoadError::Backend { message },
            ClientError::UsageError(cause) => LoadError::Backend { message: cause.to_string() },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Transport,
    Backend,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

impl From<LoadError> for FailureInfo {
    fn from(cause: LoadError) -> Self {
        match cause {
            LoadError::Transport { message } => FailureInfo { kind: FailureKind::Transport, message },
            LoadError::Backend { message } => FailureInfo { kind: FailureKind::Backend, message },
        }
    }
}

/// Lifecycle state of one list page. Exactly one state is active per
/// controller at any time.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchState<R> {
    Idle,
    Loading,
    Success(Vec<R>),
    Failure(FailureInfo),
}

/// Retry behavior of the load sequence: total attempts and the fixed
/// pause between them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(400),
        }
    }
}

/// Seam between the controller and the typed WARD operations.
#[async_trait]
pub trait ResourceLoader<R>: Send + Sync {
    async fn load(&self) -> Result<Vec<R>, LoadError>;
}

/// Adapts a plain async closure into a `ResourceLoader`.
pub struct FnLoader<F>(pub F);

#[async_trait]
impl <R, F, Fut> ResourceLoader<R> for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<R>, LoadError>> + Send,
{
    async fn load(&self) -> Result<Vec<R>, LoadError> {
        (self.0)().await
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    StatusTransition,
}

/// A user action against one record. Destructive intents must be
/// explicitly confirmed before any request is sent.
#[derive(Clone, Debug)]
pub struct MutationIntent<I> {
    pub target: I,
    pub kind: MutationKind,
    pub destructive: bool,
    pub confirmed: bool,
}

impl <I> MutationIntent<I> {

    pub fn new(target: I, kind: MutationKind) -> Self {
        Self {
            target,
            kind,
            destructive: matches!(kind, MutationKind::Delete),
            confirmed: false,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }

    fn requires_confirmation(&self) -> bool {
        self.destructive
    }
}

#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum MutateError {
    #[error("This action discards data and requires explicit confirmation.")]
    ConfirmationRequired,
    #[error("Another action for <{target}> is still pending.")]
    AlreadyPending { target: String },
    #[error("{message}")]
    Transport { message: String },
    #[error("{message}")]
    Backend { message: String },
}

impl From<LoadError> for MutateError {
    fn from(cause: LoadError) -> Self {
        match cause {
            LoadError::Transport { message } => MutateError::Transport { message },
            LoadError::Backend { message } => MutateError::Backend { message },
        }
    }
}

/// Drives the fetch → cache → project → mutate lifecycle of one list page.
///
/// Loads are last-request-wins: starting a new load supersedes any load
/// still in flight, and a superseded response is discarded without a state
/// transition. Cheap to clone; clones share all state.
pub struct ListController<R>
where
    R: Record,
{
    inner: Arc<Inner<R>>,
}

impl <R> Clone for ListController<R>
where
    R: Record,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<R>
where
    R: Record,
{
    loader: Box<dyn ResourceLoader<R>>,
    cache: SnapshotCache,
    cache_key: CacheKey,
    policy: RetryPolicy,
    generation: AtomicU64,
    refreshing: AtomicUsize,
    state_tx: watch::Sender<FetchState<R>>,
    state_rx: watch::Receiver<FetchState<R>>,
    query: Mutex<ListQuery<R>>,
    pending_mutations: Mutex<HashSet<String>>,
    last_warning: Mutex<Option<FailureInfo>>,
}

impl <R> ListController<R>
where
    R: Record + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        loader: impl ResourceLoader<R> + 'static,
        cache: SnapshotCache,
        cache_key: CacheKey,
    ) -> Self {
        Self::with_policy(loader, cache, cache_key, RetryPolicy::default())
    }

    pub fn with_policy(
        loader: impl ResourceLoader<R> + 'static,
        cache: SnapshotCache,
        cache_key: CacheKey,
        policy: RetryPolicy,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(FetchState::Idle);
        Self {
            inner: Arc::new(Inner {
                loader: Box::new(loader),
                cache,
                cache_key,
                policy,
                generation: AtomicU64::new(0),
                refreshing: AtomicUsize::new(0),
                state_tx,
                state_rx,
                query: Mutex::new(ListQuery::default()),
                pending_mutations: Mutex::new(HashSet::new()),
                last_warning: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> FetchState<R> {
        self.inner.state_rx.borrow().clone()
    }

    /// Receiver the presentation layer watches for re-renders.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<R>> {
        self.inner.state_rx.clone()
    }

    /// True while any load sequence is between start and settle, including
    /// the phase where a provisional cached list is already shown.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshing.load(Ordering::SeqCst) > 0
    }

    /// Non-blocking warning from the last load that failed while stale
    /// cached data stayed on screen.
    pub fn last_warning(&self) -> Option<FailureInfo> {
        self.inner.last_warning.lock()
            .expect("last_warning lock poisoned")
            .clone()
    }

    /// Loads the list: paints a valid cached snapshot immediately if one
    /// exists, then fetches, retrying per policy, and reconciles.
    pub async fn load(&self) {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let _refresh_guard = RefreshGuard::arm(&inner.refreshing);

        let provisional = match inner.cache.read::<R>(&inner.cache_key) {
            Some(rows) => {
                self.publish(generation, FetchState::Success(rows));
                true
            }
            None => {
                self.publish(generation, FetchState::Loading);
                false
            }
        };

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match inner.loader.load().await {
                Ok(rows) => break Ok(rows),
                Err(cause) if attempt < inner.policy.max_attempts => {
                    if self.superseded(generation) {
                        return;
                    }
                    debug!("Loading <{key}> failed on attempt {attempt}, retrying in {backoff}ms: {cause}",
                        key = inner.cache_key, backoff = inner.policy.backoff.as_millis());
                    tokio::time::sleep(inner.policy.backoff).await;
                }
                Err(cause) => break Err(cause),
            }
        };

        if self.superseded(generation) {
            debug!("Discarding superseded response for <{key}>.", key = inner.cache_key);
            return;
        }

        match outcome {
            Ok(rows) => {
                inner.cache.write(&inner.cache_key, &rows);
                *inner.last_warning.lock().expect("last_warning lock poisoned") = None;
                self.publish(generation, FetchState::Success(rows));
            }
            Err(cause) => {
                let failure = FailureInfo::from(cause);
                if provisional {
                    warn!("Loading <{key}> failed, keeping the stale snapshot: {message}",
                        key = inner.cache_key, message = failure.message);
                    *inner.last_warning.lock().expect("last_warning lock poisoned") = Some(failure);
                } else {
                    self.publish(generation, FetchState::Failure(failure));
                }
            }
        }
    }

    /// Runs one mutation: optional optimistic patch, request, and either
    /// keep (success) or wholesale rollback to the pre-mutation snapshot
    /// (failure). Without an optimistic patch a success triggers a reload.
    pub async fn mutate<F, Fut>(
        &self,
        intent: MutationIntent<R::Id>,
        optimistic: Option<Box<dyn FnOnce(&mut Vec<R>) + Send>>,
        perform: F,
    ) -> Result<(), MutateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), LoadError>>,
    {
        if intent.requires_confirmation() && !intent.confirmed {
            return Err(MutateError::ConfirmationRequired);
        }

        let target = intent.target.to_string();
        let _pending_guard = PendingGuard::acquire(&self.inner.pending_mutations, target.clone())
            .ok_or(MutateError::AlreadyPending { target })?;

        debug!("Sending {kind:?} for <{target}>.", kind = intent.kind, target = intent.target);

        let snapshot = optimistic.and_then(|patch| {
            let mut snapshot = None;
            self.inner.state_tx.send_modify(|state| {
                if let FetchState::Success(rows) = state {
                    snapshot = Some(rows.clone());
                    patch(rows);
                }
            });
            snapshot
        });

        match perform().await {
            Ok(()) => {
                if snapshot.is_none() {
                    self.load().await;
                }
                Ok(())
            }
            Err(cause) => {
                if let Some(snapshot) = snapshot {
                    self.inner.state_tx.send_modify(|state| {
                        *state = FetchState::Success(snapshot);
                    });
                }
                Err(MutateError::from(cause))
            }
        }
    }

    /// The filtered, sorted and paginated view of the latest loaded rows.
    pub fn rows(&self) -> ProjectedPage<R> {
        let query = self.inner.query.lock()
            .expect("query lock poisoned")
            .clone();

        match &*self.inner.state_rx.borrow() {
            FetchState::Success(rows) => projection::project(rows, &query),
            _ => projection::project(&[], &query),
        }
    }

    pub fn query(&self) -> ListQuery<R> {
        self.inner.query.lock()
            .expect("query lock poisoned")
            .clone()
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let mut query = self.inner.query.lock().expect("query lock poisoned");
        query.search = search.into();
        query.page.index = 0;
    }

    pub fn set_filters(&self, filters: Vec<Filter<R>>) {
        let mut query = self.inner.query.lock().expect("query lock poisoned");
        query.filters = filters;
        query.page.index = 0;
    }

    pub fn set_sort(&self, sort: Option<Sort<R>>) {
        let mut query = self.inner.query.lock().expect("query lock poisoned");
        query.sort = sort;
    }

    pub fn set_page_index(&self, index: usize) {
        let mut query = self.inner.query.lock().expect("query lock poisoned");
        query.page.index = index;
    }

    pub fn set_page_size(&self, size: usize) {
        let mut query = self.inner.query.lock().expect("query lock poisoned");
        query.page.size = size.max(1);
        query.page.index = 0;
    }

    /// Reloads every `interval` without awaiting the previous load, so a
    /// slow response never stacks: the newer load supersedes it.
    ///
    /// Abort the returned handle when the page goes away.
    pub fn spawn_auto_refresh(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // the first tick completes immediately
            loop {
                ticker.tick().await;
                let controller = controller.clone();
                tokio::spawn(async move {
                    controller.load().await;
                });
            }
        })
    }

    fn publish(&self, generation: u64, state: FetchState<R>) {
        if self.superseded(generation) {
            return;
        }
        // Never fails while `state_rx` is held by `inner`.
        let _ = self.inner.state_tx.send(state);
    }

    fn superseded(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) != generation
    }
}

struct RefreshGuard<'a> {
    counter: &'a AtomicUsize,
}

impl <'a> RefreshGuard<'a> {
    fn arm(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

struct PendingGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl <'a> PendingGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, key: String) -> Option<Self> {
        let mut pending = set.lock().expect("pending mutation lock poisoned");
        if !pending.insert(key.clone()) {
            return None;
        }
        Some(Self { set, key })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.set.lock()
            .expect("pending mutation lock poisoned")
            .remove(&self.key);
    }
}
