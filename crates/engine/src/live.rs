//! Live query state machine
//!
//! A [`LiveQuery`] belongs to one consumer and tracks one descriptor at a
//! time. Observing a descriptor whose [`QueryKey`] differs from the current
//! one tears the old query down and starts the new one:
//!
//! ```text
//! Idle ──observe──► Loading ──snapshot──► Ready ──snapshot──► Ready ...
//!   │                  │                    │
//!   │ skip             └──────── error ─────┴──► Errored (terminal)
//!   ▼
//! Skipped
//! ```
//!
//! ## Commit guard
//!
//! Every start bumps a generation counter, and so does teardown. A worker
//! captures the generation it was started under and may only write state
//! while that generation is still current. The check and the write happen
//! under one lock, so once `teardown` returns no earlier worker can commit.
//!
//! The native listener registration lives in the same slot. Teardown takes
//! it out, and so does an errored commit, which means a failed query does
//! not keep its subscription open.
//!
//! ## Supersession
//!
//! The live worker formats one snapshot at a time. When a newer snapshot
//! arrives while an older one is still being formatted, the older future is
//! dropped before it can finish, so only the last-started pipeline commits.

use crate::executor::{QueryData, QueryExecutor};
use crate::resolve::ResolveOptions;
use crate::store::{ListenerRegistration, QueryPlan, Snapshot, SnapshotResult};
use catalog_core::{build_query_key, CatalogError, CatalogResult, QueryDescriptor, QueryKey};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Lifecycle phase of a live query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    /// Nothing observed yet
    #[default]
    Idle,
    /// Waiting for the first formatted result
    Loading,
    /// Data committed
    Ready,
    /// Failed; terminal for the current key
    Errored,
    /// The descriptor asked not to query at all
    Skipped,
}

/// State published to the consumer
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Current phase
    pub phase: QueryPhase,
    /// Last committed data; only set in [`QueryPhase::Ready`]
    pub data: Option<QueryData>,
    /// Failure that moved the query to [`QueryPhase::Errored`]
    pub error: Option<Arc<CatalogError>>,
}

impl QueryState {
    fn loading() -> Self {
        QueryState {
            phase: QueryPhase::Loading,
            ..Default::default()
        }
    }

    fn skipped() -> Self {
        QueryState {
            phase: QueryPhase::Skipped,
            ..Default::default()
        }
    }

    fn ready(data: QueryData) -> Self {
        QueryState {
            phase: QueryPhase::Ready,
            data: Some(data),
            error: None,
        }
    }

    fn errored(error: Arc<CatalogError>) -> Self {
        QueryState {
            phase: QueryPhase::Errored,
            data: None,
            error: Some(error),
        }
    }

    /// Idle counts as loading: a consumer that has not observed anything yet
    /// has no data to show either.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, QueryPhase::Idle | QueryPhase::Loading)
    }

    /// Whether the query failed
    pub fn is_errored(&self) -> bool {
        self.phase == QueryPhase::Errored
    }

    /// Committed data, if any
    pub fn data(&self) -> Option<&QueryData> {
        self.data.as_ref()
    }

    /// `(is_loading, is_errored, data)`
    pub fn as_tuple(&self) -> (bool, bool, Option<&QueryData>) {
        (self.is_loading(), self.is_errored(), self.data())
    }
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    revision: u64,
    registration: Option<ListenerRegistration>,
}

struct Shared {
    slot: Mutex<Slot>,
    state: watch::Sender<QueryState>,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Shared {
            slot: Mutex::new(Slot::default()),
            state,
        }
    }

    /// Invalidate every worker started so far and detach its listener
    fn advance(&self) -> u64 {
        let (generation, registration) = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            (slot.generation, slot.registration.take())
        };
        if let Some(mut registration) = registration {
            registration.remove();
        }
        generation
    }

    /// Hold `registration` for `generation`, or detach it right away if that
    /// generation is already gone
    fn attach(&self, generation: u64, mut registration: ListenerRegistration) {
        {
            let mut slot = self.slot.lock();
            if slot.generation == generation {
                slot.registration = Some(registration);
                return;
            }
        }
        registration.remove();
    }

    /// Detach the listener held for `generation`
    fn detach(&self, generation: u64) {
        let registration = {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                return;
            }
            slot.registration.take()
        };
        if let Some(mut registration) = registration {
            trace!(target: "catalog::live", generation, "Listener detached");
            registration.remove();
        }
    }

    /// Publish `state` if `generation` is still current
    fn commit(&self, generation: u64, state: QueryState) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            trace!(
                target: "catalog::live",
                stale = generation,
                current = slot.generation,
                "Dropped stale commit"
            );
            return false;
        }
        slot.revision += 1;
        self.state.send_replace(state);
        true
    }

    fn revision(&self) -> u64 {
        self.slot.lock().revision
    }
}

/// Commit an errored state. If the commit landed, detach the listener and
/// report the failure.
fn fail(shared: &Shared, executor: &QueryExecutor, generation: u64, error: CatalogError) {
    let error = Arc::new(error);
    if shared.commit(generation, QueryState::errored(Arc::clone(&error))) {
        shared.detach(generation);
        warn!(
            target: "catalog::live",
            kind = ?error.kind(),
            error = %error,
            "Live query failed"
        );
        executor.report(&error);
    }
}

// ============================================================================
// LiveQuery
// ============================================================================

/// Per-consumer live query
pub struct LiveQuery {
    executor: QueryExecutor,
    shared: Arc<Shared>,
    key: Option<QueryKey>,
    task: Option<JoinHandle<()>>,
}

impl LiveQuery {
    /// Create an idle query bound to `executor`
    pub fn new(executor: QueryExecutor) -> Self {
        LiveQuery {
            executor,
            shared: Arc::new(Shared::new()),
            key: None,
            task: None,
        }
    }

    /// Key of the descriptor currently observed
    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    /// Observe `descriptor`.
    ///
    /// Returns `false` when its key equals the current one, in which case the
    /// running query is left alone. Otherwise the previous query is torn down
    /// and a new one starts; this must be called inside a tokio runtime.
    pub fn observe(&mut self, descriptor: &QueryDescriptor) -> bool {
        let key = build_query_key(descriptor);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.teardown();
        debug!(target: "catalog::live", key = %key, "Observing query");
        self.key = Some(key);
        let generation = self.shared.advance();
        self.start(descriptor, generation);
        true
    }

    fn start(&mut self, descriptor: &QueryDescriptor, generation: u64) {
        let plan = match self.executor.plan(descriptor) {
            Ok(plan) => plan,
            Err(e) => return fail(&self.shared, &self.executor, generation, e),
        };
        if matches!(plan, QueryPlan::Skip) {
            self.shared.commit(generation, QueryState::skipped());
            return;
        }
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                let e = CatalogError::config(
                    "live queries must be observed inside a tokio runtime",
                );
                return fail(&self.shared, &self.executor, generation, e);
            }
        };
        self.shared.commit(generation, QueryState::loading());

        let worker = Worker {
            executor: self.executor.clone(),
            shared: Arc::clone(&self.shared),
            generation,
            options: self.executor.resolve_options(descriptor),
        };
        match plan.target().filter(|_| descriptor.live) {
            Some(target) => {
                let listener = match self.executor.store().listen(target) {
                    Ok(listener) => listener,
                    Err(e) => return fail(&self.shared, &self.executor, generation, e),
                };
                let (receiver, registration) = listener.into_parts();
                self.shared.attach(generation, registration);
                self.task = Some(runtime.spawn(worker.run_live(receiver)));
            }
            None => {
                self.task = Some(runtime.spawn(worker.run_once(plan)));
            }
        }
    }

    /// Stop the current query.
    ///
    /// Detaches the native listener, aborts the worker and invalidates any
    /// pending commit. Calling it again does nothing.
    pub fn teardown(&mut self) {
        self.shared.advance();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(key) = self.key.take() {
            debug!(target: "catalog::live", key = %key, "Query torn down");
        }
    }

    /// Current state
    pub fn state(&self) -> QueryState {
        self.shared.state.borrow().clone()
    }

    /// Receiver of state updates
    pub fn watch(&self) -> watch::Receiver<QueryState> {
        self.shared.state.subscribe()
    }

    /// Wait for the next committed state
    pub async fn changed(&self) -> QueryState {
        let mut receiver = self.watch();
        let _ = receiver.changed().await;
        let state = QueryState::clone(&receiver.borrow());
        state
    }

    /// Wait until the query is no longer loading.
    ///
    /// Never returns for a query that has not observed anything, nor for one
    /// torn down while still loading: teardown leaves the last committed
    /// state in place and nothing commits after it. Wrap the call in a
    /// timeout when either can happen.
    pub async fn settled(&self) -> QueryState {
        let mut receiver = self.watch();
        let state = match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => QueryState::clone(&state),
            Err(_) => self.state(),
        };
        state
    }

    /// Number of state commits so far
    pub fn revision(&self) -> u64 {
        self.shared.revision()
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("key", &self.key)
            .field("phase", &self.shared.state.borrow().phase)
            .field("revision", &self.revision())
            .finish()
    }
}

// ============================================================================
// Worker
// ============================================================================

type Formatting = BoxFuture<'static, CatalogResult<QueryData>>;

struct Worker {
    executor: QueryExecutor,
    shared: Arc<Shared>,
    generation: u64,
    options: ResolveOptions,
}

impl Worker {
    async fn run_once(self, plan: QueryPlan) {
        let result = match self.executor.fetch(&plan).await {
            Ok(Some(snapshot)) => self.format(snapshot).await,
            Ok(None) => {
                self.shared.commit(self.generation, QueryState::skipped());
                return;
            }
            Err(e) => Err(e),
        };
        self.settle(result);
    }

    async fn run_live(self, mut receiver: mpsc::UnboundedReceiver<SnapshotResult>) {
        let mut in_flight: Option<Formatting> = None;
        loop {
            tokio::select! {
                biased;
                next = receiver.recv() => match next {
                    Some(Ok(snapshot)) => {
                        if in_flight.is_some() {
                            trace!(target: "catalog::live", "Superseded in-flight snapshot");
                        }
                        in_flight = Some(self.format(snapshot));
                    }
                    Some(Err(e)) => {
                        fail(&self.shared, &self.executor, self.generation, e);
                        return;
                    }
                    None => {
                        if let Some(pending) = in_flight.take() {
                            self.settle(pending.await);
                        }
                        debug!(target: "catalog::live", "Listener closed");
                        return;
                    }
                },
                result = pending_or(&mut in_flight) => {
                    in_flight = None;
                    if !self.settle(result) {
                        return;
                    }
                }
            }
        }
    }

    fn format(&self, snapshot: Snapshot) -> Formatting {
        let executor = self.executor.clone();
        let options = self.options.clone();
        async move { executor.format_snapshot(snapshot, &options).await }.boxed()
    }

    /// Commit a formatting result; returns whether the worker should go on
    fn settle(&self, result: CatalogResult<QueryData>) -> bool {
        match result {
            Ok(data) => {
                trace!(target: "catalog::live", records = data.len(), "Snapshot formatted");
                self.shared.commit(self.generation, QueryState::ready(data));
                true
            }
            Err(e) => {
                fail(&self.shared, &self.executor, self.generation, e);
                false
            }
        }
    }
}

/// Await the in-flight formatting future, or never resolve if there is none
async fn pending_or(slot: &mut Option<Formatting>) -> CatalogResult<QueryData> {
    match slot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}
