//! Document store interface
//!
//! The read layer talks to the hosted document database through the
//! [`DocumentStore`] trait. A store answers three kinds of request:
//! - `get`: direct lookup of one document
//! - `query`: one-shot evaluation of a [`NativeQuery`]
//! - `listen`: push-based subscription delivering a [`Snapshot`] on
//!   registration and again after every change to the target
//!
//! The store handle is shared by every query in the process (`Arc<dyn
//! DocumentStore>`), so implementations must be `Send + Sync` and serialize
//! their own I/O.
//!
//! ## Listener lifecycle
//!
//! `listen` returns a [`Listener`]: a receiver of snapshots plus a
//! [`ListenerRegistration`]. Removing the registration detaches the native
//! listener exactly once; it is idempotent and also runs on drop.

pub mod memory;
pub mod translate;

pub use memory::InMemoryStore;
pub use translate::{NativeQuery, QueryLimits, QueryPlan};

use async_trait::async_trait;
use catalog_core::{CatalogResult, Document, Reference};
use tokio::sync::mpsc;

/// What a listener watches
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget {
    /// A single document
    Document(Reference),
    /// The result set of a query
    Query(NativeQuery),
}

impl ListenTarget {
    /// Collection the target lives in
    pub fn collection(&self) -> &str {
        match self {
            ListenTarget::Document(reference) => reference.collection(),
            ListenTarget::Query(query) => &query.collection,
        }
    }
}

/// Raw result delivered by a store
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Result of a document lookup; `None` when the document does not exist
    One(Option<Document>),
    /// Result of a query, in query order
    Many(Vec<Document>),
}

/// Item type carried by listener channels
pub type SnapshotResult = CatalogResult<Snapshot>;

// ============================================================================
// Listener registration
// ============================================================================

/// Handle that detaches a native listener
///
/// `remove` runs the detach closure at most once.
pub struct ListenerRegistration {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerRegistration {
    /// Registration that runs `detach` on removal
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        ListenerRegistration {
            detach: Some(Box::new(detach)),
        }
    }

    /// Registration with nothing to detach
    pub fn noop() -> Self {
        ListenerRegistration { detach: None }
    }

    /// Detach the listener; later calls do nothing
    pub fn remove(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Whether `remove` has not run yet
    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A live listener: snapshot receiver plus its registration
#[derive(Debug)]
pub struct Listener {
    receiver: mpsc::UnboundedReceiver<SnapshotResult>,
    registration: ListenerRegistration,
}

impl Listener {
    /// Assemble a listener
    pub fn new(
        receiver: mpsc::UnboundedReceiver<SnapshotResult>,
        registration: ListenerRegistration,
    ) -> Self {
        Listener {
            receiver,
            registration,
        }
    }

    /// Next snapshot, or `None` once the store has dropped the listener
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.receiver.recv().await
    }

    /// Split into receiver and registration so they can be owned separately
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<SnapshotResult>,
        ListenerRegistration,
    ) {
        (self.receiver, self.registration)
    }
}

// ============================================================================
// Store trait
// ============================================================================

/// Native document store client
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    async fn get(&self, reference: &Reference) -> CatalogResult<Option<Document>>;

    /// Evaluate a query once
    async fn query(&self, query: &NativeQuery) -> CatalogResult<Vec<Document>>;

    /// Attach a push listener; the current snapshot is delivered immediately
    fn listen(&self, target: ListenTarget) -> CatalogResult<Listener>;
}
