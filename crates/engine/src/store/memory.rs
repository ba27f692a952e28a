//! In-process document store
//!
//! [`InMemoryStore`] implements [`DocumentStore`] over a map of collections.
//! Writes push fresh snapshots to every listener watching the written
//! collection. It also exposes hooks used by tests and embedders:
//! - `call_count`: number of client calls (`get`, `query`, `listen`)
//! - `fail_collection` / `heal_collection`: make calls on a collection fail
//! - `break_listeners`: deliver a transport error to live listeners
//! - `delay_document`: slow down `get` for one document
//!
//! ## Thread Safety
//!
//! The handle is cheap to clone and `Send + Sync`. Collection data sits behind
//! a `parking_lot::RwLock`; listeners live in a `DashMap`. No lock is held
//! across an await. Listener channels are unbounded, so notifying never
//! blocks a writer.

use super::translate::NativeQuery;
use super::{DocumentStore, ListenTarget, Listener, ListenerRegistration, Snapshot, SnapshotResult};
use async_trait::async_trait;
use catalog_core::{
    CatalogError, CatalogResult, Direction, Document, Fields, FilterClause, FilterOp, Reference,
    Value,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

struct ListenerEntry {
    target: ListenTarget,
    sender: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct Inner {
    collections: RwLock<Collections>,
    listeners: DashMap<u64, ListenerEntry>,
    next_listener_id: AtomicU64,
    calls: AtomicU64,
    failing: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<Reference, Duration>>,
}

/// In-memory document store with push listeners
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create or replace a document
    pub fn set(&self, reference: &Reference, fields: Fields) {
        {
            let mut collections = self.inner.collections.write();
            collections
                .entry(reference.collection().to_string())
                .or_default()
                .insert(reference.id().to_string(), fields);
        }
        trace!(target: "catalog::store", reference = %reference, "Document set");
        self.notify(reference.collection());
    }

    /// Create or replace a document from a JSON object
    pub fn set_json(&self, reference: &Reference, json: &serde_json::Value) -> CatalogResult<()> {
        let doc = Document::from_json(reference.collection(), reference.id(), json)?;
        self.set(reference, doc.fields);
        Ok(())
    }

    /// Merge fields into a document, creating it if missing
    pub fn merge(&self, reference: &Reference, fields: Fields) {
        {
            let mut collections = self.inner.collections.write();
            let existing = collections
                .entry(reference.collection().to_string())
                .or_default()
                .entry(reference.id().to_string())
                .or_default();
            existing.extend(fields);
        }
        trace!(target: "catalog::store", reference = %reference, "Document merged");
        self.notify(reference.collection());
    }

    /// Insert a document under a generated id
    pub fn add(&self, collection: &str, fields: Fields) -> Reference {
        let reference = Reference::new(collection, uuid::Uuid::new_v4().simple().to_string());
        self.set(&reference, fields);
        reference
    }

    /// Delete a document; returns whether it existed
    pub fn delete(&self, reference: &Reference) -> bool {
        let removed = {
            let mut collections = self.inner.collections.write();
            collections
                .get_mut(reference.collection())
                .and_then(|docs| docs.remove(reference.id()))
                .is_some()
        };
        if removed {
            trace!(target: "catalog::store", reference = %reference, "Document deleted");
            self.notify(reference.collection());
        }
        removed
    }

    // =========================================================================
    // Inspection and fault injection
    // =========================================================================

    /// Number of `get`, `query` and `listen` calls received
    pub fn call_count(&self) -> u64 {
        self.inner.calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Make every call touching `collection` fail with a transport error
    pub fn fail_collection(&self, collection: &str) {
        self.inner.failing.write().insert(collection.to_string());
    }

    /// Undo [`fail_collection`](Self::fail_collection)
    pub fn heal_collection(&self, collection: &str) {
        self.inner.failing.write().remove(collection);
    }

    /// Deliver a transport error to every listener on `collection`
    pub fn break_listeners(&self, collection: &str, message: &str) {
        for entry in self.inner.listeners.iter() {
            if entry.target.collection() == collection {
                let _ = entry
                    .sender
                    .send(Err(CatalogError::transport(message.to_string())));
            }
        }
    }

    /// Delay every `get` of `reference`
    pub fn delay_document(&self, reference: &Reference, delay: Duration) {
        self.inner.delays.write().insert(reference.clone(), delay);
    }

    /// Remove a delay set by [`delay_document`](Self::delay_document)
    pub fn clear_delay(&self, reference: &Reference) {
        self.inner.delays.write().remove(reference);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin_call(&self, collection: &str) -> CatalogResult<()> {
        self.inner.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.inner.failing.read().contains(collection) {
            return Err(CatalogError::transport(format!(
                "collection '{}' is unavailable",
                collection
            )));
        }
        Ok(())
    }

    fn notify(&self, collection: &str) {
        let collections = self.inner.collections.read();
        let mut closed = Vec::new();
        for entry in self.inner.listeners.iter() {
            if entry.target.collection() != collection {
                continue;
            }
            let snapshot = snapshot_in(&collections, &entry.target);
            if entry.sender.send(snapshot).is_err() {
                closed.push(*entry.key());
            }
        }
        drop(collections);
        for id in closed {
            self.inner.listeners.remove(&id);
        }
    }
}

fn detach(inner: &Weak<Inner>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        if inner.listeners.remove(&id).is_some() {
            debug!(target: "catalog::store", listener = id, "Listener detached");
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, reference: &Reference) -> CatalogResult<Option<Document>> {
        self.begin_call(reference.collection())?;
        let delay = self.inner.delays.read().get(reference).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(lookup_in(&self.inner.collections.read(), reference))
    }

    async fn query(&self, query: &NativeQuery) -> CatalogResult<Vec<Document>> {
        self.begin_call(&query.collection)?;
        evaluate_in(&self.inner.collections.read(), query)
    }

    fn listen(&self, target: ListenTarget) -> CatalogResult<Listener> {
        self.begin_call(target.collection())?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.inner.next_listener_id.fetch_add(1, AtomicOrdering::SeqCst);
        {
            // Snapshot and register under one read guard so no write slips between them.
            let collections = self.inner.collections.read();
            let _ = sender.send(snapshot_in(&collections, &target));
            debug!(
                target: "catalog::store",
                listener = id,
                collection = target.collection(),
                "Listener attached"
            );
            self.inner.listeners.insert(id, ListenerEntry { target, sender });
        }

        let weak = Arc::downgrade(&self.inner);
        Ok(Listener::new(
            receiver,
            ListenerRegistration::new(move || detach(&weak, id)),
        ))
    }
}

// ============================================================================
// Query evaluation
// ============================================================================

fn lookup_in(collections: &Collections, reference: &Reference) -> Option<Document> {
    collections
        .get(reference.collection())
        .and_then(|docs| docs.get(reference.id()))
        .map(|fields| Document::new(reference.collection(), reference.id(), fields.clone()))
}

fn evaluate_in(collections: &Collections, query: &NativeQuery) -> CatalogResult<Vec<Document>> {
    let Some(docs) = collections.get(&query.collection) else {
        return Ok(Vec::new());
    };

    let mut matched: Vec<Document> = docs
        .iter()
        .filter(|(_, fields)| query.clauses.iter().all(|c| clause_matches(c, fields)))
        .filter(|(_, fields)| match &query.order_by {
            Some(order) => lookup_field(fields, &order.field).is_some(),
            None => true,
        })
        .map(|(id, fields)| Document::new(query.collection.clone(), id.clone(), fields.clone()))
        .collect();
    matched.sort_by(|a, b| compare_documents(query, a, b));

    if let Some(after_id) = &query.start_after {
        let cursor_fields = docs.get(after_id).ok_or_else(|| {
            CatalogError::construction(format!(
                "cursor document '{}/{}' not found",
                query.collection, after_id
            ))
        })?;
        let cursor = Document::new(
            query.collection.clone(),
            after_id.clone(),
            cursor_fields.clone(),
        );
        matched.retain(|doc| compare_documents(query, doc, &cursor) == Ordering::Greater);
    }
    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    Ok(matched)
}

fn snapshot_in(collections: &Collections, target: &ListenTarget) -> SnapshotResult {
    match target {
        ListenTarget::Document(reference) => Ok(Snapshot::One(lookup_in(collections, reference))),
        ListenTarget::Query(query) => evaluate_in(collections, query).map(Snapshot::Many),
    }
}

/// Resolve a dotted field path inside a field map
fn lookup_field<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn clause_matches(clause: &FilterClause, fields: &Fields) -> bool {
    let Some(actual) = lookup_field(fields, &clause.field) else {
        return false;
    };
    let expected = &clause.value;
    let candidates = || expected.as_array().unwrap_or_default();
    match clause.op {
        FilterOp::Eq => actual.query_eq(expected),
        FilterOp::Ne => !actual.query_eq(expected),
        FilterOp::Lt => actual.query_cmp(expected) == Some(Ordering::Less),
        FilterOp::Le => matches!(
            actual.query_cmp(expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOp::Gt => actual.query_cmp(expected) == Some(Ordering::Greater),
        FilterOp::Ge => matches!(
            actual.query_cmp(expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::ArrayContains => actual
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item.query_eq(expected))),
        FilterOp::ArrayContainsAny => actual.as_array().is_some_and(|items| {
            items
                .iter()
                .any(|item| candidates().iter().any(|c| item.query_eq(c)))
        }),
        FilterOp::In => candidates().iter().any(|c| actual.query_eq(c)),
        FilterOp::NotIn => !candidates().iter().any(|c| actual.query_eq(c)),
    }
}

fn compare_documents(query: &NativeQuery, a: &Document, b: &Document) -> Ordering {
    let by_field = match &query.order_by {
        Some(order) => {
            let left = lookup_field(&a.fields, &order.field);
            let right = lookup_field(&b.fields, &order.field);
            let ord = match (left, right) {
                (Some(x), Some(y)) => x.query_cmp(y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
        None => Ordering::Equal,
    };
    by_field.then_with(|| a.id.cmp(&b.id))
}
