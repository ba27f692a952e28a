//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub use catalog::{
    Catalog, CatalogConfig, CollectingReporter, Document, ErrorKind, FilterOp, InMemoryStore,
    LiveQuery, QueryData, QueryDescriptor, QueryPhase, QueryState, Reference, StoreTimestamp,
    Value,
};

/// Upper bound for anything a test awaits
pub const WAIT: Duration = Duration::from_secs(5);

/// Timestamp every seeded record was created at
pub const CREATED_AT: StoreTimestamp = StoreTimestamp {
    seconds: 1_700_000_000,
    nanoseconds: 0,
};

// ============================================================================
// TestCatalog
// ============================================================================

/// Catalog over an in-memory store with a collecting reporter
pub struct TestCatalog {
    pub store: InMemoryStore,
    pub reporter: Arc<CollectingReporter>,
    pub catalog: Catalog,
}

impl TestCatalog {
    /// Empty store
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let reporter = Arc::new(CollectingReporter::new());
        let catalog = Catalog::builder()
            .store(store.clone())
            .reporter(reporter.clone())
            .build()
            .expect("catalog builds");
        TestCatalog {
            store,
            reporter,
            catalog,
        }
    }

    /// Store holding the standard assets/users fixture
    pub fn seeded() -> Self {
        let test = Self::new();
        seed(&test.store);
        test
    }

    pub fn live_query(&self) -> LiveQuery {
        self.catalog.live_query()
    }
}

/// Users `u1`, `u2`; approved assets `a1` (created by `u1`) and `a2`; an
/// unapproved asset `a3`.
pub fn seed(store: &InMemoryStore) {
    put(
        store,
        "users",
        "u1",
        json!({ "username": "ada", "createdAt": CREATED_AT.to_json() }),
    );
    put(
        store,
        "users",
        "u2",
        json!({ "username": "grace", "createdAt": CREATED_AT.to_json() }),
    );
    put(
        store,
        "assets",
        "a1",
        json!({
            "title": "Fox",
            "isApproved": true,
            "createdAt": CREATED_AT.to_json(),
            "createdBy": Reference::new("users", "u1").to_json(),
        }),
    );
    put(
        store,
        "assets",
        "a2",
        json!({
            "title": "Owl",
            "isApproved": true,
            "createdAt": CREATED_AT.to_json(),
        }),
    );
    put(
        store,
        "assets",
        "a3",
        json!({
            "title": "Draft",
            "isApproved": false,
            "createdAt": CREATED_AT.to_json(),
        }),
    );
}

/// Write a JSON document
pub fn put(store: &InMemoryStore, collection: &str, id: &str, body: serde_json::Value) {
    store
        .set_json(&Reference::new(collection, id), &body)
        .expect("fixture body is an object");
}

/// Descriptor for approved assets
pub fn approved_assets() -> QueryDescriptor {
    QueryDescriptor::new("assets").filter("isApproved", FilterOp::Eq, true)
}

/// Await `query` settling, failing the test after [`WAIT`]
pub async fn settle(query: &LiveQuery) -> QueryState {
    tokio::time::timeout(WAIT, query.settled())
        .await
        .expect("query settles in time")
}

/// Await the first state matching `predicate`
pub async fn wait_until(query: &LiveQuery, predicate: impl Fn(&QueryState) -> bool) -> QueryState {
    let mut receiver = query.watch();
    tokio::time::timeout(WAIT, async {
        let state = receiver
            .wait_for(|s| predicate(s))
            .await
            .expect("query alive");
        QueryState::clone(&state)
    })
    .await
    .expect("state reached in time")
}

/// Records of a settled collection result
pub fn records(state: &QueryState) -> Vec<Document> {
    state
        .data()
        .and_then(QueryData::as_many)
        .map(<[Document]>::to_vec)
        .unwrap_or_default()
}
