//! Nothing commits once a query is torn down

use crate::common::*;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn no_writes_after_teardown() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;

    query.teardown();
    let revision = query.revision();
    assert_eq!(test.store.listener_count(), 0);

    put(&test.store, "assets", "a4", json!({ "isApproved": true }));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(query.revision(), revision);
    assert_eq!(records(&query.state()).len(), 2);
}

#[tokio::test]
async fn teardown_before_first_snapshot_commits_nothing() {
    let test = TestCatalog::seeded();
    test.store
        .delay_document(&Reference::new("users", "u1"), Duration::from_millis(50));
    let mut query = test.live_query();
    query.observe(&approved_assets());
    assert_eq!(query.revision(), 1);

    query.teardown();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(query.revision(), 1);
    assert!(query.state().is_loading());
}

#[tokio::test]
async fn teardown_is_idempotent() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    query.teardown();
    query.teardown();
    assert_eq!(test.store.listener_count(), 0);
    assert!(query.key().is_none());
}

#[tokio::test]
async fn observe_after_teardown_restarts() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;
    query.teardown();

    assert!(query.observe(&approved_assets()));
    let state = settle(&query).await;
    assert_eq!(records(&state).len(), 2);
    assert_eq!(test.store.listener_count(), 1);
}

#[tokio::test]
async fn dropping_the_query_detaches() {
    let test = TestCatalog::seeded();
    {
        let mut query = test.live_query();
        query.observe(&approved_assets());
        settle(&query).await;
        assert_eq!(test.store.listener_count(), 1);
    }
    assert_eq!(test.store.listener_count(), 0);
}
