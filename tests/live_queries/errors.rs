//! Failures move the query to a terminal errored state, reported once

use crate::common::*;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn listener_transport_error() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;

    test.store.break_listeners("assets", "connection reset");
    let state = wait_until(&query, QueryState::is_errored).await;
    assert_eq!(state.as_tuple(), (false, true, None));
    assert_eq!(
        state.error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::Transport)
    );
    assert_eq!(test.reporter.kinds(), vec![ErrorKind::Transport]);

    // Terminal: later writes change nothing and the listener is gone.
    let revision = query.revision();
    put(&test.store, "assets", "a4", json!({ "isApproved": true }));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(query.revision(), revision);
    assert_eq!(test.reporter.count(), 1);
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn resolution_error_fails_whole_result() {
    let test = TestCatalog::seeded();
    test.store.fail_collection("users");

    let mut query = test.live_query();
    query.observe(&approved_assets());
    let state = settle(&query).await;

    assert!(state.is_errored());
    assert!(state.data().is_none());
    assert_eq!(test.reporter.kinds(), vec![ErrorKind::Resolution]);
    let message = &test.reporter.messages()[0];
    assert!(message.contains("users/u1"), "{message}");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn construction_error_is_immediate() {
    let test = TestCatalog::seeded();
    let calls = test.store.call_count();
    let mut query = test.live_query();
    query.observe(&QueryDescriptor::new("assets").filter("tags", FilterOp::In, "fox"));

    let state = query.state();
    assert!(state.is_errored());
    assert_eq!(test.reporter.kinds(), vec![ErrorKind::Construction]);
    assert_eq!(test.store.call_count(), calls);
}

#[tokio::test]
async fn store_outage_when_subscribing() {
    let test = TestCatalog::seeded();
    test.store.fail_collection("assets");
    let mut query = test.live_query();
    query.observe(&approved_assets());

    assert!(query.state().is_errored());
    assert_eq!(test.reporter.kinds(), vec![ErrorKind::Transport]);
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn key_change_recovers_from_error() {
    let test = TestCatalog::seeded();
    test.store.fail_collection("users");
    let mut query = test.live_query();
    query.observe(&approved_assets());
    assert!(settle(&query).await.is_errored());

    test.store.heal_collection("users");
    query.observe(&approved_assets().limit(5));
    let state = settle(&query).await;
    assert_eq!(records(&state).len(), 2);
    assert_eq!(test.reporter.count(), 1);
}
