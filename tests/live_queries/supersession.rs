//! Only the last-started formatting pass commits

use crate::common::*;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn slow_snapshot_is_superseded() {
    let test = TestCatalog::seeded();
    let creator = Reference::new("users", "u1");
    test.store.delay_document(&creator, Duration::from_millis(300));

    let mut query = test.live_query();
    query.observe(&approved_assets());
    tokio::time::sleep(Duration::from_millis(50)).await;

    test.store.clear_delay(&creator);
    put(
        &test.store,
        "assets",
        "a4",
        json!({ "title": "Lynx", "isApproved": true }),
    );

    let state = settle(&query).await;
    assert_eq!(records(&state).len(), 3);

    // Past the point where the first pass would have finished.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(query.revision(), 2);
    assert_eq!(records(&query.state()).len(), 3);
}

#[tokio::test]
async fn stale_key_never_overwrites_new_key() {
    let test = TestCatalog::seeded();
    test.store
        .delay_document(&Reference::new("users", "u1"), Duration::from_millis(200));

    let mut query = test.live_query();
    query.observe(&approved_assets());
    let drafts = QueryDescriptor::new("assets").filter("isApproved", FilterOp::Eq, false);
    query.observe(&drafts);

    let state = settle(&query).await;
    assert_eq!(records(&state).len(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let docs = records(&query.state());
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "a3");
}
