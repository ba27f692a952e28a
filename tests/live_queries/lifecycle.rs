//! Loading, live updates and key changes

use crate::common::*;
use chrono::{TimeZone, Utc};
use serde_json::json;

#[tokio::test]
async fn approved_assets_are_formatted() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    assert!(query.observe(&approved_assets()));

    let state = settle(&query).await;
    let (is_loading, is_errored, data) = state.as_tuple();
    assert!(!is_loading);
    assert!(!is_errored);
    assert!(data.is_some());

    let docs = records(&state);
    assert_eq!(docs.len(), 2);
    let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    for doc in &docs {
        let at = doc.get("createdAt").and_then(Value::as_date);
        assert_eq!(at, Some(created), "{} createdAt", doc.id);
        assert_eq!(at.map(|d| d.timestamp_millis()), Some(1_700_000_000_000));
    }

    let fox = docs.iter().find(|d| d.id == "a1").unwrap();
    let creator = fox.get("createdBy").unwrap();
    assert_eq!(creator.get("id"), Some(&Value::from("u1")));
    assert_eq!(creator.get("username"), Some(&Value::from("ada")));
    assert_eq!(creator.get("refPath"), Some(&Value::from("users/u1")));
    assert!(creator.get("createdAt").unwrap().is_date());
}

#[tokio::test]
async fn skipped_query_never_reaches_the_store() {
    let test = TestCatalog::seeded();
    let calls = test.store.call_count();
    let mut query = test.live_query();
    query.observe(&QueryDescriptor::new("assets").skip());

    let state = query.state();
    assert_eq!(state.phase, QueryPhase::Skipped);
    assert_eq!(state.as_tuple(), (false, false, None));
    assert_eq!(test.store.call_count(), calls);
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn writes_are_pushed_to_observers() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;

    put(
        &test.store,
        "assets",
        "a4",
        json!({ "title": "Lynx", "isApproved": true }),
    );
    let state = wait_until(&query, |s| records(s).len() == 3).await;
    assert_eq!(state.phase, QueryPhase::Ready);

    test.store.delete(&Reference::new("assets", "a1"));
    wait_until(&query, |s| records(s).len() == 2).await;
}

#[tokio::test]
async fn identical_descriptor_keeps_subscription() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;
    let revision = query.revision();
    let calls = test.store.call_count();

    assert!(!query.observe(&approved_assets()));
    assert_eq!(query.revision(), revision);
    assert_eq!(test.store.call_count(), calls);
    assert_eq!(test.store.listener_count(), 1);
}

#[tokio::test]
async fn key_change_resubscribes() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;
    let first_key = query.key().cloned();

    let drafts = QueryDescriptor::new("assets").filter("isApproved", FilterOp::Eq, false);
    assert!(query.observe(&drafts));
    assert_ne!(query.key().cloned(), first_key);
    assert_eq!(test.store.listener_count(), 1);

    let state = settle(&query).await;
    let docs = records(&state);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "a3");
}

#[tokio::test]
async fn flipping_live_flag_resubscribes() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&approved_assets());
    settle(&query).await;
    assert_eq!(test.store.listener_count(), 1);

    assert!(query.observe(&approved_assets().live(false)));
    settle(&query).await;
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn by_id_tracks_single_record() {
    let test = TestCatalog::seeded();
    let mut query = test.live_query();
    query.observe(&QueryDescriptor::new("assets").by_id("a1"));

    let state = settle(&query).await;
    let doc = state.data().and_then(QueryData::as_one).unwrap();
    assert_eq!(doc.id, "a1");
    assert_eq!(
        doc.get("createdBy").and_then(|c| c.get("username")),
        Some(&Value::from("ada"))
    );

    test.store.delete(&Reference::new("assets", "a1"));
    let state = wait_until(&query, |s| s.data() == Some(&QueryData::One(None))).await;
    assert!(!state.is_loading());
}

#[tokio::test]
async fn absent_id_and_empty_list_differ_in_shape() {
    let test = TestCatalog::seeded();

    let mut missing = test.live_query();
    missing.observe(&QueryDescriptor::new("assets").by_id("nope"));
    let state = settle(&missing).await;
    assert_eq!(state.data(), Some(&QueryData::One(None)));

    let mut empty = test.live_query();
    empty.observe(&QueryDescriptor::new("assets").filter("title", FilterOp::Eq, "Unicorn"));
    let state = settle(&empty).await;
    assert_eq!(state.data(), Some(&QueryData::Many(vec![])));

    assert!(!missing.state().is_loading());
    assert!(!empty.state().is_loading());
}
