//! One-shot query results

use crate::common::*;

#[tokio::test]
async fn approved_assets_once() {
    let test = TestCatalog::seeded();
    let data = test
        .catalog
        .run_query(&approved_assets())
        .await
        .unwrap()
        .unwrap();
    let docs = data.as_many().unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.get("createdAt").unwrap().is_date()));
    assert_eq!(test.store.listener_count(), 0);
}

#[tokio::test]
async fn skip_returns_none_without_calls() {
    let test = TestCatalog::seeded();
    let calls = test.store.call_count();
    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("assets").skip())
        .await
        .unwrap();
    assert!(data.is_none());
    assert_eq!(test.store.call_count(), calls);
}

#[tokio::test]
async fn ordering_limit_and_cursor() {
    let test = TestCatalog::seeded();
    let by_title = QueryDescriptor::new("assets")
        .order_by("title", catalog::Direction::Asc)
        .limit(2);
    let data = test.catalog.run_query(&by_title).await.unwrap().unwrap();
    let titles: Vec<_> = data
        .as_many()
        .unwrap()
        .iter()
        .map(|d| d.get("title").and_then(Value::as_str).unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Draft", "Fox"]);

    let next = by_title.start_after(catalog::Cursor::after("a1"));
    let data = test.catalog.run_query(&next).await.unwrap().unwrap();
    let ids: Vec<_> = data
        .as_many()
        .unwrap()
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(ids, vec!["a2"]);
}

#[tokio::test]
async fn unexpanded_references_stay_raw() {
    let test = TestCatalog::seeded();
    let descriptor = QueryDescriptor::new("assets")
        .by_id("a1")
        .expand_references(false);
    let data = test.catalog.run_query(&descriptor).await.unwrap().unwrap();
    let doc = data.as_one().unwrap();
    assert_eq!(
        doc.get("createdBy"),
        Some(&Value::Reference(Reference::new("users", "u1")))
    );
    assert!(doc.get("createdAt").unwrap().is_date());
}

#[tokio::test]
async fn failures_are_returned_and_reported() {
    let test = TestCatalog::seeded();
    test.store.fail_collection("assets");
    let err = test.catalog.run_query(&approved_assets()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(test.reporter.kinds(), vec![ErrorKind::Transport]);
}
