//! Arrays of references and the legacy parent shape

use crate::common::*;
use serde_json::json;

#[tokio::test]
async fn array_elements_resolved_in_order() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "collections",
        "c1",
        json!({
            "items": [
                Reference::new("assets", "a1").to_json(),
                "plain",
                Reference::new("assets", "a2").to_json(),
            ],
        }),
    );

    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("collections").by_id("c1"))
        .await
        .unwrap()
        .unwrap();
    let items = data
        .as_one()
        .unwrap()
        .get("items")
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].get("id"), Some(&Value::from("a1")));
    assert!(items[0].get("createdAt").unwrap().is_date());
    // Shallow: the element's own reference is left alone.
    assert!(items[0].get("createdBy").unwrap().as_reference().is_some());

    assert_eq!(items[1], Value::from("plain"));
    assert_eq!(items[2].get("title"), Some(&Value::from("Owl")));
}

#[tokio::test]
async fn legacy_parent_is_resolved() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "comments",
        "k1",
        json!({
            "text": "nice",
            "history": { "parent": Reference::new("assets", "a2").to_json(), "edits": 2 },
        }),
    );

    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("comments").by_id("k1"))
        .await
        .unwrap()
        .unwrap();
    let history = data.as_one().unwrap().get("history").unwrap();
    assert_eq!(
        history.get("parent").and_then(|p| p.get("title")),
        Some(&Value::from("Owl"))
    );
    assert_eq!(history.get("edits"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn array_mapping_ignores_expand_flag() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "collections",
        "c2",
        json!({ "items": [Reference::new("assets", "a2").to_json()] }),
    );
    let data = test
        .catalog
        .run_query(
            &QueryDescriptor::new("collections")
                .by_id("c2")
                .expand_references(false),
        )
        .await
        .unwrap()
        .unwrap();
    let items = data
        .as_one()
        .unwrap()
        .get("items")
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(items[0].get("id"), Some(&Value::from("a2")));
}
