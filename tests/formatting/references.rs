//! Reference expansion and cycle termination

use crate::common::*;
use catalog::CONFIG_FILE_NAME;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn cycle_expands_one_level() {
    let test = TestCatalog::seeded();
    // u1 points back at the asset that points at u1.
    put(
        &test.store,
        "users",
        "u1",
        json!({ "username": "ada", "favorite": Reference::new("assets", "a1").to_json() }),
    );

    let calls = test.store.call_count();
    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("assets").by_id("a1"))
        .await
        .unwrap()
        .unwrap();
    let creator = data.as_one().unwrap().get("createdBy").unwrap();
    assert_eq!(creator.get("username"), Some(&Value::from("ada")));
    assert_eq!(
        creator.get("favorite"),
        Some(&Value::Reference(Reference::new("assets", "a1")))
    );
    // The lookup plus one reference fetch.
    assert_eq!(test.store.call_count() - calls, 2);
}

#[tokio::test]
async fn nested_payload_resolved_one_hop() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "notifications",
        "n1",
        json!({
            "subject": Reference::new("assets", "a2").to_json(),
            "payload": {
                "author": Reference::new("users", "u2").to_json(),
                "message": "liked your asset",
            },
        }),
    );

    // Top-level expansion off; declared nested objects are still resolved.
    let descriptor = QueryDescriptor::new("notifications")
        .by_id("n1")
        .expand_references(false);
    let data = test.catalog.run_query(&descriptor).await.unwrap().unwrap();
    let doc = data.as_one().unwrap();

    assert!(doc.get("subject").unwrap().as_reference().is_some());
    let author = doc.get("payload").and_then(|p| p.get("author")).unwrap();
    assert_eq!(author.get("username"), Some(&Value::from("grace")));
    assert!(author.get("createdAt").unwrap().is_date());
}

#[tokio::test]
async fn descriptor_nested_fields_override_config() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "amendments",
        "m1",
        json!({
            "diff": { "createdBy": Reference::new("users", "u1").to_json() },
            "payload": { "author": Reference::new("users", "u2").to_json() },
        }),
    );

    let descriptor = QueryDescriptor::new("amendments")
        .by_id("m1")
        .nested_field("diff");
    let data = test.catalog.run_query(&descriptor).await.unwrap().unwrap();
    let doc = data.as_one().unwrap();

    let diff_creator = doc.get("diff").and_then(|d| d.get("createdBy")).unwrap();
    assert_eq!(diff_creator.get("id"), Some(&Value::from("u1")));
    let payload_author = doc.get("payload").and_then(|p| p.get("author")).unwrap();
    assert!(payload_author.as_reference().is_some());
}

#[tokio::test]
async fn dangling_reference_inlines_pointer() {
    let test = TestCatalog::seeded();
    put(
        &test.store,
        "assets",
        "a9",
        json!({ "createdBy": Reference::new("users", "ghost").to_json() }),
    );
    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("assets").by_id("a9"))
        .await
        .unwrap()
        .unwrap();
    let creator = data.as_one().unwrap().get("createdBy").unwrap();
    assert_eq!(creator.get("id"), Some(&Value::from("ghost")));
    assert_eq!(creator.get("refPath"), Some(&Value::from("users/ghost")));
    assert!(creator.get("username").is_none());
}

#[tokio::test]
async fn inlined_document_parent_stays_raw() {
    let test = TestCatalog::seeded();
    // u1 carries the legacy parent shape pointing back at a1.
    put(
        &test.store,
        "users",
        "u1",
        json!({ "username": "ada", "parent": Reference::new("assets", "a1").to_json() }),
    );

    let calls = test.store.call_count();
    let data = test
        .catalog
        .run_query(&QueryDescriptor::new("assets").by_id("a1"))
        .await
        .unwrap()
        .unwrap();
    let creator = data.as_one().unwrap().get("createdBy").unwrap();
    assert_eq!(creator.get("username"), Some(&Value::from("ada")));
    assert_eq!(
        creator.get("parent"),
        Some(&Value::Reference(Reference::new("assets", "a1")))
    );
    assert_eq!(test.store.call_count() - calls, 2);
}

#[tokio::test]
async fn nested_fields_come_from_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "nested_fields = [\"diff\"]\n",
    )
    .unwrap();

    let store = InMemoryStore::new();
    seed(&store);
    put(
        &store,
        "amendments",
        "m1",
        json!({
            "diff": { "createdBy": Reference::new("users", "u1").to_json() },
            "payload": { "author": Reference::new("users", "u2").to_json() },
        }),
    );
    let catalog = Catalog::builder()
        .store(store)
        .reporter(Arc::new(CollectingReporter::new()))
        .config_dir(dir.path())
        .build()
        .unwrap();
    assert_eq!(catalog.config().nested_fields, vec!["diff".to_string()]);

    let data = catalog
        .run_query(&QueryDescriptor::new("amendments").by_id("m1"))
        .await
        .unwrap()
        .unwrap();
    let doc = data.as_one().unwrap();
    let diff_creator = doc.get("diff").and_then(|d| d.get("createdBy")).unwrap();
    assert_eq!(diff_creator.get("username"), Some(&Value::from("ada")));
    let payload_author = doc.get("payload").and_then(|p| p.get("author")).unwrap();
    assert!(payload_author.as_reference().is_some());
}
