// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for the SQLite document store backend.

use serde_json::json;

use appdeck_store::{AllDocsParams, DocumentStore, Replication, SqliteDocumentStore, StoreError};
use appdeck_types::ids;

async fn store() -> SqliteDocumentStore {
    SqliteDocumentStore::in_memory()
        .await
        .expect("in-memory store")
}

#[tokio::test]
async fn test_put_get_round_trip() {
    let store = store().await;
    let ns = "app_dev_one";

    let result = store
        .put(ns, json!({"_id": "table_1", "name": "People"}))
        .await
        .unwrap();
    assert_eq!(result.id, "table_1");
    assert!(result.rev.starts_with("1-"));

    let doc = store.get(ns, "table_1").await.unwrap();
    assert_eq!(doc["name"], json!("People"));
    assert_eq!(doc["_rev"], json!(result.rev));
}

#[tokio::test]
async fn test_put_with_stale_rev_conflicts() {
    let store = store().await;
    let ns = "app_dev_one";

    let first = store
        .put(ns, json!({"_id": "table_1", "name": "People"}))
        .await
        .unwrap();

    // update with the current rev succeeds and bumps the generation
    let second = store
        .put(
            ns,
            json!({"_id": "table_1", "_rev": first.rev, "name": "Persons"}),
        )
        .await
        .unwrap();
    assert!(second.rev.starts_with("2-"));

    // writing with the old rev (or none at all) conflicts
    let stale = store
        .put(
            ns,
            json!({"_id": "table_1", "_rev": first.rev, "name": "Stale"}),
        )
        .await;
    assert!(matches!(stale, Err(StoreError::Conflict { .. })));

    let missing_rev = store.put(ns, json!({"_id": "table_1", "name": "NoRev"})).await;
    assert!(matches!(missing_rev, Err(StoreError::Conflict { .. })));
}

#[tokio::test]
async fn test_put_requires_id() {
    let store = store().await;
    let err = store.put("app_dev_one", json!({"name": "x"})).await;
    assert!(matches!(err, Err(StoreError::InvalidDocument { .. })));
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let store = store().await;
    let err = store.get("app_dev_one", "table_missing").await;
    assert!(matches!(err, Err(StoreError::NotFound { .. })));
    assert!(store.try_get("app_dev_one", "table_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let store = store().await;
    store
        .put("app_dev_a", json!({"_id": "table_1", "ns": "a"}))
        .await
        .unwrap();
    store
        .put("app_dev_b", json!({"_id": "table_1", "ns": "b"}))
        .await
        .unwrap();

    let a = store.get("app_dev_a", "table_1").await.unwrap();
    let b = store.get("app_dev_b", "table_1").await.unwrap();
    assert_eq!(a["ns"], json!("a"));
    assert_eq!(b["ns"], json!("b"));
}

#[tokio::test]
async fn test_all_docs_prefix_range() {
    let store = store().await;
    let ns = "app_dev_one";
    for doc in [
        json!({"_id": "automation_b", "name": "two"}),
        json!({"_id": "automation_a", "name": "one"}),
        json!({"_id": "table_1", "name": "People"}),
        json!({"_id": ids::APP_METADATA_ID, "name": "the app"}),
    ] {
        store.put(ns, doc).await.unwrap();
    }

    let rows = store
        .all_docs(ns, AllDocsParams::prefix(ids::AUTOMATION_PREFIX))
        .await
        .unwrap();
    let keys: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(keys, vec!["automation_a", "automation_b"]);
    assert_eq!(rows[0].doc.as_ref().unwrap()["name"], json!("one"));

    // unbounded query returns everything in key order
    let all = store.all_docs(ns, AllDocsParams::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all[0].doc.is_none());
}

#[tokio::test]
async fn test_remove_checks_revision() {
    let store = store().await;
    let ns = "app_dev_one";
    let put = store
        .put(ns, json!({"_id": "automation_1", "name": "x"}))
        .await
        .unwrap();

    let stale = store.remove(ns, "automation_1", "1-deadbeef").await;
    assert!(matches!(stale, Err(StoreError::Conflict { .. })));

    store.remove(ns, "automation_1", &put.rev).await.unwrap();
    assert!(store.try_get(ns, "automation_1").await.unwrap().is_none());

    let gone = store.remove(ns, "automation_1", &put.rev).await;
    assert!(matches!(gone, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_destroy_removes_namespace_only() {
    let store = store().await;
    store
        .put("app_dev_a", json!({"_id": "table_1"}))
        .await
        .unwrap();
    store
        .put("app_dev_b", json!({"_id": "table_1"}))
        .await
        .unwrap();

    store.destroy("app_dev_a").await.unwrap();
    assert!(!store.exists("app_dev_a").await.unwrap());
    assert!(store.exists("app_dev_b").await.unwrap());

    let again = store.destroy("app_dev_a").await;
    assert!(matches!(again, Err(StoreError::NamespaceNotFound { .. })));
}

#[tokio::test]
async fn test_list_namespaces_by_prefix() {
    let store = store().await;
    for ns in ["app_dev_x", "app_x", "app_y", "other_ns"] {
        store.create_namespace(ns).await.unwrap();
    }
    let apps = store.list_namespaces(ids::APP_PREFIX).await.unwrap();
    assert_eq!(apps, vec!["app_dev_x", "app_x", "app_y"]);
}

#[tokio::test]
async fn test_count_prefix() {
    let store = store().await;
    let ns = "app_one";
    store
        .bulk_docs(
            ns,
            vec![
                json!({"_id": "row_t1_a"}),
                json!({"_id": "row_t1_b"}),
                json!({"_id": "table_t1"}),
            ],
        )
        .await
        .unwrap();
    assert_eq!(store.count_prefix(ns, ids::ROW_PREFIX).await.unwrap(), 2);
    assert_eq!(store.count_prefix(ns, ids::TABLE_PREFIX).await.unwrap(), 1);
}

#[tokio::test]
async fn test_bulk_docs_assigns_missing_ids() {
    let store = store().await;
    let results = store
        .bulk_docs("app_one", vec![json!({"name": "anonymous"})])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].id.is_empty());
}

#[tokio::test]
async fn test_replication_copies_all_documents() {
    let store = std::sync::Arc::new(store().await);
    let prod = "app_one";
    let dev = "app_dev_one";

    store
        .bulk_docs(
            prod,
            vec![
                json!({"_id": ids::APP_METADATA_ID, "name": "prod app"}),
                json!({"_id": "table_1", "name": "People"}),
                json!({"_id": "row_t1_a", "value": 1}),
            ],
        )
        .await
        .unwrap();
    // dev already holds an older copy of the metadata doc
    store
        .put(dev, json!({"_id": ids::APP_METADATA_ID, "name": "dev app"}))
        .await
        .unwrap();

    let mut replication = Replication::new(store.clone(), prod, dev);
    let copied = replication.replicate().await.unwrap();
    replication.close().await;
    assert_eq!(copied, 3);

    let meta = store.get(dev, ids::APP_METADATA_ID).await.unwrap();
    assert_eq!(meta["name"], json!("prod app"));
    assert!(store.try_get(dev, "row_t1_a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_replication_missing_source_fails_and_close_is_idempotent() {
    let store = std::sync::Arc::new(store().await);
    let mut replication = Replication::new(store.clone(), "app_missing", "app_dev_missing");
    let err = replication.replicate().await;
    assert!(matches!(err, Err(StoreError::NamespaceNotFound { .. })));
    replication.close().await;
    replication.close().await;
}

#[tokio::test]
async fn test_from_path_creates_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("docs.db");
    let store = SqliteDocumentStore::from_path(&path).await.unwrap();
    store
        .put("app_one", serde_json::json!({"_id": "table_1"}))
        .await
        .unwrap();
    assert!(path.exists());
}
