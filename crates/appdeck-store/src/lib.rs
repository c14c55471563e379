// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document store client for appdeck.
//!
//! Every application copy (development or production) owns one namespace of
//! JSON documents. Writes are optimistic-concurrency: a put against an
//! existing document must carry the revision last read or it fails with a
//! conflict. Range queries over a key prefix enumerate a single document
//! type, and a replication primitive copies one namespace into another.
//!
//! The [`DocumentStore`] trait is the seam the controllers program against;
//! [`SqliteDocumentStore`] is the bundled backend. The engine behind the
//! trait is deliberately not this crate's concern.

#![deny(missing_docs)]

/// Error types for store operations.
pub mod error;

/// Replication handle copying one namespace into another.
pub mod replication;

/// SQLite-backed document store.
pub mod sqlite;

pub use self::error::{Result, StoreError};
pub use self::replication::Replication;
pub use self::sqlite::SqliteDocumentStore;

use serde_json::Value;

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// Key of the written document.
    pub id: String,
    /// Revision assigned by the write.
    pub rev: String,
}

/// One row of an `all_docs` range query.
#[derive(Debug, Clone)]
pub struct AllDocsRow {
    /// Document key.
    pub id: String,
    /// Current revision.
    pub rev: String,
    /// Full document body when `include_docs` was requested.
    pub doc: Option<Value>,
}

/// Parameters of an `all_docs` range query. Keys are half-open:
/// `start_key <= id < end_key`. Absent bounds are unbounded.
#[derive(Debug, Clone, Default)]
pub struct AllDocsParams {
    /// Inclusive lower key bound.
    pub start_key: Option<String>,
    /// Exclusive upper key bound.
    pub end_key: Option<String>,
    /// Return full document bodies, not just keys and revisions.
    pub include_docs: bool,
}

impl AllDocsParams {
    /// Query every document whose key starts with `prefix`, including
    /// bodies.
    pub fn prefix(prefix: &str) -> Self {
        let (start, end) = appdeck_types::ids::prefix_range(prefix);
        Self {
            start_key: Some(start),
            end_key: Some(end),
            include_docs: true,
        }
    }
}

/// Per-namespace document store with revisioned writes.
///
/// Implementations must treat namespaces as isolated: keys never collide
/// across namespaces, and destroying one namespace leaves the others
/// untouched.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether the namespace exists.
    async fn exists(&self, namespace: &str) -> Result<bool>;

    /// Create the namespace if it does not already exist.
    async fn create_namespace(&self, namespace: &str) -> Result<()>;

    /// Fetch a document, failing with [`StoreError::NotFound`] when absent.
    async fn get(&self, namespace: &str, id: &str) -> Result<Value>;

    /// Fetch a document, returning `None` when absent.
    async fn try_get(&self, namespace: &str, id: &str) -> Result<Option<Value>>;

    /// Write a document. The body must carry `_id`; when the document
    /// already exists the body's `_rev` must match the stored revision or
    /// the write fails with [`StoreError::Conflict`].
    async fn put(&self, namespace: &str, doc: Value) -> Result<PutResult>;

    /// Write a batch of documents. Bodies without `_id` are assigned one.
    async fn bulk_docs(&self, namespace: &str, docs: Vec<Value>) -> Result<Vec<PutResult>>;

    /// Range query over document keys, ordered by key.
    async fn all_docs(&self, namespace: &str, params: AllDocsParams) -> Result<Vec<AllDocsRow>>;

    /// Delete a document at the given revision.
    async fn remove(&self, namespace: &str, id: &str, rev: &str) -> Result<()>;

    /// Drop the whole namespace and every document in it.
    async fn destroy(&self, namespace: &str) -> Result<()>;

    /// List namespaces beginning with `prefix`, ordered by name.
    async fn list_namespaces(&self, prefix: &str) -> Result<Vec<String>>;

    /// Count documents whose key starts with `prefix`.
    async fn count_prefix(&self, namespace: &str, prefix: &str) -> Result<i64>;

    /// Copy every document from `source` into `target`, preserving
    /// revisions and overwriting documents the target already holds.
    /// Prefer going through [`Replication`], which tracks handle release.
    async fn replicate_namespace(&self, source: &str, target: &str) -> Result<u64>;
}
