// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed document store implementation.

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::{AllDocsParams, AllDocsRow, DocumentStore, PutResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// SQLite-backed document store.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Create a new store from an existing pool. The caller is responsible
    /// for running migrations.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a store from a file path.
    ///
    /// Creates parent directories and the database file if needed, connects
    /// with sensible defaults and runs all migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Database {
                operation: "create_dir".to_string(),
                details: format!("Failed to create directory {:?}: {}", parent, e),
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|e| StoreError::Database {
                operation: "connect".to_string(),
                details: format!("Failed to connect to SQLite at {:?}: {}", path, e),
            })?;

        MIGRATOR.run(&pool).await.map_err(|e| StoreError::Database {
            operation: "migrate".to_string(),
            details: format!("Failed to run migrations: {}", e),
        })?;

        Ok(Self { pool })
    }

    /// Create and initialize a fully in-memory store.
    ///
    /// A single connection is used so that every query sees the same
    /// in-memory database. Intended for tests and embedded use.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database {
                operation: "connect".to_string(),
                details: format!("Failed to open in-memory SQLite: {}", e),
            })?;

        MIGRATOR.run(&pool).await.map_err(|e| StoreError::Database {
            operation: "migrate".to_string(),
            details: format!("Failed to run migrations: {}", e),
        })?;

        Ok(Self { pool })
    }
}

fn make_rev(seq: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", seq, &suffix[..8])
}

fn doc_id(doc: &serde_json::Value) -> Result<Option<String>> {
    match doc.get("_id") {
        None => Ok(None),
        Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(Some(id.clone())),
        Some(_) => Err(StoreError::InvalidDocument {
            reason: "_id must be a non-empty string".to_string(),
        }),
    }
}

fn doc_rev(doc: &serde_json::Value) -> Option<&str> {
    doc.get("_rev").and_then(serde_json::Value::as_str)
}

#[async_trait::async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn exists(&self, namespace: &str) -> Result<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT namespace FROM namespaces WHERE namespace = ?")
                .bind(namespace)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn create_namespace(&self, namespace: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO namespaces (namespace) VALUES (?)")
            .bind(namespace)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, namespace: &str, id: &str) -> Result<serde_json::Value> {
        self.try_get(namespace, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                id: id.to_string(),
            })
    }

    async fn try_get(&self, namespace: &str, id: &str) -> Result<Option<serde_json::Value>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE namespace = ? AND id = ?")
                .bind(namespace)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, namespace: &str, mut doc: serde_json::Value) -> Result<PutResult> {
        if !doc.is_object() {
            return Err(StoreError::InvalidDocument {
                reason: "document body must be a JSON object".to_string(),
            });
        }
        let id = doc_id(&doc)?.ok_or_else(|| StoreError::InvalidDocument {
            reason: "_id is required".to_string(),
        })?;

        let mut tx = self.pool.begin().await?;

        let current: Option<(i64, String)> =
            sqlx::query_as("SELECT rev_seq, rev FROM documents WHERE namespace = ? AND id = ?")
                .bind(namespace)
                .bind(&id)
                .fetch_optional(&mut *tx)
                .await?;

        let next_seq = match &current {
            Some((seq, stored_rev)) => {
                if doc_rev(&doc) != Some(stored_rev.as_str()) {
                    return Err(StoreError::Conflict {
                        namespace: namespace.to_string(),
                        id,
                    });
                }
                seq + 1
            }
            None => 1,
        };

        let rev = make_rev(next_seq);
        doc["_rev"] = serde_json::Value::String(rev.clone());
        let body = serde_json::to_string(&doc)?;

        sqlx::query("INSERT OR IGNORE INTO namespaces (namespace) VALUES (?)")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO documents (namespace, id, rev_seq, rev, body, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT (namespace, id) DO UPDATE SET
                rev_seq = excluded.rev_seq,
                rev = excluded.rev,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(namespace)
        .bind(&id)
        .bind(next_seq)
        .bind(&rev)
        .bind(&body)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PutResult { id, rev })
    }

    async fn bulk_docs(
        &self,
        namespace: &str,
        docs: Vec<serde_json::Value>,
    ) -> Result<Vec<PutResult>> {
        let mut results = Vec::with_capacity(docs.len());
        for mut doc in docs {
            if doc_id(&doc)?.is_none() {
                doc["_id"] = serde_json::Value::String(Uuid::new_v4().simple().to_string());
            }
            results.push(self.put(namespace, doc).await?);
        }
        Ok(results)
    }

    async fn all_docs(&self, namespace: &str, params: AllDocsParams) -> Result<Vec<AllDocsRow>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, rev, body
            FROM documents
            WHERE namespace = ?1
              AND (?2 IS NULL OR id >= ?2)
              AND (?3 IS NULL OR id < ?3)
            ORDER BY id
            "#,
        )
        .bind(namespace)
        .bind(&params.start_key)
        .bind(&params.end_key)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, rev, body)| {
                let doc = if params.include_docs {
                    Some(serde_json::from_str(&body)?)
                } else {
                    None
                };
                Ok(AllDocsRow { id, rev, doc })
            })
            .collect()
    }

    async fn remove(&self, namespace: &str, id: &str, rev: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT rev FROM documents WHERE namespace = ? AND id = ?")
                .bind(namespace)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        match current {
            None => {
                return Err(StoreError::NotFound {
                    namespace: namespace.to_string(),
                    id: id.to_string(),
                });
            }
            Some((stored_rev,)) if stored_rev != rev => {
                return Err(StoreError::Conflict {
                    namespace: namespace.to_string(),
                    id: id.to_string(),
                });
            }
            Some(_) => {}
        }

        sqlx::query("DELETE FROM documents WHERE namespace = ? AND id = ?")
            .bind(namespace)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn destroy(&self, namespace: &str) -> Result<()> {
        if !self.exists(namespace).await? {
            return Err(StoreError::NamespaceNotFound {
                namespace: namespace.to_string(),
            });
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE namespace = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM namespaces WHERE namespace = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_namespaces(&self, prefix: &str) -> Result<Vec<String>> {
        let (start, end) = appdeck_types::ids::prefix_range(prefix);
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT namespace FROM namespaces
            WHERE namespace >= ? AND namespace < ?
            ORDER BY namespace
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(ns,)| ns).collect())
    }

    async fn count_prefix(&self, namespace: &str, prefix: &str) -> Result<i64> {
        let (start, end) = appdeck_types::ids::prefix_range(prefix);
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents WHERE namespace = ? AND id >= ? AND id < ?",
        )
        .bind(namespace)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn replicate_namespace(&self, source: &str, target: &str) -> Result<u64> {
        if !self.exists(source).await? {
            return Err(StoreError::NamespaceNotFound {
                namespace: source.to_string(),
            });
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT OR IGNORE INTO namespaces (namespace) VALUES (?)")
            .bind(target)
            .execute(&mut *tx)
            .await?;
        let copied = sqlx::query(
            r#"
            INSERT INTO documents (namespace, id, rev_seq, rev, body, updated_at)
            SELECT ?2, id, rev_seq, rev, body, CURRENT_TIMESTAMP
            FROM documents WHERE namespace = ?1
            ON CONFLICT (namespace, id) DO UPDATE SET
                rev_seq = excluded.rev_seq,
                rev = excluded.rev,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(source)
        .bind(target)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        Ok(copied)
    }
}
