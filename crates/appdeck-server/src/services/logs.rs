// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Automation execution log search seam.

use serde_json::{Value, json};

/// Search over automation run logs kept by the platform's logging service.
#[async_trait::async_trait]
pub trait AutomationLogStore: Send + Sync {
    /// Run a search query and return the raw result page.
    async fn search(&self, query: Value) -> anyhow::Result<Value>;
}

/// Default log store: no logs retained, every search returns an empty page.
pub struct NoopLogStore;

#[async_trait::async_trait]
impl AutomationLogStore for NoopLogStore {
    async fn search(&self, _query: Value) -> anyhow::Result<Value> {
        Ok(json!({ "data": [], "hasNextPage": false }))
    }
}
