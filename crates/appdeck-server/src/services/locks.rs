// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Advisory lock lookups.
//!
//! The distributed lock itself lives outside this service; controllers only
//! consult it to annotate listings with "locked by" information. The lookup
//! is best-effort: a failed or stale answer degrades to "no lock info" and
//! must never gate an operation.

use std::collections::HashMap;
use std::sync::RwLock;

use appdeck_types::application::LockHolder;

/// Read-only view of the builder locks held on development applications.
#[async_trait::async_trait]
pub trait LockService: Send + Sync {
    /// Current lock holders for the given application identifiers. Missing
    /// entries mean "not locked (as far as we know)".
    async fn locks_for(&self, app_ids: &[String]) -> HashMap<String, LockHolder>;
}

/// Default service: no lock information available.
pub struct NoLocks;

#[async_trait::async_trait]
impl LockService for NoLocks {
    async fn locks_for(&self, _app_ids: &[String]) -> HashMap<String, LockHolder> {
        HashMap::new()
    }
}

/// In-memory lock table, for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryLocks {
    locks: RwLock<HashMap<String, LockHolder>>,
}

impl InMemoryLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lock holder for an application.
    pub fn set_lock(&self, app_id: &str, holder: LockHolder) {
        self.locks
            .write()
            .expect("locks rwlock")
            .insert(app_id.to_string(), holder);
    }

    /// Remove the lock entry for an application.
    pub fn clear_lock(&self, app_id: &str) {
        self.locks.write().expect("locks rwlock").remove(app_id);
    }
}

#[async_trait::async_trait]
impl LockService for InMemoryLocks {
    async fn locks_for(&self, app_ids: &[String]) -> HashMap<String, LockHolder> {
        let locks = self.locks.read().expect("locks rwlock");
        app_ids
            .iter()
            .filter_map(|id| locks.get(id).map(|h| (id.clone(), h.clone())))
            .collect()
    }
}
