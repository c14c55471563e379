// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Metadata cache invalidation and transient runtime flags.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::debug;

/// Cache of application metadata kept by the platform, plus the transient
/// per-automation "test in progress" flag.
#[async_trait::async_trait]
pub trait MetadataCache: Send + Sync {
    /// Drop any cached metadata for an application so the next read sees
    /// the stored document.
    async fn invalidate_app_metadata(&self, app_id: &str);

    /// Mark an automation as running a builder test.
    async fn set_test_flag(&self, automation_id: &str);

    /// Clear the builder-test marker.
    async fn clear_test_flag(&self, automation_id: &str);
}

/// In-process cache bookkeeping. Records invalidations so tests can assert
/// on them.
#[derive(Default)]
pub struct InMemoryCache {
    invalidated: Mutex<Vec<String>>,
    test_flags: Mutex<HashSet<String>>,
}

impl InMemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Application ids invalidated so far, in order.
    pub fn invalidations(&self) -> Vec<String> {
        self.invalidated.lock().expect("cache mutex").clone()
    }

    /// Whether an automation currently carries the test flag.
    pub fn test_flag_set(&self, automation_id: &str) -> bool {
        self.test_flags
            .lock()
            .expect("cache mutex")
            .contains(automation_id)
    }
}

#[async_trait::async_trait]
impl MetadataCache for InMemoryCache {
    async fn invalidate_app_metadata(&self, app_id: &str) {
        debug!(app_id, "Invalidating cached app metadata");
        self.invalidated
            .lock()
            .expect("cache mutex")
            .push(app_id.to_string());
    }

    async fn set_test_flag(&self, automation_id: &str) {
        self.test_flags
            .lock()
            .expect("cache mutex")
            .insert(automation_id.to_string());
    }

    async fn clear_test_flag(&self, automation_id: &str) {
        self.test_flags
            .lock()
            .expect("cache mutex")
            .remove(automation_id);
    }
}
