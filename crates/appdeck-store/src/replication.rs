// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Replication handle.
//!
//! Replication is a potentially long-running operation against the store;
//! callers hold a handle for its duration and must release it with
//! [`Replication::close`] on both success and failure paths.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::DocumentStore;

/// A handle over one source-to-target namespace copy.
pub struct Replication {
    store: Arc<dyn DocumentStore>,
    source: String,
    target: String,
    closed: bool,
}

impl Replication {
    /// Create a replication handle from `source` into `target`.
    pub fn new(store: Arc<dyn DocumentStore>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            store,
            source: source.into(),
            target: target.into(),
            closed: false,
        }
    }

    /// Copy every document from the source namespace into the target,
    /// overwriting documents the target already holds. Returns the number
    /// of documents copied.
    pub async fn replicate(&self) -> Result<u64> {
        debug!(source = %self.source, target = %self.target, "Replicating namespace");
        self.store
            .replicate_namespace(&self.source, &self.target)
            .await
    }

    /// Release the handle. Idempotent; must be called whether or not
    /// `replicate` succeeded.
    pub async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!(source = %self.source, target = %self.target, "Replication handle closed");
        }
    }
}

impl Drop for Replication {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                source = %self.source,
                target = %self.target,
                "Replication handle dropped without close()"
            );
        }
    }
}
