// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Global user directory seam.
//!
//! The user directory is a separate platform service. The controllers call
//! it to trigger a directory-wide resync after an app sync and to remove
//! role bindings when an application is fully deleted.

use std::sync::Mutex;

use tracing::info;

/// Calls into the global user directory.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resync user records after documents changed underneath them.
    async fn resync(&self) -> anyhow::Result<()>;

    /// Remove every role binding that references an application.
    async fn remove_app_roles(&self, app_id: &str) -> anyhow::Result<()>;
}

/// Default directory: logs the calls and records them for assertions.
#[derive(Default)]
pub struct RecordingDirectory {
    resyncs: Mutex<u32>,
    removed_roles: Mutex<Vec<String>>,
}

impl RecordingDirectory {
    /// Create an empty directory stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resyncs requested.
    pub fn resync_count(&self) -> u32 {
        *self.resyncs.lock().expect("directory mutex")
    }

    /// Applications whose role bindings were removed.
    pub fn removed_roles(&self) -> Vec<String> {
        self.removed_roles.lock().expect("directory mutex").clone()
    }
}

#[async_trait::async_trait]
impl UserDirectory for RecordingDirectory {
    async fn resync(&self) -> anyhow::Result<()> {
        info!("Requesting user directory resync");
        *self.resyncs.lock().expect("directory mutex") += 1;
        Ok(())
    }

    async fn remove_app_roles(&self, app_id: &str) -> anyhow::Result<()> {
        info!(app_id, "Removing app role bindings");
        self.removed_roles
            .lock()
            .expect("directory mutex")
            .push(app_id.to_string());
        Ok(())
    }
}
