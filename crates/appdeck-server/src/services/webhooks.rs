// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Webhook registration for webhook-type automation triggers.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use uuid::Uuid;

use appdeck_types::automation::AutomationStep;

/// Side table mapping webhook-triggered automations to inbound endpoints.
///
/// `sync` is called with the trigger before and after a write so the
/// registry can diff: a removed or replaced webhook trigger is
/// deregistered, a new one registered.
#[async_trait::async_trait]
pub trait WebhookRegistry: Send + Sync {
    /// Reconcile the registry entry for one automation.
    async fn sync(
        &self,
        app_id: &str,
        automation_id: &str,
        old_trigger: Option<&AutomationStep>,
        new_trigger: Option<&AutomationStep>,
    ) -> anyhow::Result<()>;

    /// Drop every entry belonging to an application.
    async fn clear_app(&self, app_id: &str) -> anyhow::Result<()>;
}

/// In-memory webhook table.
#[derive(Default)]
pub struct InMemoryWebhooks {
    // automation id -> (app id, webhook id)
    entries: RwLock<HashMap<String, (String, String)>>,
}

impl InMemoryWebhooks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an automation currently has a webhook registered.
    pub fn is_registered(&self, automation_id: &str) -> bool {
        self.entries
            .read()
            .expect("webhooks rwlock")
            .contains_key(automation_id)
    }

    /// Number of registered webhooks.
    pub fn len(&self) -> usize {
        self.entries.read().expect("webhooks rwlock").len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl WebhookRegistry for InMemoryWebhooks {
    async fn sync(
        &self,
        app_id: &str,
        automation_id: &str,
        old_trigger: Option<&AutomationStep>,
        new_trigger: Option<&AutomationStep>,
    ) -> anyhow::Result<()> {
        let was_webhook = old_trigger.is_some_and(AutomationStep::is_webhook);
        let is_webhook = new_trigger.is_some_and(AutomationStep::is_webhook);

        let mut entries = self.entries.write().expect("webhooks rwlock");
        if was_webhook && !is_webhook {
            debug!(automation_id, "Deregistering webhook");
            entries.remove(automation_id);
        }
        if is_webhook && !entries.contains_key(automation_id) {
            let webhook_id = Uuid::new_v4().simple().to_string();
            debug!(automation_id, webhook_id, "Registering webhook");
            entries.insert(
                automation_id.to_string(),
                (app_id.to_string(), webhook_id),
            );
        }
        Ok(())
    }

    async fn clear_app(&self, app_id: &str) -> anyhow::Result<()> {
        self.entries
            .write()
            .expect("webhooks rwlock")
            .retain(|_, (owner, _)| owner != app_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdeck_types::automation::WEBHOOK_TRIGGER_STEP_ID;

    fn webhook_trigger() -> AutomationStep {
        AutomationStep {
            id: "t".to_string(),
            step_id: WEBHOOK_TRIGGER_STEP_ID.to_string(),
            ..Default::default()
        }
    }

    fn row_trigger() -> AutomationStep {
        AutomationStep {
            id: "t".to_string(),
            step_id: "ROW_SAVED".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_and_deregister() {
        let registry = InMemoryWebhooks::new();

        registry
            .sync("app_1", "automation_1", None, Some(&webhook_trigger()))
            .await
            .unwrap();
        assert!(registry.is_registered("automation_1"));

        // switching away from the webhook trigger deregisters
        registry
            .sync(
                "app_1",
                "automation_1",
                Some(&webhook_trigger()),
                Some(&row_trigger()),
            )
            .await
            .unwrap();
        assert!(!registry.is_registered("automation_1"));
    }

    #[tokio::test]
    async fn test_non_webhook_triggers_are_ignored() {
        let registry = InMemoryWebhooks::new();
        registry
            .sync("app_1", "automation_1", None, Some(&row_trigger()))
            .await
            .unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_clear_app_drops_only_that_app() {
        let registry = InMemoryWebhooks::new();
        registry
            .sync("app_1", "automation_1", None, Some(&webhook_trigger()))
            .await
            .unwrap();
        registry
            .sync("app_2", "automation_2", None, Some(&webhook_trigger()))
            .await
            .unwrap();

        registry.clear_app("app_1").await.unwrap();
        assert!(!registry.is_registered("automation_1"));
        assert!(registry.is_registered("automation_2"));
    }
}
