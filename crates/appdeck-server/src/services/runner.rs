// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! External trigger runner seam.
//!
//! Condition and action execution is owned by the platform's trigger
//! runner; the automation controller only hands over the definition and a
//! payload. Test runs request synchronous responses so the builder can show
//! per-step results.

use serde_json::{Value, json};
use tracing::info;

use appdeck_types::automation::Automation;

/// Executes an automation definition against a payload.
#[async_trait::async_trait]
pub trait TriggerRunner: Send + Sync {
    /// Run the automation. When `synchronous` is set the caller wants the
    /// per-step responses; otherwise the run is fire-and-forget and the
    /// returned value is an acknowledgement.
    async fn run(
        &self,
        automation: &Automation,
        payload: Value,
        synchronous: bool,
    ) -> anyhow::Result<Value>;
}

/// Default runner: acknowledges every step without executing anything.
/// Stands in for the platform runner in standalone deployments and tests.
pub struct LocalTriggerRunner;

#[async_trait::async_trait]
impl TriggerRunner for LocalTriggerRunner {
    async fn run(
        &self,
        automation: &Automation,
        payload: Value,
        synchronous: bool,
    ) -> anyhow::Result<Value> {
        let automation_id = automation.id.as_deref().unwrap_or("<unsaved>");
        info!(automation_id, synchronous, "Dispatching automation run");

        if !synchronous {
            return Ok(json!({ "queued": true }));
        }

        let steps: Vec<Value> = automation
            .definition
            .steps
            .iter()
            .map(|step| {
                json!({
                    "id": step.id,
                    "stepId": step.step_id,
                    "inputs": step.inputs,
                    "outputs": { "success": true },
                })
            })
            .collect();
        Ok(json!({
            "trigger": automation.definition.trigger,
            "steps": steps,
            "payload": payload,
        }))
    }
}
