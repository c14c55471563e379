// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Automation handlers.
//!
//! Automations live as documents inside their application namespace. The
//! save boundary decides once whether a request is a create or an update;
//! both paths prune empty step inputs, keep the webhook registry in step
//! with the trigger, and emit the matching platform events. Updates diff
//! the step list against the stored revision so step-created/step-deleted
//! events reflect actual changes, and a trigger swap discards the stored
//! test input since it no longer matches the trigger's schema.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use appdeck_store::{AllDocsParams, DocumentStore};
use appdeck_types::automation::{Automation, deleted_steps, new_steps};
use appdeck_types::ids;

use crate::error::{ApiError, Result};
use crate::services::{
    AutomationLogStore, EventSink, MetadataCache, PlatformEvent, TriggerRunner, WebhookRegistry,
};

/// Entity metadata type holding the saved builder test input.
pub const METADATA_TEST_INPUT: &str = "automationTestInput";

/// Entity metadata type holding the builder test history.
pub const METADATA_TEST_HISTORY: &str = "automationTestHistory";

/// Shared state for automation handlers.
pub struct AutomationHandlerState {
    /// Document store holding every application namespace.
    pub store: Arc<dyn DocumentStore>,
    /// Platform event sink.
    pub events: Arc<dyn EventSink>,
    /// Metadata cache, also holding the transient test flags.
    pub cache: Arc<dyn MetadataCache>,
    /// Webhook registry kept in step with webhook-type triggers.
    pub webhooks: Arc<dyn WebhookRegistry>,
    /// External trigger runner.
    pub runner: Arc<dyn TriggerRunner>,
    /// Automation run log search.
    pub logs: Arc<dyn AutomationLogStore>,
}

/// Plain message response.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationMessage {
    /// Human-readable outcome.
    pub message: String,
}

// ============================================================================
// Save (create or update)
// ============================================================================

/// Intent of a save request, decided once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    /// The document does not exist yet.
    Create,
    /// The document exists and the body carries its revision.
    Update,
}

impl SaveIntent {
    /// Classify a save body: a document carrying both its key and a
    /// revision is an update, anything else a create.
    pub fn of(automation: &Automation) -> Self {
        if automation.id.is_some() && automation.rev.is_some() {
            Self::Update
        } else {
            Self::Create
        }
    }
}

/// Handle an automation save, dispatching on the save intent.
#[instrument(skip(state, automation))]
pub async fn handle_save(
    state: &AutomationHandlerState,
    app_id: &str,
    automation: Automation,
) -> Result<Automation> {
    match SaveIntent::of(&automation) {
        SaveIntent::Create => handle_create(state, app_id, automation).await,
        SaveIntent::Update => handle_update(state, app_id, automation).await,
    }
}

/// Create a new automation document.
#[instrument(skip(state, automation))]
pub async fn handle_create(
    state: &AutomationHandlerState,
    app_id: &str,
    mut automation: Automation,
) -> Result<Automation> {
    let automation_id = automation
        .id
        .clone()
        .unwrap_or_else(ids::generate_automation_id);
    automation.id = Some(automation_id.clone());
    automation.rev = None;
    automation.app_id = Some(app_id.to_string());
    automation.doc_type = Some("automation".to_string());
    automation.clean_inputs();

    state
        .webhooks
        .sync(
            app_id,
            &automation_id,
            None,
            automation.definition.trigger.as_ref(),
        )
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    let body = serde_json::to_value(&automation).map_err(|e| ApiError::Store(e.into()))?;
    let result = state.store.put(app_id, body).await?;
    automation.rev = Some(result.rev);

    state
        .events
        .emit(PlatformEvent::AutomationCreated {
            automation_id: automation_id.clone(),
        })
        .await;
    for step in &automation.definition.steps {
        state
            .events
            .emit(PlatformEvent::AutomationStepCreated {
                automation_id: automation_id.clone(),
                step_id: step.id.clone(),
            })
            .await;
    }

    info!(automation_id, "Automation created");
    Ok(automation)
}

/// Update an existing automation document.
#[instrument(skip(state, automation))]
pub async fn handle_update(
    state: &AutomationHandlerState,
    app_id: &str,
    mut automation: Automation,
) -> Result<Automation> {
    let automation_id = automation
        .id
        .clone()
        .ok_or_else(|| ApiError::Validation("Automation id is required".to_string()))?;

    // 1. Load the stored revision for the trigger and step diffs
    let old: Automation = {
        let doc = state.store.get(app_id, &automation_id).await?;
        serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))?
    };

    automation.app_id = Some(app_id.to_string());
    automation.doc_type = Some("automation".to_string());
    automation.clean_inputs();

    // 2. Reconcile the webhook registry against the trigger change
    state
        .webhooks
        .sync(
            app_id,
            &automation_id,
            old.definition.trigger.as_ref(),
            automation.definition.trigger.as_ref(),
        )
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    // 3. Persist
    let body = serde_json::to_value(&automation).map_err(|e| ApiError::Store(e.into()))?;
    let result = state.store.put(app_id, body).await?;
    automation.rev = Some(result.rev);

    // 4. A changed trigger invalidates the saved test input
    if old.trigger_id() != automation.trigger_id() {
        debug!(automation_id, "Trigger changed, discarding saved test input");
        delete_entity_metadata(state.store.as_ref(), app_id, METADATA_TEST_INPUT, &automation_id)
            .await?;
        state
            .events
            .emit(PlatformEvent::AutomationTriggerUpdated {
                automation_id: automation_id.clone(),
            })
            .await;
    }

    // 5. Step diff events
    for step in new_steps(&old.definition, &automation.definition) {
        state
            .events
            .emit(PlatformEvent::AutomationStepCreated {
                automation_id: automation_id.clone(),
                step_id: step.id.clone(),
            })
            .await;
    }
    for step in deleted_steps(&old.definition, &automation.definition) {
        state
            .events
            .emit(PlatformEvent::AutomationStepDeleted {
                automation_id: automation_id.clone(),
                step_id: step.id.clone(),
            })
            .await;
    }

    info!(automation_id, "Automation updated");
    Ok(automation)
}

// ============================================================================
// Fetch / find / destroy
// ============================================================================

/// List every automation document in an application.
#[instrument(skip(state))]
pub async fn handle_fetch(state: &AutomationHandlerState, app_id: &str) -> Result<Vec<Value>> {
    let rows = state
        .store
        .all_docs(app_id, AllDocsParams::prefix(ids::AUTOMATION_PREFIX))
        .await?;
    Ok(rows.into_iter().filter_map(|row| row.doc).collect())
}

/// Fetch a single automation document.
#[instrument(skip(state))]
pub async fn handle_find(
    state: &AutomationHandlerState,
    app_id: &str,
    automation_id: &str,
) -> Result<Value> {
    Ok(state.store.get(app_id, automation_id).await?)
}

/// Delete an automation at the given revision, along with its entity
/// metadata and any webhook registration.
#[instrument(skip(state))]
pub async fn handle_destroy(
    state: &AutomationHandlerState,
    app_id: &str,
    automation_id: &str,
    rev: &str,
) -> Result<AutomationMessage> {
    let stored: Automation = {
        let doc = state.store.get(app_id, automation_id).await?;
        serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))?
    };

    // deregister first so a failed delete never leaves a dangling endpoint
    state
        .webhooks
        .sync(
            app_id,
            automation_id,
            stored.definition.trigger.as_ref(),
            None,
        )
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    delete_entity_metadata(state.store.as_ref(), app_id, METADATA_TEST_INPUT, automation_id)
        .await?;
    delete_entity_metadata(state.store.as_ref(), app_id, METADATA_TEST_HISTORY, automation_id)
        .await?;

    state.store.remove(app_id, automation_id, rev).await?;
    state
        .events
        .emit(PlatformEvent::AutomationDeleted {
            automation_id: automation_id.to_string(),
        })
        .await;

    info!(automation_id, "Automation deleted");
    Ok(AutomationMessage {
        message: format!("Automation {automation_id} deleted."),
    })
}

// ============================================================================
// Trigger / test
// ============================================================================

/// Fire an automation asynchronously with the given payload.
#[instrument(skip(state, payload))]
pub async fn handle_trigger(
    state: &AutomationHandlerState,
    app_id: &str,
    automation_id: &str,
    payload: Value,
) -> Result<AutomationMessage> {
    let automation: Automation = {
        let doc = state.store.get(app_id, automation_id).await?;
        serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))?
    };

    state
        .runner
        .run(&automation, payload, false)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    Ok(AutomationMessage {
        message: format!("Automation {automation_id} has been triggered."),
    })
}

/// Test-run an automation synchronously from the builder.
///
/// The transient test flag is set for the duration of the run so production
/// side effects can be suppressed, and a timestamped record is appended to
/// the test history whether or not the run succeeded.
#[instrument(skip(state, payload))]
pub async fn handle_test(
    state: &AutomationHandlerState,
    app_id: &str,
    automation_id: &str,
    payload: Value,
) -> Result<Value> {
    let automation: Automation = {
        let doc = state.store.get(app_id, automation_id).await?;
        serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))?
    };

    state.cache.set_test_flag(automation_id).await;
    let input = prepare_test_input(payload);
    let outcome = state.runner.run(&automation, input, true).await;

    let record = match &outcome {
        Ok(result) => json!({
            "occurredAt": crate::application_handlers::now_iso(),
            "automationId": automation_id,
            "status": "success",
            "results": result,
        }),
        Err(err) => json!({
            "occurredAt": crate::application_handlers::now_iso(),
            "automationId": automation_id,
            "status": "error",
            "error": err.to_string(),
        }),
    };
    if let Err(err) =
        append_test_history(state.store.as_ref(), app_id, automation_id, record).await
    {
        warn!(automation_id, error = %err, "Failed to record test history");
    }
    state.cache.clear_test_flag(automation_id).await;

    let result = outcome.map_err(|err| ApiError::Upstream(err.to_string()))?;
    state
        .events
        .emit(PlatformEvent::AutomationTested {
            automation_id: automation_id.to_string(),
        })
        .await;
    Ok(result)
}

/// Shape a builder test payload for the runner: a bare row id or revision
/// is copied into the row object the trigger schema expects.
fn prepare_test_input(mut payload: Value) -> Value {
    let Some(obj) = payload.as_object_mut() else {
        return payload;
    };
    let id = obj.get("id").and_then(Value::as_str).map(str::to_string);
    let revision = obj
        .get("revision")
        .and_then(Value::as_str)
        .map(str::to_string);
    if id.is_none() && revision.is_none() {
        return payload;
    }
    let row = obj
        .entry("row")
        .or_insert_with(|| Value::Object(Default::default()));
    if let Some(row) = row.as_object_mut() {
        if let Some(id) = id {
            row.insert("_id".to_string(), Value::String(id));
        }
        if let Some(revision) = revision {
            row.insert("_rev".to_string(), Value::String(revision));
        }
    }
    payload
}

// ============================================================================
// Logs
// ============================================================================

/// Search the automation run logs.
#[instrument(skip(state, query))]
pub async fn handle_log_search(state: &AutomationHandlerState, query: Value) -> Result<Value> {
    state
        .logs
        .search(query)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))
}

/// Clear recorded automation errors from the production metadata document.
///
/// Without an automation id the whole error map is dropped; with one, only
/// that automation's entry.
#[instrument(skip(state))]
pub async fn handle_clear_log_error(
    state: &AutomationHandlerState,
    app_id: &str,
    automation_id: Option<&str>,
) -> Result<AutomationMessage> {
    let prod_app_id = ids::to_prod_app_id(app_id);
    let mut doc = state.store.get(&prod_app_id, ids::APP_METADATA_ID).await?;

    if let Some(obj) = doc.as_object_mut() {
        match automation_id {
            None => {
                obj.remove("automationErrors");
            }
            Some(automation_id) => {
                if let Some(errors) = obj.get_mut("automationErrors").and_then(Value::as_object_mut)
                {
                    errors.remove(automation_id);
                }
            }
        }
    }
    state.store.put(&prod_app_id, doc).await?;
    state.cache.invalidate_app_metadata(&prod_app_id).await;

    Ok(AutomationMessage {
        message: format!("Automation errors cleared for app {prod_app_id}."),
    })
}

// ============================================================================
// Entity metadata
// ============================================================================

/// Delete an entity metadata document if it exists.
async fn delete_entity_metadata(
    store: &dyn DocumentStore,
    namespace: &str,
    metadata_type: &str,
    entity_id: &str,
) -> Result<()> {
    let id = ids::metadata_id(metadata_type, entity_id);
    if let Some(doc) = store.try_get(namespace, &id).await?
        && let Some(rev) = doc.get("_rev").and_then(Value::as_str)
    {
        store.remove(namespace, &id, rev).await?;
    }
    Ok(())
}

/// Append a record to the test history metadata document, creating it on
/// first use.
async fn append_test_history(
    store: &dyn DocumentStore,
    namespace: &str,
    automation_id: &str,
    record: Value,
) -> Result<()> {
    let id = ids::metadata_id(METADATA_TEST_HISTORY, automation_id);
    let mut doc = match store.try_get(namespace, &id).await? {
        Some(doc) => doc,
        None => json!({ "_id": id, "history": [] }),
    };
    if let Some(history) = doc.get_mut("history").and_then(Value::as_array_mut) {
        history.push(record);
    } else if let Some(obj) = doc.as_object_mut() {
        obj.insert("history".to_string(), Value::Array(vec![record]));
    }
    store.put(namespace, doc).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdeck_types::automation::AutomationDefinition;
    use serde_json::Map;

    fn automation(id: Option<&str>, rev: Option<&str>) -> Automation {
        Automation {
            id: id.map(str::to_string),
            rev: rev.map(str::to_string),
            app_id: None,
            doc_type: None,
            name: Some("test".to_string()),
            definition: AutomationDefinition::default(),
            live: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_save_intent_classification() {
        assert_eq!(SaveIntent::of(&automation(None, None)), SaveIntent::Create);
        // an id without a revision is still a create (client-allocated key)
        assert_eq!(
            SaveIntent::of(&automation(Some("automation_1"), None)),
            SaveIntent::Create
        );
        assert_eq!(
            SaveIntent::of(&automation(Some("automation_1"), Some("1-abc"))),
            SaveIntent::Update
        );
    }

    #[test]
    fn test_prepare_test_input_moves_row_identity() {
        let input = prepare_test_input(json!({
            "id": "row_1",
            "revision": "2-def",
            "row": { "name": "x" },
        }));
        assert_eq!(input["row"]["_id"], json!("row_1"));
        assert_eq!(input["row"]["_rev"], json!("2-def"));
        assert_eq!(input["row"]["name"], json!("x"));
    }

    #[test]
    fn test_prepare_test_input_creates_missing_row() {
        let input = prepare_test_input(json!({ "id": "row_1" }));
        assert_eq!(input["row"]["_id"], json!("row_1"));
    }

    #[test]
    fn test_prepare_test_input_passthrough() {
        let input = prepare_test_input(json!({ "fields": { "a": 1 } }));
        assert!(input.get("row").is_none());
    }
}
