// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Static catalog of automation trigger and action definitions.
//!
//! The builder fetches these to populate its step picker. Deprecated
//! entries stay in the table so stored automations keep rendering, but they
//! are filtered out of every catalog response.

use serde_json::{Map, Value, json};

/// Trigger definitions keyed by catalog step id, deprecated entries
/// removed.
pub fn trigger_definitions() -> Map<String, Value> {
    filter_deprecated(raw_trigger_definitions())
}

/// Action definitions keyed by catalog step id, deprecated entries
/// removed.
pub fn action_definitions() -> Map<String, Value> {
    filter_deprecated(raw_action_definitions())
}

/// Combined catalog response: `{ "trigger": {...}, "action": {...} }`.
pub fn all_definitions() -> Value {
    json!({
        "trigger": trigger_definitions(),
        "action": action_definitions(),
    })
}

fn filter_deprecated(mut definitions: Map<String, Value>) -> Map<String, Value> {
    definitions.retain(|_, def| {
        !def.get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    });
    definitions
}

fn raw_trigger_definitions() -> Map<String, Value> {
    let defs = json!({
        "ROW_SAVED": {
            "name": "Row Created",
            "event": "row:save",
            "icon": "ri-save-line",
            "description": "Fires when a row is added to a table",
            "stepId": "ROW_SAVED",
            "type": "TRIGGER",
            "inputs": { "tableId": { "type": "table", "title": "Table" } },
        },
        "ROW_UPDATED": {
            "name": "Row Updated",
            "event": "row:update",
            "icon": "ri-refresh-line",
            "description": "Fires when a row is updated in a table",
            "stepId": "ROW_UPDATED",
            "type": "TRIGGER",
            "inputs": { "tableId": { "type": "table", "title": "Table" } },
        },
        "ROW_DELETED": {
            "name": "Row Deleted",
            "event": "row:delete",
            "icon": "ri-delete-bin-line",
            "description": "Fires when a row is deleted from a table",
            "stepId": "ROW_DELETED",
            "type": "TRIGGER",
            "inputs": { "tableId": { "type": "table", "title": "Table" } },
        },
        "WEBHOOK": {
            "name": "Webhook",
            "event": "web:trigger",
            "icon": "ri-global-line",
            "description": "Fires when an HTTP POST hits the generated endpoint",
            "stepId": "WEBHOOK",
            "type": "TRIGGER",
            "inputs": {
                "schemaUrl": { "type": "string", "title": "Schema URL" },
                "triggerUrl": { "type": "string", "title": "Trigger URL" },
            },
        },
        "APP_ACTION": {
            "name": "App Action",
            "event": "app:trigger",
            "icon": "ri-window-line",
            "description": "Fires when a component in the app triggers it",
            "stepId": "APP_ACTION",
            "type": "TRIGGER",
            "inputs": { "fields": { "type": "object", "title": "Fields" } },
        },
        "CRON": {
            "name": "Cron Trigger",
            "event": "cron:trigger",
            "icon": "ri-timer-line",
            "description": "Fires on a cron schedule",
            "stepId": "CRON",
            "type": "TRIGGER",
            "inputs": { "cron": { "type": "string", "title": "Expression" } },
        },
        // kept for stored automations, never offered to new ones
        "ROW_ACTION": {
            "name": "Row Action",
            "event": "row:action",
            "stepId": "ROW_ACTION",
            "type": "TRIGGER",
            "deprecated": true,
            "inputs": {},
        },
    });
    match defs {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn raw_action_definitions() -> Map<String, Value> {
    let defs = json!({
        "CREATE_ROW": {
            "name": "Create Row",
            "icon": "ri-add-line",
            "description": "Add a row to a table",
            "stepId": "CREATE_ROW",
            "type": "ACTION",
            "inputs": { "row": { "type": "object", "title": "Row" } },
        },
        "UPDATE_ROW": {
            "name": "Update Row",
            "icon": "ri-edit-line",
            "description": "Update a row in a table",
            "stepId": "UPDATE_ROW",
            "type": "ACTION",
            "inputs": {
                "rowId": { "type": "string", "title": "Row ID" },
                "row": { "type": "object", "title": "Row" },
            },
        },
        "DELETE_ROW": {
            "name": "Delete Row",
            "icon": "ri-delete-bin-line",
            "description": "Delete a row from a table",
            "stepId": "DELETE_ROW",
            "type": "ACTION",
            "inputs": {
                "tableId": { "type": "table", "title": "Table" },
                "id": { "type": "string", "title": "Row ID" },
            },
        },
        "SEND_EMAIL_SMTP": {
            "name": "Send Email",
            "icon": "ri-mail-line",
            "description": "Send an email through the configured SMTP server",
            "stepId": "SEND_EMAIL_SMTP",
            "type": "ACTION",
            "inputs": {
                "to": { "type": "string", "title": "To" },
                "subject": { "type": "string", "title": "Subject" },
                "contents": { "type": "string", "title": "Contents" },
            },
        },
        "SERVER_LOG": {
            "name": "Server Log",
            "icon": "ri-terminal-line",
            "description": "Write a message to the server log",
            "stepId": "SERVER_LOG",
            "type": "ACTION",
            "inputs": { "text": { "type": "string", "title": "Message" } },
        },
        "EXECUTE_SCRIPT": {
            "name": "JS Scripting",
            "icon": "ri-code-line",
            "description": "Run a JavaScript snippet",
            "stepId": "EXECUTE_SCRIPT",
            "type": "ACTION",
            "inputs": { "code": { "type": "string", "title": "Code" } },
        },
        "FILTER": {
            "name": "Condition",
            "icon": "ri-git-branch-line",
            "description": "Stop the automation unless the condition holds",
            "stepId": "FILTER",
            "type": "LOGIC",
            "inputs": {
                "field": { "type": "string", "title": "Value" },
                "condition": { "type": "string", "title": "Condition" },
                "value": { "type": "string", "title": "Comparison value" },
            },
        },
        "DELAY": {
            "name": "Delay",
            "icon": "ri-time-line",
            "description": "Pause the automation for a number of milliseconds",
            "stepId": "DELAY",
            "type": "LOGIC",
            "inputs": { "time": { "type": "number", "title": "Delay (ms)" } },
        },
        // superseded by the integration steps
        "OUTGOING_WEBHOOK": {
            "name": "Outgoing Webhook",
            "stepId": "OUTGOING_WEBHOOK",
            "type": "ACTION",
            "deprecated": true,
            "inputs": {},
        },
    });
    match defs {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_triggers_are_filtered() {
        let triggers = trigger_definitions();
        assert!(triggers.contains_key("WEBHOOK"));
        assert!(triggers.contains_key("ROW_SAVED"));
        assert!(!triggers.contains_key("ROW_ACTION"));
    }

    #[test]
    fn test_deprecated_actions_are_filtered() {
        let actions = action_definitions();
        assert!(actions.contains_key("CREATE_ROW"));
        assert!(!actions.contains_key("OUTGOING_WEBHOOK"));
    }

    #[test]
    fn test_combined_catalog_shape() {
        let all = all_definitions();
        assert!(all["trigger"]["CRON"].is_object());
        assert!(all["action"]["FILTER"].is_object());
    }
}
