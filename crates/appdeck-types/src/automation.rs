// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Automation documents.
//!
//! An automation is a stored workflow definition: one trigger plus an
//! ordered sequence of steps, each with an identifier, a catalog step type,
//! and a mapping of named inputs. Input values that are empty strings or
//! null are pruned before persistence so that downstream execution never
//! sees half-filled fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Catalog step type of the webhook trigger. Automations with a webhook
/// trigger get an entry in the webhook registry so inbound HTTP calls can
/// fire them.
pub const WEBHOOK_TRIGGER_STEP_ID: &str = "WEBHOOK";

/// One trigger or action step inside an automation definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStep {
    /// Unique identifier of this step within the automation.
    pub id: String,
    /// Catalog identifier of the step type (e.g. `"SEND_EMAIL"`).
    pub step_id: String,
    /// Named inputs for the step.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub inputs: Map<String, Value>,
    /// Catalog metadata carried on the document (icon, description, schema).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AutomationStep {
    /// Whether this step is a webhook-type trigger.
    pub fn is_webhook(&self) -> bool {
        self.step_id == WEBHOOK_TRIGGER_STEP_ID
    }
}

/// The trigger + steps definition of an automation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationDefinition {
    /// The single trigger; absent while the automation is being drafted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<AutomationStep>,
    /// Ordered action steps.
    #[serde(default)]
    pub steps: Vec<AutomationStep>,
}

/// The automation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    /// Document key.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Store revision.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Owning application identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Document type tag; always `"automation"` once persisted.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Trigger and steps.
    pub definition: AutomationDefinition,
    /// Deprecated flag; stripped on every write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,
    /// Anything else the builder stored on the document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Automation {
    /// Remove empty inputs from the trigger and every step, and drop the
    /// deprecated `live` property.
    ///
    /// An input is empty when its value is null or the empty string.
    pub fn clean_inputs(&mut self) {
        self.live = None;
        if let Some(trigger) = self.definition.trigger.as_mut() {
            prune_empty_inputs(&mut trigger.inputs);
        }
        for step in &mut self.definition.steps {
            prune_empty_inputs(&mut step.inputs);
        }
    }

    /// Identifier of the trigger step, if one is set.
    pub fn trigger_id(&self) -> Option<&str> {
        self.definition.trigger.as_ref().map(|t| t.id.as_str())
    }
}

fn prune_empty_inputs(inputs: &mut Map<String, Value>) {
    inputs.retain(|_, value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    });
}

/// Steps present in `new` but not in `old`, by step identifier.
pub fn new_steps<'a>(old: &AutomationDefinition, new: &'a AutomationDefinition) -> Vec<&'a AutomationStep> {
    let old_ids: Vec<&str> = old.steps.iter().map(|s| s.id.as_str()).collect();
    new.steps
        .iter()
        .filter(|s| !old_ids.contains(&s.id.as_str()))
        .collect()
}

/// Steps present in `old` but not in `new`, by step identifier.
pub fn deleted_steps<'a>(old: &'a AutomationDefinition, new: &AutomationDefinition) -> Vec<&'a AutomationStep> {
    let new_ids: Vec<&str> = new.steps.iter().map(|s| s.id.as_str()).collect();
    old.steps
        .iter()
        .filter(|s| !new_ids.contains(&s.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(id: &str) -> AutomationStep {
        AutomationStep {
            id: id.to_string(),
            step_id: "LOG".to_string(),
            ..Default::default()
        }
    }

    fn definition(step_ids: &[&str]) -> AutomationDefinition {
        AutomationDefinition {
            trigger: None,
            steps: step_ids.iter().map(|id| step(id)).collect(),
        }
    }

    #[test]
    fn test_step_diff() {
        let old = definition(&["1", "2", "3"]);
        let new = definition(&["2", "3", "4"]);

        let created: Vec<&str> = new_steps(&old, &new).iter().map(|s| s.id.as_str()).collect();
        let deleted: Vec<&str> = deleted_steps(&old, &new)
            .iter()
            .map(|s| s.id.as_str())
            .collect();

        assert_eq!(created, vec!["4"]);
        assert_eq!(deleted, vec!["1"]);
    }

    #[test]
    fn test_step_diff_no_change() {
        let old = definition(&["1", "2"]);
        let new = definition(&["1", "2"]);
        assert!(new_steps(&old, &new).is_empty());
        assert!(deleted_steps(&old, &new).is_empty());
    }

    #[test]
    fn test_clean_inputs_prunes_empty_values() {
        let mut trigger = step("trigger");
        trigger.inputs.insert("table".to_string(), json!("table_1"));
        trigger.inputs.insert("filter".to_string(), json!(""));

        let mut action = step("1");
        action.inputs.insert("to".to_string(), json!("a@b.c"));
        action.inputs.insert("cc".to_string(), Value::Null);
        action.inputs.insert("count".to_string(), json!(0));

        let mut automation = Automation {
            id: None,
            rev: None,
            app_id: None,
            doc_type: None,
            name: Some("test".to_string()),
            definition: AutomationDefinition {
                trigger: Some(trigger),
                steps: vec![action],
            },
            live: Some(true),
            extra: Map::new(),
        };
        automation.clean_inputs();

        let trigger = automation.definition.trigger.as_ref().unwrap();
        assert!(trigger.inputs.contains_key("table"));
        assert!(!trigger.inputs.contains_key("filter"));

        let action = &automation.definition.steps[0];
        assert!(action.inputs.contains_key("to"));
        assert!(!action.inputs.contains_key("cc"));
        // zero is a real value, not an empty one
        assert!(action.inputs.contains_key("count"));

        assert!(automation.live.is_none());
    }

    #[test]
    fn test_webhook_trigger_detection() {
        let mut trigger = step("t");
        assert!(!trigger.is_webhook());
        trigger.step_id = WEBHOOK_TRIGGER_STEP_ID.to_string();
        assert!(trigger.is_webhook());
    }

    #[test]
    fn test_round_trip_preserves_extra_fields() {
        let doc = json!({
            "_id": "automation_1",
            "_rev": "1-abc",
            "type": "automation",
            "name": "My automation",
            "definition": {
                "trigger": {"id": "t", "stepId": "ROW_SAVED", "icon": "ri-save-line"},
                "steps": []
            },
            "testData": {"row": {}}
        });
        let automation: Automation = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(automation.id.as_deref(), Some("automation_1"));
        assert_eq!(automation.trigger_id(), Some("t"));
        assert_eq!(automation.extra["testData"], json!({"row": {}}));

        let back = serde_json::to_value(&automation).unwrap();
        assert_eq!(back["definition"]["trigger"]["icon"], json!("ri-save-line"));
        assert_eq!(back["testData"], json!({"row": {}}));
    }
}
