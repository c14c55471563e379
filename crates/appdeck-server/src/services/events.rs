// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Platform event emission.

use std::sync::Mutex;

use tracing::info;

/// Events emitted by the application and automation controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlatformEvent {
    /// An application was created.
    AppCreated {
        /// Application identifier.
        app_id: String,
    },
    /// An application was created from a template package.
    AppTemplateImported {
        /// Application identifier.
        app_id: String,
        /// Template key the application was created from.
        template_key: String,
    },
    /// An application was created from an uploaded document dump.
    AppFileImported {
        /// Application identifier.
        app_id: String,
    },
    /// Application metadata was updated.
    AppUpdated {
        /// Application identifier.
        app_id: String,
    },
    /// An application was fully deleted.
    AppDeleted {
        /// Application identifier.
        app_id: String,
    },
    /// A production application was unpublished.
    AppUnpublished {
        /// Application identifier.
        app_id: String,
    },
    /// The client library version was updated.
    AppVersionUpdated {
        /// Application identifier.
        app_id: String,
        /// Version before the update.
        from: String,
        /// Version after the update.
        to: String,
    },
    /// The client library version was reverted.
    AppVersionReverted {
        /// Application identifier.
        app_id: String,
        /// Version before the revert.
        from: String,
        /// Version after the revert.
        to: String,
    },
    /// An automation was created.
    AutomationCreated {
        /// Automation identifier.
        automation_id: String,
    },
    /// An automation was deleted.
    AutomationDeleted {
        /// Automation identifier.
        automation_id: String,
    },
    /// The identifying trigger of an automation changed.
    AutomationTriggerUpdated {
        /// Automation identifier.
        automation_id: String,
    },
    /// A step was added to an automation.
    AutomationStepCreated {
        /// Automation identifier.
        automation_id: String,
        /// Identifier of the added step.
        step_id: String,
    },
    /// A step was removed from an automation.
    AutomationStepDeleted {
        /// Automation identifier.
        automation_id: String,
        /// Identifier of the removed step.
        step_id: String,
    },
    /// An automation was test-executed from the builder.
    AutomationTested {
        /// Automation identifier.
        automation_id: String,
    },
}

impl PlatformEvent {
    /// Short name of the event kind, used for logging and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AppCreated { .. } => "app:created",
            Self::AppTemplateImported { .. } => "app:template-imported",
            Self::AppFileImported { .. } => "app:file-imported",
            Self::AppUpdated { .. } => "app:updated",
            Self::AppDeleted { .. } => "app:deleted",
            Self::AppUnpublished { .. } => "app:unpublished",
            Self::AppVersionUpdated { .. } => "app:version-updated",
            Self::AppVersionReverted { .. } => "app:version-reverted",
            Self::AutomationCreated { .. } => "automation:created",
            Self::AutomationDeleted { .. } => "automation:deleted",
            Self::AutomationTriggerUpdated { .. } => "automation:trigger-updated",
            Self::AutomationStepCreated { .. } => "automation:step-created",
            Self::AutomationStepDeleted { .. } => "automation:step-deleted",
            Self::AutomationTested { .. } => "automation:tested",
        }
    }
}

/// Sink for platform events. Emission is fire-and-forget; the platform's
/// event pipeline is not this service's concern.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event.
    async fn emit(&self, event: PlatformEvent);
}

/// Default sink: structured log lines.
pub struct LoggingEvents;

#[async_trait::async_trait]
impl EventSink for LoggingEvents {
    async fn emit(&self, event: PlatformEvent) {
        info!(kind = event.kind(), event = ?event, "Platform event");
    }
}

/// Sink that records every event, for tests.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<PlatformEvent>>,
}

impl RecordingEvents {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn recorded(&self) -> Vec<PlatformEvent> {
        self.events.lock().expect("events mutex").clone()
    }

    /// Kinds of everything emitted so far, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.recorded().iter().map(PlatformEvent::kind).collect()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingEvents {
    async fn emit(&self, event: PlatformEvent) {
        self.events.lock().expect("events mutex").push(event);
    }
}
