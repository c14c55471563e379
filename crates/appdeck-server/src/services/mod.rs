// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Trait seams for the surrounding platform.
//!
//! The controllers in this crate are glue: the platform around them owns
//! eventing, quotas, advisory locks, metadata caching, webhook routing,
//! workflow execution and the user directory. Each of those concerns is a
//! trait here with an in-process default so the server runs standalone and
//! tests can observe side effects.

pub mod cache;
pub mod directory;
pub mod events;
pub mod locks;
pub mod logs;
pub mod quota;
pub mod runner;
pub mod webhooks;

pub use self::cache::{InMemoryCache, MetadataCache};
pub use self::directory::{RecordingDirectory, UserDirectory};
pub use self::events::{EventSink, LoggingEvents, PlatformEvent, RecordingEvents};
pub use self::locks::{InMemoryLocks, LockService, NoLocks};
pub use self::logs::{AutomationLogStore, NoopLogStore};
pub use self::quota::{InMemoryQuota, QuotaService};
pub use self::runner::{LocalTriggerRunner, TriggerRunner};
pub use self::webhooks::{InMemoryWebhooks, WebhookRegistry};
