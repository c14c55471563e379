// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Appdeck server: application and automation management over a document
//! store.
//!
//! Applications are pairs of document namespaces (development and
//! production) linked by a deterministic id transform. This crate hosts the
//! HTTP API that creates, lists, updates, syncs and destroys those pairs
//! and manages the automation documents inside them. External platform
//! concerns (events, quotas, locks, webhook routing, workflow execution)
//! sit behind the trait seams in [`services`].

#![deny(missing_docs)]

/// Application lifecycle handlers.
pub mod application_handlers;

/// Automation handlers.
pub mod automation_handlers;

/// Static trigger/action definition catalog.
pub mod catalog;

/// Environment configuration.
pub mod config;

/// Seed documents for new application namespaces.
pub mod defaults;

/// API error types.
pub mod error;

/// HTTP router and server state.
pub mod server;

/// Trait seams for the surrounding platform.
pub mod services;

pub use self::config::{Config, ConfigError};
pub use self::error::{ApiError, Result};
pub use self::server::{ServerState, serve};
