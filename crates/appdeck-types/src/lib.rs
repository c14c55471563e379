// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document model for appdeck.
//!
//! This crate defines the document types stored in per-application
//! namespaces and the pure logic that operates on them:
//! - Application metadata documents (navigation, theme, versioning)
//! - Automation documents (trigger + ordered steps)
//! - Screens and layouts (navigation migration inputs)
//! - Identifier scheme (app/dev app pairing, document key prefixes)
//! - Field coercion table (empty-value substitution and parse-on-write)
//!
//! Everything here is serde-serializable and free of I/O; the store and
//! server crates build on these types.

#![deny(missing_docs)]

/// Application metadata document and navigation/theme settings.
pub mod application;

/// Automation documents: trigger, steps, input pruning, step diffing.
pub mod automation;

/// Field coercion table keyed by the closed field-type enumeration.
pub mod coercion;

/// Identifier generation, dev/prod pairing, and document key prefixes.
pub mod ids;

/// Screen and layout documents referenced by the navigation migration.
pub mod screen;
