// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Identifier scheme for applications and their documents.
//!
//! An application lives in a pair of document namespaces linked by a
//! deterministic identifier transform: the production namespace is
//! `app_<uuid>` and the development namespace is `app_dev_<uuid>`.
//! Documents inside a namespace are keyed by type prefix so that range
//! queries over a prefix enumerate one document type.

use uuid::Uuid;

/// Namespace prefix shared by all applications.
pub const APP_PREFIX: &str = "app_";

/// Infix marking the development half of an application pair.
pub const APP_DEV_INFIX: &str = "dev_";

/// Fixed key of the application metadata document inside its namespace.
pub const APP_METADATA_ID: &str = "app_metadata";

/// Key prefix for table documents.
pub const TABLE_PREFIX: &str = "table_";

/// Key prefix for row documents.
pub const ROW_PREFIX: &str = "row_";

/// Key prefix for layout documents.
pub const LAYOUT_PREFIX: &str = "layout_";

/// Key prefix for screen documents.
pub const SCREEN_PREFIX: &str = "screen_";

/// Key prefix for automation documents.
pub const AUTOMATION_PREFIX: &str = "automation_";

/// Key prefix for entity metadata documents (test inputs, test history).
pub const METADATA_PREFIX: &str = "metadata_";

/// Identifier of the private base layout consulted by the navigation
/// migration.
pub const BASE_LAYOUT_PRIVATE_ID: &str = "layout_private_master";

/// Highest key sentinel for prefix range queries. Any document key with the
/// given prefix sorts strictly below `prefix + UNICODE_MAX`.
pub const UNICODE_MAX: char = '\u{fff0}';

/// Generate a new production application identifier.
pub fn generate_app_id() -> String {
    format!("{}{}", APP_PREFIX, Uuid::new_v4().simple())
}

/// Convert an application identifier to its development counterpart.
///
/// Already-development identifiers are returned unchanged.
pub fn to_dev_app_id(app_id: &str) -> String {
    if is_dev_app_id(app_id) {
        return app_id.to_string();
    }
    match app_id.strip_prefix(APP_PREFIX) {
        Some(rest) => format!("{}{}{}", APP_PREFIX, APP_DEV_INFIX, rest),
        None => app_id.to_string(),
    }
}

/// Convert an application identifier to its production counterpart.
///
/// Already-production identifiers are returned unchanged.
pub fn to_prod_app_id(app_id: &str) -> String {
    match app_id.strip_prefix(APP_PREFIX) {
        Some(rest) => match rest.strip_prefix(APP_DEV_INFIX) {
            Some(inner) => format!("{}{}", APP_PREFIX, inner),
            None => app_id.to_string(),
        },
        None => app_id.to_string(),
    }
}

/// Whether the identifier names a development namespace.
pub fn is_dev_app_id(app_id: &str) -> bool {
    app_id.starts_with(&format!("{}{}", APP_PREFIX, APP_DEV_INFIX))
}

/// Generate a new automation document identifier.
pub fn generate_automation_id() -> String {
    format!("{}{}", AUTOMATION_PREFIX, Uuid::new_v4().simple())
}

/// Generate a new screen document identifier.
pub fn generate_screen_id() -> String {
    format!("{}{}", SCREEN_PREFIX, Uuid::new_v4().simple())
}

/// Generate a new table document identifier.
pub fn generate_table_id() -> String {
    format!("{}{}", TABLE_PREFIX, Uuid::new_v4().simple())
}

/// Generate a new row document identifier within a table.
pub fn generate_row_id(table_id: &str) -> String {
    format!("{}{}_{}", ROW_PREFIX, table_id, Uuid::new_v4().simple())
}

/// Key of the entity metadata document for a given metadata type and
/// entity identifier.
pub fn metadata_id(metadata_type: &str, entity_id: &str) -> String {
    format!("{}{}_{}", METADATA_PREFIX, metadata_type, entity_id)
}

/// Inclusive start / exclusive end key pair covering every document key
/// beginning with `prefix`.
pub fn prefix_range(prefix: &str) -> (String, String) {
    (prefix.to_string(), format!("{}{}", prefix, UNICODE_MAX))
}
