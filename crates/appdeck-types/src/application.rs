// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Application metadata document.
//!
//! Every application namespace holds exactly one metadata document under the
//! fixed key [`crate::ids::APP_METADATA_ID`]. The document carries display
//! metadata (name, url, navigation, theme), the client library version pair,
//! and the deploy status. The `locked_by` field is transient: it is sourced
//! from the advisory lock service when listing applications and must never
//! be persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Deploy status of an application namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    /// The editable development copy.
    Development,
    /// The published production copy.
    Published,
}

/// Status filter accepted by the application list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatusFilter {
    /// Development applications only.
    Development,
    /// Published applications only (the default).
    #[default]
    Published,
    /// Both halves of every pair.
    All,
}

/// A single navigation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    /// Route the link points at.
    pub url: String,
    /// Display text.
    pub text: String,
}

/// Application-level navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSettings {
    /// Navigation mode: `"Top"`, `"Left"` or `"None"`.
    pub navigation: String,
    /// Title shown in the navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Width class of the navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_width: Option<String>,
    /// Background color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_background: Option<String>,
    /// Text color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_text_color: Option<String>,
    /// Hide the logo in the navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_logo: Option<bool>,
    /// Hide the title in the navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_title: Option<bool>,
    /// Custom logo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Keep the bar visible while scrolling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky: Option<bool>,
    /// Ordered link list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<NavLink>,
}

impl NavigationSettings {
    /// Navigation settings applied to a freshly created application.
    pub fn default_for(name: &str) -> Self {
        Self {
            navigation: "Top".to_string(),
            title: Some(name.to_string()),
            nav_width: Some("Large".to_string()),
            nav_background: Some("var(--grey-100)".to_string()),
            nav_text_color: None,
            hide_logo: None,
            hide_title: None,
            logo_url: None,
            sticky: None,
            links: vec![NavLink {
                url: "/home".to_string(),
                text: "Home".to_string(),
            }],
        }
    }
}

/// User-customisable theme overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTheme {
    /// Border radius applied to buttons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_border_radius: Option<String>,
    /// Navigation bar background override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_background: Option<String>,
    /// Navigation bar text color override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_text_color: Option<String>,
}

/// Advisory lock holder annotation, sourced from the lock service.
///
/// Best-effort and possibly stale; never a concurrency guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
    /// Identifier of the user holding the lock.
    pub user_id: String,
    /// Email of the user, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the lock was taken (ISO-8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<String>,
}

/// The application metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Document key; always [`crate::ids::APP_METADATA_ID`].
    #[serde(rename = "_id")]
    pub id: String,
    /// Store revision of this document.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Identifier of the namespace this document lives in.
    pub app_id: String,
    /// Document type tag; always `"app"`.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Client library version the application is pinned to.
    pub version: String,
    /// Previous client library version, recorded by a client update so the
    /// update can be reverted. Cleared by a revert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revertable_version: Option<String>,
    /// Display name, unique per tenant within a status class.
    pub name: String,
    /// URL slug, unique per tenant within a status class.
    pub url: String,
    /// Owning tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Deploy status.
    pub status: AppStatus,
    /// Creation timestamp (ISO-8601).
    pub created_at: String,
    /// Last update timestamp (ISO-8601).
    pub updated_at: String,
    /// Template key the application was created from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Navigation settings; absent until configured or migrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationSettings>,
    /// Named base theme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Theme overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<CustomTheme>,
    /// Application icon descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    /// Per-automation error summaries recorded by production runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_errors: Option<BTreeMap<String, Value>>,
    /// Transient advisory lock annotation; never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<LockHolder>,
}

/// Derive the URL slug for an application.
///
/// The explicit url wins over the name. Path separators (forward and back
/// slashes) are stripped, the result is lower-cased and prefixed with a
/// single leading slash: name `"A/B App"` yields `/ab app`.
pub fn derive_app_url(url: Option<&str>, name: Option<&str>) -> Option<String> {
    let raw = url.filter(|u| !u.is_empty()).or(name)?;
    if raw.is_empty() {
        return None;
    }
    let stripped: String = raw.chars().filter(|c| *c != '/' && *c != '\\').collect();
    Some(format!("/{}", stripped).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derive_app_url_from_name() {
        assert_eq!(
            derive_app_url(None, Some("My App")),
            Some("/my app".to_string())
        );
        assert_eq!(
            derive_app_url(None, Some("A/B App")),
            Some("/ab app".to_string())
        );
        assert_eq!(
            derive_app_url(None, Some("back\\slash")),
            Some("/backslash".to_string())
        );
    }

    #[test]
    fn test_derive_app_url_explicit_wins() {
        assert_eq!(
            derive_app_url(Some("/Custom"), Some("My App")),
            Some("/custom".to_string())
        );
        // empty explicit url falls back to the name
        assert_eq!(
            derive_app_url(Some(""), Some("My App")),
            Some("/my app".to_string())
        );
    }

    #[test]
    fn test_derive_app_url_absent() {
        assert_eq!(derive_app_url(None, None), None);
    }

    #[test]
    fn test_application_serializes_camel_case() {
        let app = Application {
            id: crate::ids::APP_METADATA_ID.to_string(),
            rev: None,
            app_id: "app_dev_abc".to_string(),
            doc_type: "app".to_string(),
            version: "1.4.0".to_string(),
            revertable_version: None,
            name: "Test".to_string(),
            url: "/test".to_string(),
            tenant_id: None,
            status: AppStatus::Development,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
            template: None,
            navigation: Some(NavigationSettings::default_for("Test")),
            theme: Some("light".to_string()),
            custom_theme: None,
            icon: None,
            automation_errors: None,
            locked_by: None,
        };
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["_id"], json!("app_metadata"));
        assert_eq!(value["appId"], json!("app_dev_abc"));
        assert_eq!(value["status"], json!("development"));
        assert_eq!(value["navigation"]["navWidth"], json!("Large"));
        assert_eq!(value["navigation"]["links"][0]["url"], json!("/home"));
        // absent optionals are omitted entirely
        assert!(value.get("revertableVersion").is_none());
        assert!(value.get("lockedBy").is_none());
    }

    #[test]
    fn test_status_filter_default_is_published() {
        assert_eq!(AppStatusFilter::default(), AppStatusFilter::Published);
    }
}
