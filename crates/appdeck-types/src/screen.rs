// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Screen and layout documents.
//!
//! Screens historically referenced a shared layout document; the navigation
//! migration removes that reference in favor of per-screen navigation and
//! width settings synthesized from the layout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::NavLink;

/// Routing information for a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRouting {
    /// Route the screen is served at.
    pub route: String,
    /// Role required to access the screen.
    pub role_id: String,
    /// Whether this is the role's home screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_screen: Option<bool>,
}

/// A screen document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    /// Document key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Store revision.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Reference to a shared layout; cleared by the navigation migration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    /// Whether the application navigation is shown on this screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_navigation: Option<bool>,
    /// Width class of the screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Routing information.
    pub routing: ScreenRouting,
    /// Component tree.
    #[serde(default)]
    pub props: Value,
    /// Anything else stored on the document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Properties of a layout document consulted by the navigation migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutProps {
    /// Navigation mode carried by the layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<String>,
    /// Navigation title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Width class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Hide the logo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_logo: Option<bool>,
    /// Hide the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_title: Option<bool>,
    /// Custom logo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Sticky navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky: Option<bool>,
    /// Link list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<NavLink>,
}

/// A layout document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Document key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Store revision.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Layout properties.
    #[serde(default)]
    pub props: LayoutProps,
    /// Anything else stored on the document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_screen_round_trip() {
        let doc = json!({
            "_id": "screen_1",
            "_rev": "2-xyz",
            "layoutId": "layout_private_master",
            "routing": {"route": "/home", "roleId": "BASIC", "homeScreen": true},
            "props": {"_component": "container"}
        });
        let screen: Screen = serde_json::from_value(doc).unwrap();
        assert_eq!(screen.layout_id.as_deref(), Some("layout_private_master"));
        assert_eq!(screen.routing.route, "/home");

        let back = serde_json::to_value(&screen).unwrap();
        assert_eq!(back["routing"]["roleId"], json!("BASIC"));
        assert!(back.get("showNavigation").is_none());
    }

    #[test]
    fn test_layout_props_default_when_missing() {
        let layout: Layout = serde_json::from_value(json!({"_id": "layout_1"})).unwrap();
        assert!(layout.props.navigation.is_none());
        assert!(layout.props.links.is_empty());
    }
}
