// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Application lifecycle handlers.
//!
//! These handlers manage the full lifecycle of an application pair:
//! - Create (blank, from a template, or from an uploaded document dump)
//! - List with status filtering and advisory lock annotations
//! - Fetch the builder definition and the full app package
//! - Patch metadata, update/revert the pinned client library version
//! - Destroy (full delete or unpublish of the production copy)
//! - Sync the production namespace back into the development one

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use appdeck_store::{AllDocsParams, DocumentStore, Replication};
use appdeck_types::application::{
    AppStatus, AppStatusFilter, Application, CustomTheme, NavigationSettings, derive_app_url,
};
use appdeck_types::ids;
use appdeck_types::screen::{Layout, Screen};

use crate::defaults;
use crate::error::{ApiError, Result};
use crate::services::{
    EventSink, LockService, MetadataCache, PlatformEvent, QuotaService, UserDirectory,
    WebhookRegistry,
};

/// Base theme applied to applications created without one.
const DEFAULT_THEME: &str = "spectrum--light";

/// Shared state for application handlers.
pub struct ApplicationHandlerState {
    /// Document store holding every application namespace.
    pub store: Arc<dyn DocumentStore>,
    /// Platform event sink.
    pub events: Arc<dyn EventSink>,
    /// Usage quota accounting.
    pub quotas: Arc<dyn QuotaService>,
    /// Advisory lock lookups for list annotations.
    pub locks: Arc<dyn LockService>,
    /// Application metadata cache.
    pub cache: Arc<dyn MetadataCache>,
    /// Webhook registry, cleared when an application is destroyed.
    pub webhooks: Arc<dyn WebhookRegistry>,
    /// Global user directory.
    pub directory: Arc<dyn UserDirectory>,
    /// When set, production-to-development sync is a no-op.
    pub disable_auto_sync: bool,
    /// Client library version shipped with this server.
    pub version: String,
}

// ============================================================================
// Request / response types
// ============================================================================

/// Body of the create-application request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppRequest {
    /// Display name; required.
    pub name: Option<String>,
    /// Explicit URL slug; derived from the name when absent.
    pub url: Option<String>,
    /// Key of a stored template to copy the namespace from.
    pub template_key: Option<String>,
    /// Inline JSON document dump to seed the namespace with.
    pub template_string: Option<String>,
    /// Seed the blank app with the sample dataset.
    #[serde(default)]
    pub sample_data: bool,
}

/// Query parameters of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchAppsRequest {
    /// Status filter; defaults to published.
    pub status: Option<AppStatusFilter>,
}

/// Builder definition of an application: its layouts and screens.
#[derive(Debug, Clone, Serialize)]
pub struct AppDefinitionResponse {
    /// Layout documents.
    pub layouts: Vec<Value>,
    /// Screen documents, filtered by role when one was given.
    pub screens: Vec<Value>,
}

/// Everything the client runtime needs to boot an application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPackageResponse {
    /// The application metadata document.
    pub application: Application,
    /// Layout documents.
    pub layouts: Vec<Value>,
    /// Screen documents.
    pub screens: Vec<Value>,
    /// Path the client library is served from.
    pub client_lib_path: String,
}

/// Plain message response.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

// ============================================================================
// Create
// ============================================================================

/// Handle application creation.
///
/// Validates the name and url, allocates the paired identifiers, seeds the
/// development namespace (template dump, stored template, or blank users
/// table), persists the metadata document and counts the new app against
/// the tenant quota. Template imports additionally count their rows; when
/// that breaches the row quota the freshly created app is destroyed again
/// and the quota error is surfaced.
#[instrument(skip(state, request), fields(name = request.name.as_deref().unwrap_or("")))]
pub async fn handle_create(
    state: &ApplicationHandlerState,
    request: CreateAppRequest,
) -> Result<Application> {
    // 1. Validate name and derive the url slug
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("App name must be provided".to_string()))?;
    let url = derive_app_url(request.url.as_deref(), Some(name))
        .ok_or_else(|| ApiError::Validation("App name must be provided".to_string()))?;
    assert_name_and_url_free(state, name, &url, AppStatus::Development, None).await?;

    // 2. Count the app before any namespace exists so a breach is cheap
    state.quotas.add_app().await?;

    let dev_app_id = match create_app(state, &request, name, &url).await {
        Ok(app_id) => app_id,
        Err(err) => {
            state.quotas.remove_app().await;
            return Err(err);
        }
    };

    // 3. Template and file imports bring their own rows; count them now and
    //    roll the whole creation back when the row quota is breached
    let imported = request.template_key.is_some() || request.template_string.is_some();
    if imported {
        let rows = state
            .store
            .count_prefix(&dev_app_id, ids::ROW_PREFIX)
            .await?;
        if rows > 0 {
            if let Err(err) = state.quotas.add_rows(rows).await {
                warn!(app_id = %dev_app_id, rows, "Row quota breached by import, rolling back");
                state.store.destroy(&dev_app_id).await?;
                state.quotas.remove_app().await;
                return Err(err);
            }
        }
    }

    // 4. Emit creation events
    if let Some(template_key) = &request.template_key {
        state
            .events
            .emit(PlatformEvent::AppTemplateImported {
                app_id: dev_app_id.clone(),
                template_key: template_key.clone(),
            })
            .await;
    } else if request.template_string.is_some() {
        state
            .events
            .emit(PlatformEvent::AppFileImported {
                app_id: dev_app_id.clone(),
            })
            .await;
    }
    state
        .events
        .emit(PlatformEvent::AppCreated {
            app_id: dev_app_id.clone(),
        })
        .await;

    let doc = state.store.get(&dev_app_id, ids::APP_METADATA_ID).await?;
    Ok(serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))?)
}

/// Allocate and seed the development namespace, then persist the metadata
/// document. Returns the development application identifier.
async fn create_app(
    state: &ApplicationHandlerState,
    request: &CreateAppRequest,
    name: &str,
    url: &str,
) -> Result<String> {
    // 1. Allocate the identifier pair and initialize the namespace
    let prod_app_id = ids::generate_app_id();
    let dev_app_id = ids::to_dev_app_id(&prod_app_id);
    state.store.create_namespace(&dev_app_id).await?;
    state.store.put(&dev_app_id, defaults::design_doc()).await?;

    // 2. Seed documents
    if let Some(dump) = &request.template_string {
        import_document_dump(state, &dev_app_id, dump).await?;
    } else if let Some(template_key) = &request.template_key {
        import_template(state, &dev_app_id, template_key).await?;
    } else {
        let mut seed = vec![defaults::users_table_doc()];
        if request.sample_data {
            seed.extend(defaults::sample_docs());
        }
        state.store.bulk_docs(&dev_app_id, seed).await?;
    }

    // 3. Imports may have brought a metadata document along; carry its
    //    revision and display settings forward instead of conflicting.
    //    A missing document is the normal blank-app case.
    let existing = state
        .store
        .try_get(&dev_app_id, ids::APP_METADATA_ID)
        .await?;

    let mut navigation = existing
        .as_ref()
        .and_then(|doc| doc.get("navigation"))
        .and_then(|nav| serde_json::from_value::<NavigationSettings>(nav.clone()).ok());
    if existing.is_some()
        && let Some(migrated) = migrate_app_navigation(state.store.as_ref(), &dev_app_id).await?
        && navigation.is_none()
    {
        navigation = Some(migrated);
    }

    let now = now_iso();
    let app = Application {
        id: ids::APP_METADATA_ID.to_string(),
        rev: existing
            .as_ref()
            .and_then(|doc| doc.get("_rev"))
            .and_then(Value::as_str)
            .map(str::to_string),
        app_id: dev_app_id.clone(),
        doc_type: "app".to_string(),
        version: state.version.clone(),
        revertable_version: None,
        name: name.to_string(),
        url: url.to_string(),
        tenant_id: None,
        status: AppStatus::Development,
        created_at: now.clone(),
        updated_at: now,
        template: request.template_key.clone(),
        navigation: Some(navigation.unwrap_or_else(|| NavigationSettings::default_for(name))),
        theme: existing
            .as_ref()
            .and_then(|doc| doc.get("theme"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(DEFAULT_THEME.to_string())),
        custom_theme: existing
            .as_ref()
            .and_then(|doc| doc.get("customTheme"))
            .and_then(|theme| serde_json::from_value::<CustomTheme>(theme.clone()).ok()),
        icon: existing
            .as_ref()
            .and_then(|doc| doc.get("icon"))
            .cloned(),
        automation_errors: None,
        locked_by: None,
    };

    let body = serde_json::to_value(&app).map_err(|e| ApiError::Store(e.into()))?;
    state.store.put(&dev_app_id, body).await?;
    state.cache.invalidate_app_metadata(&dev_app_id).await;

    info!(app_id = %dev_app_id, "Application created");
    Ok(dev_app_id)
}

/// Seed a namespace from an inline JSON document dump. The dump is either a
/// bare array of documents or an object with a `docs` array.
async fn import_document_dump(
    state: &ApplicationHandlerState,
    namespace: &str,
    dump: &str,
) -> Result<()> {
    let parsed: Value = serde_json::from_str(dump)
        .map_err(|e| ApiError::Validation(format!("Invalid app export: {e}")))?;
    let docs = match parsed {
        Value::Array(docs) => docs,
        Value::Object(mut obj) => match obj.remove("docs") {
            Some(Value::Array(docs)) => docs,
            _ => {
                return Err(ApiError::Validation(
                    "Invalid app export: expected a document list".to_string(),
                ));
            }
        },
        _ => {
            return Err(ApiError::Validation(
                "Invalid app export: expected a document list".to_string(),
            ));
        }
    };
    debug!(namespace, count = docs.len(), "Importing document dump");
    state.store.bulk_docs(namespace, docs).await?;
    Ok(())
}

/// Seed a namespace by replicating a stored template namespace into it.
async fn import_template(
    state: &ApplicationHandlerState,
    namespace: &str,
    template_key: &str,
) -> Result<()> {
    let source = format!("template_{template_key}");
    let mut replication = Replication::new(state.store.clone(), source, namespace.to_string());
    let outcome = replication.replicate().await;
    replication.close().await;
    match outcome {
        Ok(copied) => {
            debug!(namespace, template_key, copied, "Template imported");
            Ok(())
        }
        Err(err) if err.is_not_found() => Err(ApiError::Validation(format!(
            "Template {template_key} not found"
        ))),
        Err(err) => Err(err.into()),
    }
}

// ============================================================================
// Fetch / definition / package
// ============================================================================

/// Handle the application list request.
///
/// Filters by deploy status and annotates development apps with advisory
/// lock holders. The lock lookup is best-effort and never fails the list.
#[instrument(skip(state, request))]
pub async fn handle_fetch(
    state: &ApplicationHandlerState,
    request: FetchAppsRequest,
) -> Result<Vec<Application>> {
    let filter = request.status.unwrap_or_default();
    let mut apps = list_applications(state, filter).await?;

    let dev_ids: Vec<String> = apps
        .iter()
        .filter(|app| app.status == AppStatus::Development)
        .map(|app| app.app_id.clone())
        .collect();
    if !dev_ids.is_empty() {
        let locks: HashMap<_, _> = state.locks.locks_for(&dev_ids).await;
        for app in &mut apps {
            app.locked_by = locks.get(&app.app_id).cloned();
        }
    }
    Ok(apps)
}

/// Handle the builder definition request: layouts plus role-filtered
/// screens.
#[instrument(skip(state))]
pub async fn handle_fetch_definition(
    state: &ApplicationHandlerState,
    app_id: &str,
    role_id: Option<&str>,
) -> Result<AppDefinitionResponse> {
    if !state.store.exists(app_id).await? {
        return Err(ApiError::NotFound(format!("App {app_id} not found")));
    }
    let layouts = docs_with_prefix(state.store.as_ref(), app_id, ids::LAYOUT_PREFIX).await?;
    let mut screens = docs_with_prefix(state.store.as_ref(), app_id, ids::SCREEN_PREFIX).await?;
    if let Some(role_id) = role_id {
        screens.retain(|screen| {
            screen
                .get("routing")
                .and_then(|r| r.get("roleId"))
                .and_then(Value::as_str)
                .is_none_or(|r| r == role_id)
        });
    }
    Ok(AppDefinitionResponse { layouts, screens })
}

/// Handle the app package request: metadata, screens, layouts and the
/// client library path for the pinned version.
#[instrument(skip(state))]
pub async fn handle_fetch_package(
    state: &ApplicationHandlerState,
    app_id: &str,
) -> Result<AppPackageResponse> {
    let application = get_application(state, app_id).await?;
    let layouts = docs_with_prefix(state.store.as_ref(), app_id, ids::LAYOUT_PREFIX).await?;
    let screens = docs_with_prefix(state.store.as_ref(), app_id, ids::SCREEN_PREFIX).await?;
    let client_lib_path = format!("/api/assets/client?version={}", application.version);
    Ok(AppPackageResponse {
        application,
        layouts,
        screens,
        client_lib_path,
    })
}

// ============================================================================
// Update
// ============================================================================

/// Handle a metadata patch.
///
/// Name and url changes are re-validated for uniqueness against other apps
/// in the same status class. The patch is merged over the stored document;
/// null values delete their key.
#[instrument(skip(state, patch))]
pub async fn handle_update(
    state: &ApplicationHandlerState,
    app_id: &str,
    mut patch: Map<String, Value>,
) -> Result<Application> {
    let current = get_application(state, app_id).await?;

    // 1. Re-validate name/url when either changes
    let patch_name = patch.get("name").and_then(Value::as_str).map(str::to_string);
    let patch_url = patch.get("url").and_then(Value::as_str).map(str::to_string);
    if patch_name.is_some() || patch_url.is_some() {
        let name = patch_name.as_deref().unwrap_or(&current.name);
        let url = derive_app_url(patch_url.as_deref(), Some(name))
            .ok_or_else(|| ApiError::Validation("App name must be provided".to_string()))?;
        assert_name_and_url_free(state, name, &url, current.status, Some(app_id)).await?;
        patch.insert("url".to_string(), Value::String(url));
    }

    // 2. Merge and persist
    let updated = update_app_package(state, app_id, patch).await?;
    state
        .events
        .emit(PlatformEvent::AppUpdated {
            app_id: app_id.to_string(),
        })
        .await;
    Ok(updated)
}

/// Merge a patch over the stored metadata document and persist it.
///
/// The transient `lockedBy` annotation is never written, a stale `_rev` in
/// the patch is replaced with the stored one, and the metadata cache is
/// invalidated after the write.
pub async fn update_app_package(
    state: &ApplicationHandlerState,
    app_id: &str,
    patch: Map<String, Value>,
) -> Result<Application> {
    let stored = state.store.get(app_id, ids::APP_METADATA_ID).await?;
    let stored_rev = stored.get("_rev").and_then(Value::as_str).map(str::to_string);

    let mut merged = match stored {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    merged.remove("lockedBy");
    if let Some(rev) = stored_rev {
        merged.insert("_rev".to_string(), Value::String(rev));
    }
    merged.insert("updatedAt".to_string(), Value::String(now_iso()));

    state.store.put(app_id, Value::Object(merged)).await?;
    state.cache.invalidate_app_metadata(app_id).await;

    get_application(state, app_id).await
}

// ============================================================================
// Client version update / revert
// ============================================================================

/// Handle a client library version update: pin the app to the server's
/// version, recording the previous one so the update can be reverted.
#[instrument(skip(state))]
pub async fn handle_update_client(
    state: &ApplicationHandlerState,
    app_id: &str,
) -> Result<Application> {
    let current = get_application(state, app_id).await?;
    let from = current.version.clone();
    let to = state.version.clone();

    let mut patch = Map::new();
    patch.insert("revertableVersion".to_string(), Value::String(from.clone()));
    patch.insert("version".to_string(), Value::String(to.clone()));
    let updated = update_app_package(state, app_id, patch).await?;

    state
        .events
        .emit(PlatformEvent::AppVersionUpdated {
            app_id: app_id.to_string(),
            from,
            to,
        })
        .await;
    Ok(updated)
}

/// Handle a client library version revert: swap back to the recorded
/// previous version. Fails when no update was recorded.
#[instrument(skip(state))]
pub async fn handle_revert_client(
    state: &ApplicationHandlerState,
    app_id: &str,
) -> Result<Application> {
    let current = get_application(state, app_id).await?;
    let revertable = current.revertable_version.clone().ok_or_else(|| {
        ApiError::Validation("App has no version to revert to".to_string())
    })?;
    let from = current.version.clone();

    let mut patch = Map::new();
    patch.insert("version".to_string(), Value::String(revertable.clone()));
    // null deletes the key in the merge
    patch.insert("revertableVersion".to_string(), Value::Null);
    let updated = update_app_package(state, app_id, patch).await?;

    state
        .events
        .emit(PlatformEvent::AppVersionReverted {
            app_id: app_id.to_string(),
            from,
            to: revertable,
        })
        .await;
    Ok(updated)
}

// ============================================================================
// Destroy / unpublish
// ============================================================================

/// Handle application deletion.
///
/// With `unpublish` set only the production namespace is destroyed and the
/// app stays counted against the quota. A full delete destroys the given
/// namespace, releases the app quota, removes role bindings and emits the
/// deleted event. Row usage held by the destroyed namespace is released in
/// both cases.
#[instrument(skip(state))]
pub async fn handle_destroy(
    state: &ApplicationHandlerState,
    app_id: &str,
    unpublish: bool,
) -> Result<MessageResponse> {
    let namespace = if unpublish {
        ids::to_prod_app_id(app_id)
    } else {
        app_id.to_string()
    };
    if !state.store.exists(&namespace).await? {
        return Err(ApiError::NotFound(format!("App {namespace} not found")));
    }

    // 1. Record row usage before the namespace disappears
    let rows = state.store.count_prefix(&namespace, ids::ROW_PREFIX).await?;

    // 2. Drop the namespace and its webhook registrations
    state.store.destroy(&namespace).await?;
    if let Err(err) = state.webhooks.clear_app(&namespace).await {
        warn!(app_id = %namespace, error = %err, "Webhook cleanup failed");
    }
    state.cache.invalidate_app_metadata(&namespace).await;

    // 3. Quota and platform bookkeeping
    state.quotas.remove_rows(rows).await;
    if unpublish {
        state
            .events
            .emit(PlatformEvent::AppUnpublished {
                app_id: namespace.clone(),
            })
            .await;
        info!(app_id = %namespace, "Application unpublished");
        return Ok(MessageResponse {
            message: format!("App {namespace} unpublished."),
        });
    }

    state.quotas.remove_app().await;
    if let Err(err) = state
        .directory
        .remove_app_roles(&ids::to_prod_app_id(&namespace))
        .await
    {
        warn!(app_id = %namespace, error = %err, "Role cleanup failed");
    }
    state
        .events
        .emit(PlatformEvent::AppDeleted {
            app_id: namespace.clone(),
        })
        .await;
    info!(app_id = %namespace, "Application deleted");
    Ok(MessageResponse {
        message: format!("App {namespace} deleted."),
    })
}

// ============================================================================
// Sync
// ============================================================================

/// Handle a production-to-development sync.
///
/// Copies the deployed namespace back over the development one so both
/// halves agree, then resyncs the user directory. The replication handle is
/// released whether or not the copy succeeds.
#[instrument(skip(state))]
pub async fn handle_sync(
    state: &ApplicationHandlerState,
    app_id: &str,
) -> Result<MessageResponse> {
    if state.disable_auto_sync {
        return Ok(MessageResponse {
            message: "App sync disabled. You can re-enable it with the \
                      APPDECK_DISABLE_AUTO_SYNC environment variable."
                .to_string(),
        });
    }
    if !ids::is_dev_app_id(app_id) {
        return Err(ApiError::Validation(
            "This action cannot be performed for production apps".to_string(),
        ));
    }

    let prod_app_id = ids::to_prod_app_id(app_id);
    if !state.store.exists(&prod_app_id).await? {
        return Ok(MessageResponse {
            message: "App sync not required, app not deployed.".to_string(),
        });
    }

    let mut replication =
        Replication::new(state.store.clone(), prod_app_id.clone(), app_id.to_string());
    let outcome = replication.replicate().await;
    replication.close().await;
    let copied = outcome.map_err(|err| ApiError::Replication(err.to_string()))?;
    debug!(app_id, copied, "Production namespace replicated");

    state
        .directory
        .resync()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    Ok(MessageResponse {
        message: "App sync completed successfully.".to_string(),
    })
}

// ============================================================================
// Navigation migration
// ============================================================================

/// Migrate imported apps off shared layouts.
///
/// Screens that still reference a layout inherit its navigation visibility
/// and width and lose the reference. The private base layout, when present,
/// yields application-level navigation settings; a "None" mode there
/// becomes "Top" since the app bar is the only navigation left.
pub async fn migrate_app_navigation(
    store: &dyn DocumentStore,
    namespace: &str,
) -> Result<Option<NavigationSettings>> {
    let layout_docs = docs_with_prefix(store, namespace, ids::LAYOUT_PREFIX).await?;
    if layout_docs.is_empty() {
        return Ok(None);
    }
    let layouts: HashMap<String, Layout> = layout_docs
        .into_iter()
        .filter_map(|doc| serde_json::from_value::<Layout>(doc).ok())
        .map(|layout| (layout.id.clone(), layout))
        .collect();

    for doc in docs_with_prefix(store, namespace, ids::SCREEN_PREFIX).await? {
        let mut screen: Screen = match serde_json::from_value(doc) {
            Ok(screen) => screen,
            Err(err) => {
                warn!(namespace, error = %err, "Skipping unreadable screen");
                continue;
            }
        };
        let Some(layout_id) = screen.layout_id.take() else {
            continue;
        };
        if let Some(layout) = layouts.get(&layout_id) {
            screen.show_navigation = Some(layout.props.navigation.as_deref() != Some("None"));
            if layout.props.width.is_some() {
                screen.width = layout.props.width.clone();
            }
        }
        let body = serde_json::to_value(&screen).map_err(|e| ApiError::Store(e.into()))?;
        store.put(namespace, body).await?;
    }

    let Some(base) = layouts.get(ids::BASE_LAYOUT_PRIVATE_ID) else {
        return Ok(None);
    };
    let props = &base.props;
    let mode = match props.navigation.as_deref() {
        Some("None") | None => "Top",
        Some(mode) => mode,
    };
    Ok(Some(NavigationSettings {
        navigation: mode.to_string(),
        title: props.title.clone(),
        nav_width: props.width.clone(),
        nav_background: None,
        nav_text_color: None,
        hide_logo: props.hide_logo,
        hide_title: props.hide_title,
        logo_url: props.logo_url.clone(),
        sticky: props.sticky,
        links: props.links.clone(),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Read and parse the metadata document of an application.
pub async fn get_application(
    state: &ApplicationHandlerState,
    app_id: &str,
) -> Result<Application> {
    let doc = state.store.get(app_id, ids::APP_METADATA_ID).await?;
    serde_json::from_value(doc).map_err(|e| ApiError::Store(e.into()))
}

/// List every application matching a status filter.
async fn list_applications(
    state: &ApplicationHandlerState,
    filter: AppStatusFilter,
) -> Result<Vec<Application>> {
    let namespaces = state.store.list_namespaces(ids::APP_PREFIX).await?;
    let mut apps = Vec::new();
    for namespace in namespaces {
        let is_dev = ids::is_dev_app_id(&namespace);
        let wanted = match filter {
            AppStatusFilter::Development => is_dev,
            AppStatusFilter::Published => !is_dev,
            AppStatusFilter::All => true,
        };
        if !wanted {
            continue;
        }
        let Some(doc) = state.store.try_get(&namespace, ids::APP_METADATA_ID).await? else {
            continue;
        };
        match serde_json::from_value::<Application>(doc) {
            Ok(mut app) => {
                app.locked_by = None;
                apps.push(app);
            }
            Err(err) => {
                warn!(app_id = %namespace, error = %err, "Skipping unreadable app metadata");
            }
        }
    }
    Ok(apps)
}

/// Fail when another application in the same status class already uses the
/// name or url.
async fn assert_name_and_url_free(
    state: &ApplicationHandlerState,
    name: &str,
    url: &str,
    status: AppStatus,
    exclude_app_id: Option<&str>,
) -> Result<()> {
    let filter = match status {
        AppStatus::Development => AppStatusFilter::Development,
        AppStatus::Published => AppStatusFilter::Published,
    };
    let apps = list_applications(state, filter).await?;
    for app in apps {
        if exclude_app_id == Some(app.app_id.as_str()) {
            continue;
        }
        if app.name.eq_ignore_ascii_case(name) {
            return Err(ApiError::Validation(
                "App name is already in use".to_string(),
            ));
        }
        if app.url == url {
            return Err(ApiError::Validation(
                "App URL is already in use".to_string(),
            ));
        }
    }
    Ok(())
}

/// Fetch every document body under a key prefix.
async fn docs_with_prefix(
    store: &dyn DocumentStore,
    namespace: &str,
    prefix: &str,
) -> Result<Vec<Value>> {
    let rows = store.all_docs(namespace, AllDocsParams::prefix(prefix)).await?;
    Ok(rows.into_iter().filter_map(|row| row.doc).collect())
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_iso_shape() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert!(now.contains('T'));
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateAppRequest = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(!request.sample_data);
        assert!(request.template_key.is_none());
    }
}
