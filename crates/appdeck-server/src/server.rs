// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP server wiring.
//!
//! Thin axum layer over the application and automation handlers. Routes
//! extract their inputs, delegate to a `handle_*` function and wrap the
//! result; every error path goes through [`ApiError`]'s `IntoResponse`.
//!
//! Application routes carry the app id in the path. Automation routes
//! operate inside the app named by the `x-appdeck-app-id` header, matching
//! the builder's session behavior.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use appdeck_store::DocumentStore;
use appdeck_types::automation::Automation;

use crate::application_handlers::{
    self, ApplicationHandlerState, CreateAppRequest, FetchAppsRequest,
};
use crate::automation_handlers::{self, AutomationHandlerState};
use crate::catalog;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::services::{
    InMemoryCache, InMemoryQuota, InMemoryWebhooks, LocalTriggerRunner, LoggingEvents, NoLocks,
    NoopLogStore, RecordingDirectory,
};

/// Header carrying the application context for automation routes.
pub const APP_ID_HEADER: &str = "x-appdeck-app-id";

/// Shared state behind every route.
pub struct ServerState {
    /// Application lifecycle handlers.
    pub applications: ApplicationHandlerState,
    /// Automation handlers.
    pub automations: AutomationHandlerState,
}

impl ServerState {
    /// Wire up a server state over a document store with the in-process
    /// default services.
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let events = Arc::new(LoggingEvents);
        let cache = Arc::new(InMemoryCache::new());
        let webhooks = Arc::new(InMemoryWebhooks::new());
        let version = env!("CARGO_PKG_VERSION").to_string();

        Self {
            applications: ApplicationHandlerState {
                store: store.clone(),
                events: events.clone(),
                quotas: Arc::new(InMemoryQuota::new(config.max_apps, config.max_rows)),
                locks: Arc::new(NoLocks),
                cache: cache.clone(),
                webhooks: webhooks.clone(),
                directory: Arc::new(RecordingDirectory::new()),
                disable_auto_sync: config.disable_auto_sync,
                version,
            },
            automations: AutomationHandlerState {
                store,
                events,
                cache,
                webhooks,
                runner: Arc::new(LocalTriggerRunner),
                logs: Arc::new(NoopLogStore),
            },
        }
    }
}

/// Build the full API router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/applications", get(fetch_apps).post(create_app))
        .route(
            "/api/applications/{app_id}",
            put(update_app).delete(destroy_app),
        )
        .route("/api/applications/{app_id}/definition", get(app_definition))
        .route("/api/applications/{app_id}/appPackage", get(app_package))
        .route(
            "/api/applications/{app_id}/client/update",
            post(update_client),
        )
        .route(
            "/api/applications/{app_id}/client/revert",
            post(revert_client),
        )
        .route("/api/applications/{app_id}/sync", post(sync_app))
        .route(
            "/api/automations",
            get(fetch_automations).post(save_automation).put(save_automation),
        )
        .route("/api/automations/{automation_id}", get(find_automation))
        .route(
            "/api/automations/{automation_id}/{rev}",
            delete(destroy_automation),
        )
        .route(
            "/api/automations/{automation_id}/trigger",
            post(trigger_automation),
        )
        .route("/api/automations/{automation_id}/test", post(test_automation))
        .route(
            "/api/automations/definitions/{kind}",
            get(automation_definitions),
        )
        .route("/api/automations/logs/search", post(search_logs))
        .route("/api/automations/logs", delete(clear_log_error))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<ServerState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Appdeck server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn app_id_from_headers(headers: &HeaderMap) -> Result<String> {
    headers
        .get(APP_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation(format!("{APP_ID_HEADER} header is required")))
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": state.applications.version,
    }))
}

async fn fetch_apps(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<FetchAppsRequest>,
) -> Result<impl IntoResponse> {
    let apps = application_handlers::handle_fetch(&state.applications, query).await?;
    Ok(Json(apps))
}

async fn create_app(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CreateAppRequest>,
) -> Result<impl IntoResponse> {
    let app = application_handlers::handle_create(&state.applications, request).await?;
    Ok(Json(app))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionQuery {
    role_id: Option<String>,
}

async fn app_definition(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
    Query(query): Query<DefinitionQuery>,
) -> Result<impl IntoResponse> {
    let definition = application_handlers::handle_fetch_definition(
        &state.applications,
        &app_id,
        query.role_id.as_deref(),
    )
    .await?;
    Ok(Json(definition))
}

async fn app_package(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse> {
    let package =
        application_handlers::handle_fetch_package(&state.applications, &app_id).await?;
    Ok(Json(package))
}

async fn update_app(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<impl IntoResponse> {
    let app = application_handlers::handle_update(&state.applications, &app_id, patch).await?;
    Ok(Json(app))
}

async fn update_client(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse> {
    let app = application_handlers::handle_update_client(&state.applications, &app_id).await?;
    Ok(Json(app))
}

async fn revert_client(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse> {
    let app = application_handlers::handle_revert_client(&state.applications, &app_id).await?;
    Ok(Json(app))
}

#[derive(Deserialize)]
struct DestroyQuery {
    #[serde(default)]
    unpublish: bool,
}

async fn destroy_app(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
    Query(query): Query<DestroyQuery>,
) -> Result<impl IntoResponse> {
    let message =
        application_handlers::handle_destroy(&state.applications, &app_id, query.unpublish)
            .await?;
    Ok(Json(message))
}

async fn sync_app(
    State(state): State<Arc<ServerState>>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse> {
    let message = application_handlers::handle_sync(&state.applications, &app_id).await?;
    Ok(Json(message))
}

async fn save_automation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(automation): Json<Automation>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let saved =
        automation_handlers::handle_save(&state.automations, &app_id, automation).await?;
    Ok(Json(saved))
}

async fn fetch_automations(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let automations = automation_handlers::handle_fetch(&state.automations, &app_id).await?;
    Ok(Json(automations))
}

async fn find_automation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Path(automation_id): Path<String>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let automation =
        automation_handlers::handle_find(&state.automations, &app_id, &automation_id).await?;
    Ok(Json(automation))
}

async fn destroy_automation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Path((automation_id, rev)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let message =
        automation_handlers::handle_destroy(&state.automations, &app_id, &automation_id, &rev)
            .await?;
    Ok(Json(message))
}

async fn trigger_automation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Path(automation_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let message = automation_handlers::handle_trigger(
        &state.automations,
        &app_id,
        &automation_id,
        payload,
    )
    .await?;
    Ok(Json(message))
}

async fn test_automation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Path(automation_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let result =
        automation_handlers::handle_test(&state.automations, &app_id, &automation_id, payload)
            .await?;
    Ok(Json(result))
}

async fn automation_definitions(Path(kind): Path<String>) -> Result<impl IntoResponse> {
    let body = match kind.as_str() {
        "trigger" => Value::Object(catalog::trigger_definitions()),
        "action" => Value::Object(catalog::action_definitions()),
        "list" => catalog::all_definitions(),
        other => {
            return Err(ApiError::NotFound(format!(
                "Unknown definition catalog: {other}"
            )));
        }
    };
    Ok(Json(body))
}

async fn search_logs(
    State(state): State<Arc<ServerState>>,
    Json(query): Json<Value>,
) -> Result<impl IntoResponse> {
    let results = automation_handlers::handle_log_search(&state.automations, query).await?;
    Ok(Json(results))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearLogQuery {
    automation_id: Option<String>,
}

async fn clear_log_error(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<ClearLogQuery>,
) -> Result<impl IntoResponse> {
    let app_id = app_id_from_headers(&headers)?;
    let message = automation_handlers::handle_clear_log_error(
        &state.automations,
        &app_id,
        query.automation_id.as_deref(),
    )
    .await?;
    Ok(Json(message))
}
