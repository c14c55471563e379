// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Appdeck server binary.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use appdeck_server::{Config, ServerState};
use appdeck_store::SqliteDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        addr = %config.http_addr,
        database = %config.database_url,
        "Starting appdeck server"
    );

    let store = Arc::new(SqliteDocumentStore::from_path(&config.database_url).await?);
    let state = Arc::new(ServerState::new(store, &config));

    appdeck_server::serve(state, config.http_addr).await
}
