// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API error types.
//!
//! Controllers return typed failure variants instead of letting ambient
//! errors escape: validation problems, revision conflicts, quota breaches
//! and replication failures each map to a fixed HTTP status and a stable
//! error code string.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use appdeck_store::StoreError;

/// Result type using ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the API controllers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Request input failed validation (missing name, duplicate url, ...).
    #[error("{0}")]
    Validation(String),

    /// The requested application or automation does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A write carried a stale revision.
    #[error("{0}")]
    Conflict(String),

    /// A quota would be exceeded by the operation.
    #[error("{0}")]
    QuotaExceeded(String),

    /// Replication failed; cleanup already happened.
    #[error("app sync failed: {0}")]
    Replication(String),

    /// An external platform service is unavailable.
    #[error("upstream service failed: {0}")]
    Upstream(String),

    /// Document store failure that is not a user error.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl ApiError {
    /// Stable error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::QuotaExceeded(_) => "USAGE_LIMIT_EXCEEDED",
            Self::Replication(_) => "REPLICATION_FAILED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::QuotaExceeded(_) | Self::Replication(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } | StoreError::NamespaceNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            StoreError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            StoreError::InvalidDocument { .. } => ApiError::Validation(err.to_string()),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
