// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the document store client.

/// Result type using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by document store operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document '{id}' not found in '{namespace}'")]
    NotFound {
        /// Namespace that was queried.
        namespace: String,
        /// Document key that was not found.
        id: String,
    },

    /// The namespace itself does not exist.
    #[error("namespace '{namespace}' does not exist")]
    NamespaceNotFound {
        /// The missing namespace.
        namespace: String,
    },

    /// A write carried a stale revision.
    #[error("revision conflict writing '{id}' in '{namespace}'")]
    Conflict {
        /// Namespace the write targeted.
        namespace: String,
        /// Document key the write targeted.
        id: String,
    },

    /// The supplied document body is not usable.
    #[error("invalid document: {reason}")]
    InvalidDocument {
        /// Why the document was rejected.
        reason: String,
    },

    /// Underlying database operation failed.
    #[error("database error during '{operation}': {details}")]
    Database {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl StoreError {
    /// Stable error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "DOC_NOT_FOUND",
            Self::NamespaceNotFound { .. } => "NAMESPACE_NOT_FOUND",
            Self::Conflict { .. } => "DOC_CONFLICT",
            Self::InvalidDocument { .. } => "INVALID_DOCUMENT",
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }

    /// Whether this error means "the thing is not there" rather than a
    /// failure. Callers that treat a missing document as a soft case
    /// branch on this instead of matching variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NamespaceNotFound { .. }
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Database {
            operation: "json".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StoreError::NotFound {
                namespace: "app_x".to_string(),
                id: "doc".to_string()
            }
            .error_code(),
            "DOC_NOT_FOUND"
        );
        assert_eq!(
            StoreError::Conflict {
                namespace: "app_x".to_string(),
                id: "doc".to_string()
            }
            .error_code(),
            "DOC_CONFLICT"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(
            StoreError::NamespaceNotFound {
                namespace: "app_x".to_string()
            }
            .is_not_found()
        );
        assert!(
            !StoreError::Database {
                operation: "query".to_string(),
                details: "boom".to_string()
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_display_messages() {
        let err = StoreError::Conflict {
            namespace: "app_dev_1".to_string(),
            id: "app_metadata".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "revision conflict writing 'app_metadata' in 'app_dev_1'"
        );
    }
}
