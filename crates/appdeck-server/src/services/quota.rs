// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Usage quota accounting.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::ApiError;

/// Tracks application and row usage against tenant limits.
#[async_trait::async_trait]
pub trait QuotaService: Send + Sync {
    /// Count one new application. Fails when the application limit is hit.
    async fn add_app(&self) -> Result<(), ApiError>;

    /// Release one application's quota.
    async fn remove_app(&self);

    /// Count `count` new rows. Fails when the row limit would be exceeded.
    async fn add_rows(&self, count: i64) -> Result<(), ApiError>;

    /// Release `count` rows of quota.
    async fn remove_rows(&self, count: i64);
}

/// In-process quota accounting with optional limits (0 = unlimited).
pub struct InMemoryQuota {
    max_apps: i64,
    max_rows: i64,
    apps: AtomicI64,
    rows: AtomicI64,
}

impl InMemoryQuota {
    /// Create a quota service with the given limits; 0 disables a limit.
    pub fn new(max_apps: i64, max_rows: i64) -> Self {
        Self {
            max_apps,
            max_rows,
            apps: AtomicI64::new(0),
            rows: AtomicI64::new(0),
        }
    }

    /// Unlimited quota.
    pub fn unlimited() -> Self {
        Self::new(0, 0)
    }

    /// Current application count.
    pub fn app_usage(&self) -> i64 {
        self.apps.load(Ordering::SeqCst)
    }

    /// Current row count.
    pub fn row_usage(&self) -> i64 {
        self.rows.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QuotaService for InMemoryQuota {
    async fn add_app(&self) -> Result<(), ApiError> {
        let next = self.apps.fetch_add(1, Ordering::SeqCst) + 1;
        if self.max_apps > 0 && next > self.max_apps {
            self.apps.fetch_sub(1, Ordering::SeqCst);
            return Err(ApiError::QuotaExceeded(format!(
                "Application limit of {} reached",
                self.max_apps
            )));
        }
        Ok(())
    }

    async fn remove_app(&self) {
        self.apps.fetch_sub(1, Ordering::SeqCst);
    }

    async fn add_rows(&self, count: i64) -> Result<(), ApiError> {
        let next = self.rows.fetch_add(count, Ordering::SeqCst) + count;
        if self.max_rows > 0 && next > self.max_rows {
            self.rows.fetch_sub(count, Ordering::SeqCst);
            return Err(ApiError::QuotaExceeded(format!(
                "Row limit of {} exceeded",
                self.max_rows
            )));
        }
        Ok(())
    }

    async fn remove_rows(&self, count: i64) {
        self.rows.fetch_sub(count, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_quota_never_fails() {
        let quota = InMemoryQuota::unlimited();
        for _ in 0..100 {
            quota.add_app().await.unwrap();
        }
        quota.add_rows(1_000_000).await.unwrap();
    }

    #[tokio::test]
    async fn test_app_limit() {
        let quota = InMemoryQuota::new(2, 0);
        quota.add_app().await.unwrap();
        quota.add_app().await.unwrap();
        let err = quota.add_app().await.unwrap_err();
        assert!(matches!(err, ApiError::QuotaExceeded(_)));
        assert_eq!(quota.app_usage(), 2);

        quota.remove_app().await;
        quota.add_app().await.unwrap();
    }

    #[tokio::test]
    async fn test_row_limit_rolls_back_on_failure() {
        let quota = InMemoryQuota::new(0, 10);
        quota.add_rows(8).await.unwrap();
        let err = quota.add_rows(5).await.unwrap_err();
        assert!(matches!(err, ApiError::QuotaExceeded(_)));
        // failed addition must not count
        assert_eq!(quota.row_usage(), 8);

        quota.remove_rows(4).await;
        quota.add_rows(5).await.unwrap();
    }
}
