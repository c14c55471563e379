// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;

/// Appdeck server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path or connection URL for the document store
    pub database_url: String,
    /// HTTP server address
    pub http_addr: SocketAddr,
    /// Disable automatic production-to-development sync
    pub disable_auto_sync: bool,
    /// Maximum number of applications (0 = unlimited)
    pub max_apps: i64,
    /// Maximum number of rows across applications (0 = unlimited)
    pub max_rows: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `APPDECK_DATABASE_URL`: SQLite database path
    ///
    /// Optional (with defaults):
    /// - `APPDECK_HTTP_PORT`: HTTP server port (default: 7100)
    /// - `APPDECK_DISABLE_AUTO_SYNC`: disable prod-to-dev sync (default: false)
    /// - `APPDECK_MAX_APPS`: application quota, 0 = unlimited (default: 0)
    /// - `APPDECK_MAX_ROWS`: row quota, 0 = unlimited (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("APPDECK_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("APPDECK_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("APPDECK_HTTP_PORT")
            .unwrap_or_else(|_| "7100".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("APPDECK_HTTP_PORT", "must be a valid port number")
            })?;

        let disable_auto_sync = match std::env::var("APPDECK_DISABLE_AUTO_SYNC")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            .as_str()
        {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" | "" => false,
            _ => {
                return Err(ConfigError::Invalid(
                    "APPDECK_DISABLE_AUTO_SYNC",
                    "must be a boolean",
                ));
            }
        };

        let max_apps: i64 = std::env::var("APPDECK_MAX_APPS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("APPDECK_MAX_APPS", "must be a non-negative integer"))?;

        let max_rows: i64 = std::env::var("APPDECK_MAX_ROWS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("APPDECK_MAX_ROWS", "must be a non-negative integer"))?;

        if max_apps < 0 {
            return Err(ConfigError::Invalid(
                "APPDECK_MAX_APPS",
                "must be a non-negative integer",
            ));
        }
        if max_rows < 0 {
            return Err(ConfigError::Invalid(
                "APPDECK_MAX_ROWS",
                "must be a non-negative integer",
            ));
        }

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            disable_auto_sync,
            max_apps,
            max_rows,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("APPDECK_DATABASE_URL", ".data/appdeck.db");
        guard.remove("APPDECK_HTTP_PORT");
        guard.remove("APPDECK_DISABLE_AUTO_SYNC");
        guard.remove("APPDECK_MAX_APPS");
        guard.remove("APPDECK_MAX_ROWS");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, ".data/appdeck.db");
        assert_eq!(config.http_addr.port(), 7100);
        assert!(!config.disable_auto_sync);
        assert_eq!(config.max_apps, 0);
        assert_eq!(config.max_rows, 0);
    }

    #[test]
    fn test_config_from_env_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("APPDECK_DATABASE_URL", "/var/lib/appdeck/docs.db");
        guard.set("APPDECK_HTTP_PORT", "8080");
        guard.set("APPDECK_DISABLE_AUTO_SYNC", "true");
        guard.set("APPDECK_MAX_APPS", "25");
        guard.set("APPDECK_MAX_ROWS", "10000");

        let config = Config::from_env().unwrap();

        assert_eq!(config.http_addr.port(), 8080);
        assert!(config.disable_auto_sync);
        assert_eq!(config.max_apps, 25);
        assert_eq!(config.max_rows, 10000);
    }

    #[test]
    fn test_config_missing_database_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("APPDECK_DATABASE_URL");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Missing("APPDECK_DATABASE_URL"))
        ));
    }

    #[test]
    fn test_config_invalid_port() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("APPDECK_DATABASE_URL", ".data/appdeck.db");
        guard.set("APPDECK_HTTP_PORT", "not_a_number");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid("APPDECK_HTTP_PORT", _))
        ));
    }

    #[test]
    fn test_config_invalid_sync_toggle() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("APPDECK_DATABASE_URL", ".data/appdeck.db");
        guard.set("APPDECK_DISABLE_AUTO_SYNC", "maybe");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid("APPDECK_DISABLE_AUTO_SYNC", _))
        ));
    }

    #[test]
    fn test_config_negative_quota() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("APPDECK_DATABASE_URL", ".data/appdeck.db");
        guard.set("APPDECK_MAX_ROWS", "-5");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid("APPDECK_MAX_ROWS", _))
        ));
    }
}
