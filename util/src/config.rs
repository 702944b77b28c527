//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

use crate::time_zone::SampleTimeZone;

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub metrics_api_url: String,
    pub metrics_fetch_timeout_secs: u64,
    pub ingest_interval_secs: u64,
    pub ingest_enabled: bool,
    pub time_zone: SampleTimeZone,
    pub agent_host: String,
    pub agent_port: u16,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag_or(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or malformed values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "metrics-dashboard"),
            log_level: var_or("LOG_LEVEL", "api=info,services=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: flag_or("LOG_TO_STDOUT", false),
            database_path: var_or("DATABASE_PATH", "data/metrics.db"),
            host: var_or("HOST", "127.0.0.1"),
            port: parsed_or("PORT", 7000),
            metrics_api_url: var_or("METRICS_API_URL", "http://127.0.0.1:8000/metrics"),
            metrics_fetch_timeout_secs: parsed_or("METRICS_FETCH_TIMEOUT_SECS", 30),
            ingest_interval_secs: parsed_or("INGEST_INTERVAL_SECS", 60),
            ingest_enabled: flag_or("INGEST_ENABLED", true),
            time_zone: parsed_or("TIME_ZONE", SampleTimeZone::Utc),
            agent_host: var_or("AGENT_HOST", "0.0.0.0"),
            agent_port: parsed_or("AGENT_PORT", 8000),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_metrics_api_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.metrics_api_url = value.into());
    }

    pub fn set_metrics_fetch_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.metrics_fetch_timeout_secs = value);
    }

    pub fn set_ingest_interval_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.ingest_interval_secs = value);
    }

    pub fn set_ingest_enabled(value: bool) {
        AppConfig::set_field(|cfg| cfg.ingest_enabled = value);
    }

    pub fn set_time_zone(value: SampleTimeZone) {
        AppConfig::set_field(|cfg| cfg.time_zone = value);
    }
}

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn metrics_api_url() -> String {
    AppConfig::global().metrics_api_url.clone()
}

pub fn metrics_fetch_timeout_secs() -> u64 {
    AppConfig::global().metrics_fetch_timeout_secs
}

pub fn ingest_interval_secs() -> u64 {
    AppConfig::global().ingest_interval_secs
}

pub fn ingest_enabled() -> bool {
    AppConfig::global().ingest_enabled
}

pub fn time_zone() -> SampleTimeZone {
    AppConfig::global().time_zone
}

pub fn agent_host() -> String {
    AppConfig::global().agent_host.clone()
}

pub fn agent_port() -> u16 {
    AppConfig::global().agent_port
}
