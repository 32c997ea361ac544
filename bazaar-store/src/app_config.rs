use bazaar_catalog::{LedgerSettings, StockPolicy};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Development mode: internal error detail is included in responses.
    #[serde(default)]
    pub expose_error_details: bool,
}

fn default_request_timeout() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Rate limiting is only switched on when `url` is set.
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
    #[serde(default = "default_rate_limit")]
    pub limit: i64,
    #[serde(default = "default_rate_window")]
    pub window_seconds: i64,
}

fn default_rate_limit() -> i64 { 100 }
fn default_rate_window() -> i64 { 60 }

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            limit: default_rate_limit(),
            window_seconds: default_rate_window(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    #[serde(default)]
    pub allow_negative_stock: bool,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,
}

fn default_low_stock_threshold() -> i32 {
    bazaar_catalog::inventory::DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            allow_negative_stock: false,
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

impl InventoryConfig {
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            policy: if self.allow_negative_stock {
                StockPolicy::AllowNegative
            } else {
                StockPolicy::RejectNegative
            },
            low_stock_threshold: self.low_stock_threshold,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `BAZAAR_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("BAZAAR").prefix_separator("_").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = parse(
            r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/bazaar"
            "#,
        );

        assert_eq!(config.server.request_timeout_seconds, 30);
        assert!(!config.server.expose_error_details);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.redis.url.is_none());
        assert!(!config.auth.enabled);

        let settings = config.inventory.ledger_settings();
        assert_eq!(settings.policy, StockPolicy::RejectNegative);
        assert_eq!(settings.low_stock_threshold, 10);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [server]
            port = 3000
            expose_error_details = true

            [database]
            url = "postgres://db/bazaar"

            [storage]
            backend = "memory"

            [redis]
            url = "redis://127.0.0.1/"
            limit = 5

            [inventory]
            allow_negative_stock = true
            low_stock_threshold = 3
            "#,
        );

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.redis.limit, 5);
        assert_eq!(config.redis.window_seconds, 60);
        let settings = config.inventory.ledger_settings();
        assert_eq!(settings.policy, StockPolicy::AllowNegative);
        assert_eq!(settings.low_stock_threshold, 3);
    }
}
