//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TALLY_PORT` | `8080` | HTTP listen port |
//! | `TALLY_DB_PATH` | `./tally.db` | SQLite database file |
//! | `TALLY_DB_MAX_CONNECTIONS` | `5` | Pool size |
//! | `TALLY_COST_BASIS` | `current` | `current` or `at_sale` for insights COGS |
//! | `TALLY_REFUND_MISSING_PRODUCT` | `skip` | `skip` or `fail` |
//! | `TALLY_ALLOW_INACTIVE_PRODUCTS` | `true` | Sell soft-deleted products |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tally_db::{DbConfig, EngineConfig};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// Ledger policies handed to the SalesLedger and InsightsService
    pub engine: EngineConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let config = ApiConfig {
            port: parse_or(&lookup, "TALLY_PORT", 8080)?,
            database_path: lookup("TALLY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./tally.db")),
            max_connections: parse_or(&lookup, "TALLY_DB_MAX_CONNECTIONS", 5)?,
            engine: EngineConfig {
                cost_basis: parse_or(&lookup, "TALLY_COST_BASIS", defaults.cost_basis)?,
                missing_product_on_refund: parse_or(
                    &lookup,
                    "TALLY_REFUND_MISSING_PRODUCT",
                    defaults.missing_product_on_refund,
                )?,
                allow_inactive_products: parse_or(
                    &lookup,
                    "TALLY_ALLOW_INACTIVE_PRODUCTS",
                    defaults.allow_inactive_products,
                )?,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Pool settings for [`tally_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        _ => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
