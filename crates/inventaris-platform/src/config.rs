use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use inventaris_registry::{BulkCodeStrategy, CodingConfig};

const DEFAULT_REFRESH_SECS: u64 = 3600;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub refresh_interval: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let refresh_secs = env_or("DEPRECIATION_REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        if refresh_secs == 0 {
            anyhow::bail!("DEPRECIATION_REFRESH_SECS must be positive");
        }

        Ok(Self {
            database_url,
            max_connections,
            refresh_interval: Duration::from_secs(refresh_secs),
        })
    }
}

/// Code allocation settings, each overridable from the environment.
pub fn load_coding_config() -> Result<CodingConfig> {
    let defaults = CodingConfig::default();

    let bulk_codes = match std::env::var("ASSET_BULK_CODES") {
        Ok(raw) => raw
            .parse::<BulkCodeStrategy>()
            .context("ASSET_BULK_CODES must be `range` or `suffixed`")?,
        Err(_) => defaults.bulk_codes,
    };

    let config = CodingConfig {
        sequence_width: env_or("ASSET_SEQUENCE_WIDTH", defaults.sequence_width)?,
        default_location_code: std::env::var("ASSET_DEFAULT_LOCATION_CODE")
            .unwrap_or(defaults.default_location_code),
        default_category_code: std::env::var("ASSET_DEFAULT_CATEGORY_CODE")
            .unwrap_or(defaults.default_category_code),
        bulk_codes,
        max_allocation_attempts: env_or(
            "ASSET_ALLOCATION_ATTEMPTS",
            defaults.max_allocation_attempts,
        )?,
    };

    config.validate().context("invalid asset coding configuration")?;
    Ok(config)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
