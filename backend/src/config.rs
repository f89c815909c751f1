use anyhow::{anyhow, Context};
use std::env;

use crate::utils::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_statement_timeout_ms: u64,
    pub bind_addr: String,
    pub audit_log_default_limit: i64,
    pub audit_log_max_limit: i64,
    /// Empty means any origin.
    pub cors_allow_origins: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        if database_max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }
        let database_statement_timeout_ms =
            parse_or(&lookup, "DATABASE_STATEMENT_TIMEOUT_MS", 30_000u64)?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let audit_log_max_limit = parse_or(&lookup, "AUDIT_LOG_MAX_LIMIT", MAX_LIMIT)?;
        let audit_log_default_limit = parse_or(&lookup, "AUDIT_LOG_DEFAULT_LIMIT", DEFAULT_LIMIT)?;
        if audit_log_max_limit < 1 || audit_log_default_limit < 1 {
            return Err(anyhow!("audit log limits must be positive"));
        }
        if audit_log_default_limit > audit_log_max_limit {
            return Err(anyhow!(
                "AUDIT_LOG_DEFAULT_LIMIT ({}) exceeds AUDIT_LOG_MAX_LIMIT ({})",
                audit_log_default_limit,
                audit_log_max_limit
            ));
        }

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty() && *origin != "*")
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            database_url,
            database_max_connections,
            database_statement_timeout_ms,
            bind_addr,
            audit_log_default_limit,
            audit_log_max_limit,
            cors_allow_origins,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}
