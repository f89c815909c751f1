use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the pool; every connection carries the configured
/// `statement_timeout`.
pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let options = connect_options(config)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn connect_options(config: &Config) -> anyhow::Result<PgConnectOptions> {
    let timeout = config.database_statement_timeout_ms.to_string();
    Ok(PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", timeout.as_str())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_database_url_is_an_error() {
        let mut config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/procurement".into()),
            _ => None,
        })
        .expect("config");
        assert!(connect_options(&config).is_ok());
        config.database_url = "not a url".into();
        assert!(connect_options(&config).is_err());
    }
}
