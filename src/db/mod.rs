// covidsync/src/db/mod.rs
pub(crate) mod state;
pub(crate) mod store;

use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{DatabaseConfig, DATABASE_URL_VAR};
use crate::errors::{AppError, Result};

/// Opens the process-wide connection pool and checks that catalog metadata is readable.
pub async fn bootstrap(db_config: &DatabaseConfig) -> Result<PgPool> {
    let url = db_config
        .url
        .as_deref()
        .ok_or(AppError::MissingDatabaseUrl(DATABASE_URL_VAR))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(db_config.connect_timeout)
        .connect(url)
        .await
        .map_err(AppError::Connection)?;

    let table_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pg_catalog.pg_tables")
        .fetch_one(&pool)
        .await
        .map_err(AppError::Connection)?;
    info!("Connected to postgres, {} tables visible in the catalog", table_count);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_url_is_fatal_before_connecting() {
        let result = bootstrap(&DatabaseConfig {
            url: None,
            connect_timeout: Duration::from_secs(1),
        })
        .await;
        assert!(matches!(result, Err(AppError::MissingDatabaseUrl("POSTGRES_POSTGRES"))));
    }

    #[tokio::test]
    async fn test_malformed_url_is_a_connection_error() {
        let result = bootstrap(&DatabaseConfig {
            url: Some("definitely not a url".to_string()),
            connect_timeout: Duration::from_secs(1),
        })
        .await;
        assert!(matches!(result, Err(AppError::Connection(_))));
    }
}
