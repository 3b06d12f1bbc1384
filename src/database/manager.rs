use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    /// The caller passed something that cannot be persisted (empty entity, nil id).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the process-wide connection pool from configuration.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Opens a pool and verifies one connection can be acquired.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;
        let pool = Self::pool_options(config).connect(&connection_string).await?;
        info!(max_connections = config.max_connections, "Created database pool");
        Ok(pool)
    }

    /// Pool that connects on first use. Lets the HTTP layer start while the store is down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;
        Ok(Self::pool_options(config).connect_lazy(&connection_string)?)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// `DATABASE_URL` wins; otherwise the URL is composed from host/port/user/password/name.
    pub fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if let Some(raw) = &config.url {
            let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
            return Ok(url.into());
        }

        if config.host.is_empty() {
            return Err(DatabaseError::ConfigMissing("DB_HOST"));
        }
        if config.name.is_empty() {
            return Err(DatabaseError::ConfigMissing("DB_NAME"));
        }

        let mut url = url::Url::parse("postgres://localhost").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_host(Some(&config.host)).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_port(Some(config.port)).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(&config.user).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !config.password.is_empty() {
            url.set_password(Some(&config.password)).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        url.set_path(&format!("/{}", config.name));
        Ok(url.into())
    }

    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
