use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use super::connection::PgConnectionSource;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the single shared pool. Tenants are schemas inside one database,
/// so every request draws from the same pool and switches `search_path`.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
    public_schema: Arc<str>,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig, public_schema: &str) -> Result<Self, DatabaseError> {
        let url = match &config.url {
            Some(url) => url.clone(),
            None => std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?,
        };
        url::Url::parse(&url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let reset_sql: Arc<str> = Self::search_path_sql(&[public_schema]).into();

        // A connection only re-enters the pool once its search_path is back to
        // public; if the reset fails the pool closes it instead.
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .after_release(move |conn, _meta| {
                let reset_sql = Arc::clone(&reset_sql);
                Box::pin(async move {
                    sqlx::query(&reset_sql).execute(&mut *conn).await?;
                    Ok(true)
                })
            })
            .connect(&url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);

        Ok(Self {
            pool,
            public_schema: public_schema.into(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn public_schema(&self) -> &str {
        &self.public_schema
    }

    pub fn connection_source(&self) -> PgConnectionSource {
        PgConnectionSource::new(self.pool.clone(), self.public_schema.to_string())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Quote SQL identifier to prevent injection
    pub(crate) fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    pub(crate) fn search_path_sql(schemas: &[&str]) -> String {
        let quoted: Vec<String> = schemas.iter().map(|s| Self::quote_identifier(s)).collect();
        format!("SET search_path TO {}", quoted.join(", "))
    }
}
