use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgPool, Postgres};
use std::io::ErrorKind;

use crate::tenancy::{BoxedConnection, ConnectionError, ConnectionSource, SchemaConnection, ScopeTarget};
use super::manager::DatabaseManager;

impl From<sqlx::Error> for ConnectionError {
    fn from(err: sqlx::Error) -> Self {
        let message = err.to_string();
        if is_stale(&err) {
            ConnectionError::Stale(message)
        } else {
            ConnectionError::Failed(message)
        }
    }
}

/// Socket-level failures count as stale when the handle was closed underneath
/// us; server-reported failures only when the server says it closed the
/// connection.
fn is_stale(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolClosed => false,
        sqlx::Error::Io(io) => {
            matches!(
                io.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
                    | ErrorKind::NotConnected
            ) || socket_message_is_stale(&io.to_string())
        }
        other => server_message_is_stale(&other.to_string()),
    }
}

fn socket_message_is_stale(message: &str) -> bool {
    message.to_lowercase().contains("closed")
}

fn server_message_is_stale(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("server closed the connection") || message.contains("connection already closed")
}

/// Postgres handle that switches `search_path`. Acquires lazily so a
/// reconnect after `close` draws a fresh connection from the pool.
pub struct PgSchemaConnection {
    pool: PgPool,
    public_schema: String,
    conn: Option<PoolConnection<Postgres>>,
}

impl PgSchemaConnection {
    pub fn new(pool: PgPool, public_schema: String) -> Self {
        Self { pool, public_schema, conn: None }
    }

    fn live(&mut self) -> Result<&mut PoolConnection<Postgres>, ConnectionError> {
        self.conn
            .as_mut()
            .ok_or_else(|| ConnectionError::Stale("connection already closed".to_string()))
    }
}

#[async_trait]
impl SchemaConnection for PgSchemaConnection {
    async fn ensure_live(&mut self) -> Result<(), ConnectionError> {
        match self.conn.as_mut() {
            Some(conn) => conn.ping().await.map_err(ConnectionError::from),
            None => {
                let conn = self.pool.acquire().await?;
                self.conn = Some(conn);
                Ok(())
            }
        }
    }

    async fn set_scope(&mut self, target: &ScopeTarget) -> Result<(), ConnectionError> {
        let sql = match target {
            ScopeTarget::Public => DatabaseManager::search_path_sql(&[self.public_schema.as_str()]),
            ScopeTarget::Tenant(slug) => {
                DatabaseManager::search_path_sql(&[slug.as_str(), self.public_schema.as_str()])
            }
        };
        let conn = self.live()?;
        sqlx::query(&sql).execute(&mut **conn).await?;
        Ok(())
    }

    async fn reset_scope(&mut self) -> Result<(), ConnectionError> {
        let sql = DatabaseManager::search_path_sql(&[self.public_schema.as_str()]);
        let conn = self.live()?;
        sqlx::query(&sql).execute(&mut **conn).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Detached so the dead socket never returns to the pool
            if let Err(e) = conn.detach().close().await {
                tracing::debug!("Error while closing stale connection: {}", e);
            }
        }
    }

    async fn current_scope(&mut self) -> Result<String, ConnectionError> {
        let conn = self.live()?;
        let (schema,): (Option<String>,) = sqlx::query_as("SELECT current_schema()")
            .fetch_one(&mut **conn)
            .await?;
        Ok(schema.unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct PgConnectionSource {
    pool: PgPool,
    public_schema: String,
}

impl PgConnectionSource {
    pub fn new(pool: PgPool, public_schema: String) -> Self {
        Self { pool, public_schema }
    }
}

impl ConnectionSource for PgConnectionSource {
    fn checkout(&self) -> BoxedConnection {
        Box::new(PgSchemaConnection::new(self.pool.clone(), self.public_schema.clone()))
    }
}
