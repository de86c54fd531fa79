use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use super::classifier::ScopeTarget;

pub const DEFAULT_STALE_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The remote end closed the socket (idle eviction, serverless freeze).
    #[error("stale connection: {0}")]
    Stale(String),

    #[error("connection error: {0}")]
    Failed(String),
}

impl ConnectionError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ConnectionError::Stale(_))
    }
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("could not bind scope '{target}' after {attempts} attempts: {last}")]
    StaleConnection {
        target: ScopeTarget,
        attempts: u32,
        last: ConnectionError,
    },

    #[error("could not bind scope '{target}': {source}")]
    BindFailure {
        target: ScopeTarget,
        #[source]
        source: ConnectionError,
    },
}

/// One pooled database handle whose active schema can be switched.
#[async_trait]
pub trait SchemaConnection: Send {
    /// Opens a fresh handle if none is held, otherwise checks the held one.
    async fn ensure_live(&mut self) -> Result<(), ConnectionError>;

    async fn set_scope(&mut self, target: &ScopeTarget) -> Result<(), ConnectionError>;

    /// Returns the handle to the neutral public scope.
    async fn reset_scope(&mut self) -> Result<(), ConnectionError>;

    /// Drops the underlying handle without returning it to the pool.
    async fn close(&mut self);

    /// Schema currently first on the search path.
    async fn current_scope(&mut self) -> Result<String, ConnectionError>;
}

pub type BoxedConnection = Box<dyn SchemaConnection>;

pub trait ConnectionSource: Send + Sync {
    /// Hands out an unbound connection; no I/O happens until `ensure_live`.
    fn checkout(&self) -> BoxedConnection;
}

/// Request-local handle to the bound connection.
#[derive(Clone)]
pub struct TenantConnection(Arc<Mutex<BoxedConnection>>);

impl TenantConnection {
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, BoxedConnection> {
        self.0.lock().await
    }
}

/// Binds connections to a scope with bounded reconnection on stale handles.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionScopeManager {
    max_retries: u32,
}

impl Default for ConnectionScopeManager {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_RETRIES)
    }
}

impl ConnectionScopeManager {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// On success the connection is live and scoped to `target`.
    /// Stale handles are closed and reopened at most `max_retries` times;
    /// any other failure is returned immediately.
    pub async fn bind(
        &self,
        mut conn: BoxedConnection,
        target: ScopeTarget,
    ) -> Result<BoundScope, ScopeError> {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match Self::try_bind(conn.as_mut(), &target).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(
                            "Bound scope '{}' on attempt {}/{} after reconnecting",
                            target, attempt, max_attempts
                        );
                    }
                    return Ok(BoundScope::new(conn, target));
                }
                Err(e) if e.is_stale() && attempt < max_attempts => {
                    tracing::warn!(
                        "Stale connection binding scope '{}' (attempt {}/{}): {}; reconnecting",
                        target, attempt, max_attempts, e
                    );
                    conn.close().await;
                    attempt += 1;
                }
                Err(e) if e.is_stale() => {
                    tracing::error!(
                        "Giving up binding scope '{}' after {} attempts: {}",
                        target, attempt, e
                    );
                    conn.close().await;
                    return Err(ScopeError::StaleConnection {
                        target,
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to bind scope '{}' (attempt {}): {}", target, attempt, e);
                    conn.close().await;
                    return Err(ScopeError::BindFailure { target, source: e });
                }
            }
        }
    }

    async fn try_bind(
        conn: &mut dyn SchemaConnection,
        target: &ScopeTarget,
    ) -> Result<(), ConnectionError> {
        conn.ensure_live().await?;
        conn.set_scope(target).await
    }
}

/// A connection bound to a scope for one request.
///
/// `unbind` resets the scope explicitly. If the scope is dropped instead
/// (handler panic, client disconnect, timeout) the reset runs on a spawned
/// task that owns the connection, so the handle cannot re-enter the pool
/// while still scoped.
pub struct BoundScope {
    target: ScopeTarget,
    conn: Option<Arc<Mutex<BoxedConnection>>>,
}

impl BoundScope {
    fn new(conn: BoxedConnection, target: ScopeTarget) -> Self {
        Self {
            target,
            conn: Some(Arc::new(Mutex::new(conn))),
        }
    }

    pub fn target(&self) -> &ScopeTarget {
        &self.target
    }

    pub fn connection(&self) -> Option<TenantConnection> {
        self.conn.as_ref().map(|c| TenantConnection(Arc::clone(c)))
    }

    pub async fn unbind(mut self) -> Result<(), ConnectionError> {
        match self.conn.take() {
            Some(conn) => release(conn, &self.target).await,
            None => Ok(()),
        }
    }
}

impl Drop for BoundScope {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let target = self.target.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Scope '{}' dropped without unbind; resetting in background", target);
                handle.spawn(async move {
                    let _ = release(conn, &target).await;
                });
            }
            Err(_) => {
                // The handle is dropped unreset; the pool's release hook must reset it
                tracing::error!(
                    "Scope '{}' dropped outside a runtime; connection released without an explicit reset",
                    target
                );
            }
        }
    }
}

async fn release(
    conn: Arc<Mutex<BoxedConnection>>,
    target: &ScopeTarget,
) -> Result<(), ConnectionError> {
    let mut guard = conn.lock().await;
    match guard.reset_scope().await {
        Ok(()) => {
            tracing::debug!("Reset scope '{}' to public", target);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to reset scope '{}': {}; discarding connection", target, e);
            guard.close().await;
            Err(e)
        }
    }
}
