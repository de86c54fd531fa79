//! Request-time tenant resolution.
//!
//! Every request runs through three steps before routing:
//!
//! 1. [`PathClassifier`] maps the first path segment to a tenant, the public
//!    site, or a not-found failure.
//! 2. [`ConnectionScopeManager`] binds a database connection to that scope,
//!    reconnecting a bounded number of times when the handle is stale.
//! 3. The rewriter strips `/<slug>` from the routed path and records it as the
//!    script prefix used for link generation.
//!
//! All per-request state travels in the request's extensions.

pub mod classifier;
pub mod context;
pub mod reserved;
pub mod rewriter;
pub mod scope;
pub mod store;

pub use classifier::{ClassifyError, PathClassifier, Resolution, ScopeTarget};
pub use context::{RequestScope, ScriptPrefix};
pub use reserved::{ReservedRoutes, SlugError};
pub use rewriter::{strip_tenant_prefix, RewriteError, RewrittenPath, RoutingPath, UnrewrittenPath};
pub use scope::{
    BoundScope, BoxedConnection, ConnectionError, ConnectionScopeManager, ConnectionSource,
    ScopeError, SchemaConnection, TenantConnection,
};
pub use store::{MemoryTenantRegistry, StoreError, TenantRegistry, TenantStore};
