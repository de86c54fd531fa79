use axum::{
    extract::{OriginalUri, Request, State},
    http::{uri::PathAndQuery, Uri},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::tenancy::{
    BoundScope, ConnectionScopeManager, ConnectionSource, PathClassifier, RequestScope, Resolution,
    RoutingPath, UnrewrittenPath,
};

/// Everything the tenant middleware needs, built once at startup.
#[derive(Clone)]
pub struct TenancyState {
    pub classifier: Arc<PathClassifier>,
    pub scopes: ConnectionScopeManager,
    pub connections: Arc<dyn ConnectionSource>,
}

/// Resolves the tenant from the first path segment, binds a connection to
/// its schema and strips the prefix before the router sees the request.
///
/// Must wrap the router from outside; as a route layer the rewrite would
/// happen after routing already matched.
///
/// Injects into the request:
/// - `OriginalUri` with the URI exactly as received
/// - `RequestScope` and `ScriptPrefix` for link generation
/// - `TenantConnection`, the bound connection
/// - `Tenant`, when the request is tenant-scoped
pub async fn tenant_path_middleware(
    State(tenancy): State<TenancyState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let original_uri = request.uri().clone();
    let path = original_uri.path().to_string();

    let resolution = tenancy.classifier.classify(&path).await?;

    let conn = tenancy.connections.checkout();
    let scope = tenancy.scopes.bind(conn, resolution.scope_target()).await?;

    // Bound from here on: every early return must unbind first
    let routing = match route(&resolution, &path) {
        Ok(routing) => routing,
        Err(e) => {
            unbind(scope).await;
            return Err(e);
        }
    };

    if routing.is_rewritten() {
        match rewrite_uri(&original_uri, routing.routed()) {
            Ok(uri) => *request.uri_mut() = uri,
            Err(e) => {
                unbind(scope).await;
                return Err(e);
            }
        }
        tracing::debug!("Rewrote '{}' to '{}' for scope '{}'", path, routing.routed(), scope.target());
    }

    let request_scope = RequestScope { resolution, routing };
    let extensions = request.extensions_mut();
    extensions.insert(OriginalUri(original_uri));
    extensions.insert(request_scope.script_prefix());
    if let Some(tenant) = request_scope.tenant() {
        extensions.insert(tenant.clone());
    }
    if let Some(conn) = scope.connection() {
        extensions.insert(conn);
    }
    extensions.insert(request_scope);

    let response = next.run(request).await;

    unbind(scope).await;
    Ok(response)
}

fn route(resolution: &Resolution, path: &str) -> Result<RoutingPath, ApiError> {
    let unrewritten = UnrewrittenPath::new(path);
    match resolution {
        Resolution::Public => Ok(RoutingPath::Unrewritten(unrewritten)),
        Resolution::Tenant(tenant) => {
            let rewritten = unrewritten.rewrite(&tenant.schema_name)?;
            Ok(RoutingPath::Rewritten(rewritten))
        }
    }
}

/// Replaces the path of `uri`, keeping its query string.
fn rewrite_uri(uri: &Uri, path_info: &str) -> Result<Uri, ApiError> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path_info, query),
        None => path_info.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>().map_err(|e| {
        tracing::error!("Rewritten path '{}' is not a valid URI: {}", path_info, e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?);

    Uri::from_parts(parts).map_err(|e| {
        tracing::error!("Failed to rebuild URI for '{}': {}", path_info, e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}

async fn unbind(scope: BoundScope) {
    let target = scope.target().clone();
    if let Err(e) = scope.unbind().await {
        // The connection was already discarded by the failed reset
        tracing::error!("Unbinding scope '{}' failed: {}", target, e);
    }
}
