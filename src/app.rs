use axum::{
    extract::Request,
    http::HeaderValue,
    middleware,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use tower::{util::BoxCloneService, Layer};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::handlers;
use crate::middleware::{tenant_path_middleware, TenancyState};
use crate::services::TenantService;
use crate::tenancy::{ConnectionScopeManager, ConnectionSource, PathClassifier, ReservedRoutes, TenantRegistry};

/// The assembled HTTP service: tenant middleware wrapped around the router.
pub type AppService = BoxCloneService<Request, Response, Infallible>;

#[derive(Clone)]
pub struct AppState {
    pub tenancy: TenancyState,
    pub tenants: Arc<TenantService>,
}

impl AppState {
    /// The classifier and the signup validator share one reserved-route set.
    pub fn new<R>(
        registry: Arc<R>,
        connections: Arc<dyn ConnectionSource>,
        reserved: ReservedRoutes,
        scopes: ConnectionScopeManager,
    ) -> Self
    where
        R: TenantRegistry + 'static,
    {
        let reserved = Arc::new(reserved);
        let classifier = PathClassifier::new(Arc::clone(&reserved), registry.clone());
        let tenants = TenantService::new(registry, reserved);

        Self {
            tenancy: TenancyState {
                classifier: Arc::new(classifier),
                scopes,
                connections,
            },
            tenants: Arc::new(tenants),
        }
    }

    pub fn from_config<R>(registry: Arc<R>, connections: Arc<dyn ConnectionSource>, config: &AppConfig) -> Self
    where
        R: TenantRegistry + 'static,
    {
        Self::new(
            registry,
            connections,
            ReservedRoutes::from_config(&config.tenancy),
            ConnectionScopeManager::new(config.database.stale_retry_limit),
        )
    }
}

/// Routes as seen after the tenant prefix is stripped.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::public::home))
        .route("/health", get(handlers::public::health))
        .route("/signup", post(handlers::public::signup))
        .route("/dashboard/", get(handlers::scoped::dashboard))
        .merge(landlord_routes())
        .fallback(handlers::not_found)
        .with_state(state)
}

fn landlord_routes() -> Router<AppState> {
    use handlers::landlord::tenant;

    Router::new()
        .route("/landlord/tenants", get(tenant::tenant_list))
        .route(
            "/landlord/tenants/:slug",
            get(tenant::tenant_show).delete(tenant::tenant_deactivate),
        )
        .route("/landlord/tenants/:slug/review", put(tenant::tenant_review))
}

/// Wraps the router so the tenant middleware runs before routing.
///
/// Trace and CORS sit outside the tenant middleware, so spans carry the path
/// as received and classification or bind failures are traced too.
pub fn service(state: AppState, config: &AppConfig) -> AppService {
    let tenant_routed =
        middleware::from_fn_with_state(state.tenancy.clone(), tenant_path_middleware).layer(router(state));

    let mut app = Router::new().fallback_service(tenant_routed);
    if let Some(cors) = cors_layer(&config.security) {
        app = app.layer(cors);
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    BoxCloneService::new(app)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(CorsLayer::new().allow_origin(AllowOrigin::list(origins)))
}
