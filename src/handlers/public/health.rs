// handlers/public/health.rs - GET /health handler

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::tenancy::{RequestScope, TenantConnection};

/// Liveness plus a round trip on the connection bound for this request.
/// Reports the schema the connection is actually scoped to.
pub async fn health(
    Extension(scope): Extension<RequestScope>,
    Extension(conn): Extension<TenantConnection>,
) -> Result<Json<Value>, ApiError> {
    let schema = {
        let mut conn = conn.lock().await;
        conn.current_scope().await.map_err(|e| {
            tracing::error!("Health check on scoped connection failed: {}", e);
            ApiError::service_unavailable("database unavailable")
        })?
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "scope": scope.resolution.scope_target().to_string(),
            "database": {
                "status": "ok",
                "schema": schema,
            }
        }
    })))
}
