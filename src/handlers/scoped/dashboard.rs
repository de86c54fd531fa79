// handlers/scoped/dashboard.rs - GET /dashboard/ handler

use axum::{extract::OriginalUri, Extension, Json};
use serde_json::{json, Value};

use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::tenancy::{ScriptPrefix, TenantConnection};

pub async fn dashboard(
    tenant: Option<Extension<Tenant>>,
    Extension(prefix): Extension<ScriptPrefix>,
    Extension(conn): Extension<TenantConnection>,
    OriginalUri(original): OriginalUri,
) -> Result<Json<Value>, ApiError> {
    // `dashboard` is reserved, so the public context never has one
    let Some(Extension(tenant)) = tenant else {
        return Err(ApiError::not_found(format!("No route for '{}'", original.path())));
    };

    let active_schema = conn.lock().await.current_scope().await.map_err(|e| {
        tracing::error!("Could not read active schema for '{}': {}", tenant.schema_name, e);
        ApiError::service_unavailable("Database temporarily unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "tenant": {
                "school_id": tenant.schema_name,
                "name": tenant.name,
                "school_type": tenant.school_type,
                "approval_status": tenant.approval_status,
                "on_trial": tenant.on_trial,
            },
            "active_schema": active_schema,
            "request_path": original.path(),
            "script_prefix": prefix.as_str(),
            "links": {
                "home": prefix.reverse("/"),
                "dashboard": prefix.reverse("/dashboard/"),
                "health": prefix.reverse("/health"),
            }
        }
    })))
}
