// handlers/public/home.rs - GET / handler

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::tenancy::{RequestScope, ScriptPrefix};

pub async fn home(
    Extension(scope): Extension<RequestScope>,
    Extension(prefix): Extension<ScriptPrefix>,
) -> Json<Value> {
    match scope.tenant() {
        Some(tenant) => Json(json!({
            "success": true,
            "data": {
                "school": tenant.name,
                "school_id": tenant.schema_name,
                "school_type": tenant.school_type,
                "on_trial": tenant.on_trial,
                "links": {
                    "home": prefix.reverse("/"),
                    "dashboard": prefix.reverse("/dashboard/"),
                    "health": prefix.reverse("/health"),
                }
            }
        })),
        None => Json(json!({
            "success": true,
            "data": {
                "name": "School System",
                "version": env!("CARGO_PKG_VERSION"),
                "description": "Multi-tenant school management platform",
                "endpoints": {
                    "home": "/ (public)",
                    "health": "/health (public)",
                    "signup": "/signup (public)",
                    "landlord": "/landlord/tenants[/:slug] (platform administration)",
                    "school": "/:slug/[dashboard/] (tenant)",
                }
            }
        })),
    }
}
