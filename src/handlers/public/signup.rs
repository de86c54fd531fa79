// handlers/public/signup.rs - POST /signup handler

use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::{NewTenant, Tenant};
use crate::handlers::require_public;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::RequestScope;

/// Submits a school application. The tenant stays inactive, and its path
/// prefix unroutable, until a landlord approves it.
pub async fn signup(
    State(state): State<AppState>,
    scope: Extension<RequestScope>,
    Json(application): Json<NewTenant>,
) -> ApiResult<Tenant> {
    require_public(&scope)?;

    let tenant = state.tenants.submit_application(application).await?;
    Ok(ApiResponse::created(tenant))
}
