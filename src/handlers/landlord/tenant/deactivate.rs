// handlers/landlord/tenant/deactivate.rs - DELETE /landlord/tenants/:slug handler

use axum::{
    extract::{Path, State},
    Extension,
};

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::handlers::require_public;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::RequestScope;

/// Soft delete: the record stays, the path prefix stops resolving.
pub async fn tenant_deactivate(
    State(state): State<AppState>,
    scope: Extension<RequestScope>,
    Path(slug): Path<String>,
) -> ApiResult<Tenant> {
    require_public(&scope)?;
    Ok(ApiResponse::success(state.tenants.deactivate(&slug).await?))
}
