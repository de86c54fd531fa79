// handlers/landlord/tenant/list.rs - GET /landlord/tenants handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::handlers::require_public;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::RequestScope;

/// Every registered tenant, including pending and deactivated ones.
pub async fn tenant_list(State(state): State<AppState>, scope: Extension<RequestScope>) -> ApiResult<Vec<Tenant>> {
    require_public(&scope)?;
    Ok(ApiResponse::success(state.tenants.list().await?))
}
