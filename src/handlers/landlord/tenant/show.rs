// handlers/landlord/tenant/show.rs - GET /landlord/tenants/:slug handler

use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::{Domain, Tenant};
use crate::error::ApiError;
use crate::handlers::require_public;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::RequestScope;

#[derive(Debug, Serialize)]
pub struct TenantDetails {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub domains: Vec<Domain>,
}

pub async fn tenant_show(
    State(state): State<AppState>,
    scope: Extension<RequestScope>,
    Path(slug): Path<String>,
) -> ApiResult<TenantDetails> {
    require_public(&scope)?;

    let tenant = state
        .tenants
        .get(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tenant not found: {}", slug)))?;
    let domains = state.tenants.domains(&slug).await?;

    Ok(ApiResponse::success(TenantDetails { tenant, domains }))
}
