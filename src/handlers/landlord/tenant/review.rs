// handlers/landlord/tenant/review.rs - PUT /landlord/tenants/:slug/review handler

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::handlers::require_public;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ReviewDecision;
use crate::tenancy::RequestScope;

pub async fn tenant_review(
    State(state): State<AppState>,
    scope: Extension<RequestScope>,
    Path(slug): Path<String>,
    Json(decision): Json<ReviewDecision>,
) -> ApiResult<Tenant> {
    require_public(&scope)?;
    Ok(ApiResponse::success(state.tenants.review(&slug, decision).await?))
}
