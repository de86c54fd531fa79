// handlers/mod.rs - Handlers grouped by the context they answer in
//
// Public   - first path segment reserved or absent (/, /health, /signup)
// Scoped   - tenant context, after the /<slug> prefix is stripped
// Landlord - platform administration, public context only

pub mod landlord;
pub mod public;
pub mod scoped;

use axum::{extract::OriginalUri, Extension};

use crate::error::ApiError;
use crate::tenancy::RequestScope;

/// Fallback for unmatched routes; reports the path the client actually sent.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("No route for '{}'", uri.path()))
}

/// Rejects requests that arrived under a tenant prefix.
pub(crate) fn require_public(Extension(scope): &Extension<RequestScope>) -> Result<(), ApiError> {
    if scope.is_public() {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("No route for '{}'", scope.original_path())))
    }
}
