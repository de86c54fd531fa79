use serde::Deserialize;
use std::sync::Arc;

use crate::database::models::{ApprovalStatus, Domain, NewTenant, Tenant};
use crate::tenancy::{ReservedRoutes, SlugError, StoreError, TenantRegistry};

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Invalid school ID: {0}")]
    InvalidSlug(#[from] SlugError),
    #[error("Invalid school name: {0}")]
    InvalidName(String),
    #[error("The School ID '{0}' is already taken")]
    AlreadyExists(String),
    #[error("Tenant not found: {0}")]
    NotFound(String),
    #[error("Review rejected: {0}")]
    InvalidReview(String),
    #[error("Tenant store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for TenantError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(slug) => TenantError::AlreadyExists(slug),
            StoreError::NotFound(slug) => TenantError::NotFound(slug),
            other => TenantError::Store(other),
        }
    }
}

/// Decision recorded by a platform admin reviewing an application.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDecision {
    pub status: ApprovalStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Onboarding and lifecycle of tenants in the shared registry.
///
/// Slug validation goes through the same [`ReservedRoutes`] the path
/// classifier holds.
pub struct TenantService {
    registry: Arc<dyn TenantRegistry>,
    reserved: Arc<ReservedRoutes>,
}

impl TenantService {
    pub fn new(registry: Arc<dyn TenantRegistry>, reserved: Arc<ReservedRoutes>) -> Self {
        Self { registry, reserved }
    }

    /// Normalized slug if it is well-formed, unreserved and not taken.
    pub async fn validate_slug(&self, raw: &str) -> Result<String, TenantError> {
        let slug = self.reserved.validate_slug(raw)?;
        if self.registry.get(&slug).await?.is_some() {
            return Err(TenantError::AlreadyExists(slug));
        }
        Ok(slug)
    }

    /// Registers a signup application as a pending, inactive trial tenant.
    pub async fn submit_application(&self, mut application: NewTenant) -> Result<Tenant, TenantError> {
        application.schema_name = self.validate_slug(&application.schema_name).await?;

        let name = application.name.trim().to_string();
        if name.is_empty() || name.len() > 100 {
            return Err(TenantError::InvalidName(
                "School name must be between 1 and 100 characters".to_string(),
            ));
        }
        application.name = name;

        let tenant = application.into_pending();
        let domain = Domain::primary_for(&tenant);
        let tenant = self.registry.insert(tenant, domain).await?;

        tracing::info!("Registered application for tenant '{}' ({})", tenant.schema_name, tenant.name);
        Ok(tenant)
    }

    /// Applies a review decision. Approval activates the tenant, rejection
    /// deactivates it and must carry a reason.
    pub async fn review(&self, slug: &str, decision: ReviewDecision) -> Result<Tenant, TenantError> {
        let mut tenant = self.require(slug).await?;

        let reason = decision
            .rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        match decision.status {
            ApprovalStatus::Approved => {
                tenant.is_active = true;
                tenant.rejection_reason = None;
            }
            ApprovalStatus::Rejected => {
                let reason = reason.ok_or_else(|| {
                    TenantError::InvalidReview("a rejection reason is required".to_string())
                })?;
                tenant.is_active = false;
                tenant.rejection_reason = Some(reason);
            }
            _ => {}
        }
        tenant.approval_status = decision.status;
        if decision.admin_notes.is_some() {
            tenant.admin_notes = decision.admin_notes;
        }

        let saved = self.registry.save_lifecycle(&tenant).await?;
        tracing::info!(
            "Tenant '{}' reviewed: {} (active: {})",
            saved.schema_name, saved.approval_status, saved.is_active
        );
        Ok(saved)
    }

    /// Soft-disables a tenant; its path prefix stops resolving.
    pub async fn deactivate(&self, slug: &str) -> Result<Tenant, TenantError> {
        let mut tenant = self.require(slug).await?;
        tenant.is_active = false;

        let saved = self.registry.save_lifecycle(&tenant).await?;
        tracing::info!("Tenant '{}' deactivated", saved.schema_name);
        Ok(saved)
    }

    pub async fn get(&self, slug: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self.registry.get(slug).await?)
    }

    pub async fn list(&self) -> Result<Vec<Tenant>, TenantError> {
        Ok(self.registry.list().await?)
    }

    pub async fn domains(&self, slug: &str) -> Result<Vec<Domain>, TenantError> {
        Ok(self.registry.domains(slug).await?)
    }

    async fn require(&self, slug: &str) -> Result<Tenant, TenantError> {
        self.registry
            .get(slug)
            .await?
            .ok_or_else(|| TenantError::NotFound(slug.to_string()))
    }
}
