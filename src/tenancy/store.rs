use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::database::models::{Domain, Tenant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tenant '{0}' already exists")]
    AlreadyExists(String),

    #[error("tenant '{0}' not found")]
    NotFound(String),

    #[error("invalid tenant row: {0}")]
    InvalidRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Read-only lookup consulted by the path classifier.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Exact, case-sensitive slug match. Only usable (active) tenants are returned.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError>;
}

/// Write side of the tenant registry, owned by the onboarding workflow.
#[async_trait]
pub trait TenantRegistry: TenantStore {
    /// Any registered tenant, active or not.
    async fn get(&self, slug: &str) -> Result<Option<Tenant>, StoreError>;

    async fn list(&self) -> Result<Vec<Tenant>, StoreError>;

    async fn domains(&self, slug: &str) -> Result<Vec<Domain>, StoreError>;

    /// Registers the tenant and its primary domain alias together.
    async fn insert(&self, tenant: Tenant, domain: Domain) -> Result<Tenant, StoreError>;

    /// Persists lifecycle flags and review notes. The slug is never written.
    async fn save_lifecycle(&self, tenant: &Tenant) -> Result<Tenant, StoreError>;
}

/// In-process registry used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryTenantRegistry {
    tenants: RwLock<BTreeMap<String, Tenant>>,
    domains: RwLock<Vec<Domain>>,
}

impl MemoryTenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds tenants directly, bypassing validation.
    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let map = tenants
            .into_iter()
            .map(|t| (t.schema_name.clone(), t))
            .collect();
        Self {
            tenants: RwLock::new(map),
            domains: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TenantStore for MemoryTenantRegistry {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(slug).filter(|t| t.is_active).cloned())
    }
}

#[async_trait]
impl TenantRegistry for MemoryTenantRegistry {
    async fn get(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        Ok(self.tenants.read().await.get(slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, StoreError> {
        let mut tenants: Vec<Tenant> = self.tenants.read().await.values().cloned().collect();
        tenants.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(tenants)
    }

    async fn domains(&self, slug: &str) -> Result<Vec<Domain>, StoreError> {
        let tenant = self
            .get(slug)
            .await?
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))?;
        let domains = self.domains.read().await;
        Ok(domains.iter().filter(|d| d.tenant_id == tenant.id).cloned().collect())
    }

    async fn insert(&self, tenant: Tenant, domain: Domain) -> Result<Tenant, StoreError> {
        let mut tenants = self.tenants.write().await;
        if tenants.contains_key(&tenant.schema_name) {
            return Err(StoreError::AlreadyExists(tenant.schema_name));
        }
        self.domains.write().await.push(domain);
        tenants.insert(tenant.schema_name.clone(), tenant.clone());
        Ok(tenant)
    }

    async fn save_lifecycle(&self, tenant: &Tenant) -> Result<Tenant, StoreError> {
        let mut tenants = self.tenants.write().await;
        let stored = tenants
            .get_mut(&tenant.schema_name)
            .ok_or_else(|| StoreError::NotFound(tenant.schema_name.clone()))?;

        stored.is_active = tenant.is_active;
        stored.on_trial = tenant.on_trial;
        stored.approval_status = tenant.approval_status;
        stored.admin_notes = tenant.admin_notes.clone();
        stored.rejection_reason = tenant.rejection_reason.clone();
        Ok(stored.clone())
    }
}
