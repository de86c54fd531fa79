use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::database::models::{ApprovalStatus, Domain, SchoolType, Tenant};
use crate::tenancy::{StoreError, TenantRegistry, TenantStore};

const TENANT_COLUMNS: &str = r#"
    id, schema_name, name, school_type, contact_name, contact_email,
    is_active, on_trial, approval_status, admin_notes, rejection_reason, created_on
"#;

/// Tenant registry backed by the `tenants` / `tenant_domains` tables in the
/// shared schema (see `sql/tenants.sql`).
#[derive(Clone)]
pub struct PgTenantRegistry {
    pool: PgPool,
}

impl PgTenantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_tenant(row: &PgRow) -> Result<Tenant, StoreError> {
        let school_type: String = row.try_get("school_type")?;
        let approval_status: String = row.try_get("approval_status")?;

        Ok(Tenant {
            id: row.try_get("id")?,
            schema_name: row.try_get("schema_name")?,
            name: row.try_get("name")?,
            school_type: school_type.parse::<SchoolType>().map_err(StoreError::InvalidRow)?,
            contact_name: row.try_get("contact_name")?,
            contact_email: row.try_get("contact_email")?,
            is_active: row.try_get("is_active")?,
            on_trial: row.try_get("on_trial")?,
            approval_status: approval_status.parse::<ApprovalStatus>().map_err(StoreError::InvalidRow)?,
            admin_notes: row.try_get("admin_notes")?,
            rejection_reason: row.try_get("rejection_reason")?,
            created_on: row.try_get("created_on")?,
        })
    }
}

#[async_trait]
impl TenantStore for PgTenantRegistry {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        let query = format!(
            "SELECT {} FROM tenants WHERE schema_name = $1 AND is_active = true",
            TENANT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_tenant).transpose()
    }
}

#[async_trait]
impl TenantRegistry for PgTenantRegistry {
    async fn get(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        let query = format!("SELECT {} FROM tenants WHERE schema_name = $1", TENANT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_tenant).transpose()
    }

    async fn list(&self) -> Result<Vec<Tenant>, StoreError> {
        let query = format!("SELECT {} FROM tenants ORDER BY created_on DESC", TENANT_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_tenant).collect()
    }

    async fn domains(&self, slug: &str) -> Result<Vec<Domain>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT d.domain, d.tenant_id, d.is_primary
            FROM tenant_domains d
            JOIN tenants t ON t.id = d.tenant_id
            WHERE t.schema_name = $1
            ORDER BY d.is_primary DESC, d.domain
            "#,
        )
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Domain, StoreError> {
                Ok(Domain {
                    domain: row.try_get("domain")?,
                    tenant_id: row.try_get("tenant_id")?,
                    is_primary: row.try_get("is_primary")?,
                })
            })
            .collect()
    }

    async fn insert(&self, tenant: Tenant, domain: Domain) -> Result<Tenant, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO tenants (
                id, schema_name, name, school_type, contact_name, contact_email,
                is_active, on_trial, approval_status, admin_notes, rejection_reason, created_on
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (schema_name) DO NOTHING
            RETURNING {}
            "#,
            TENANT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(tenant.id)
            .bind(&tenant.schema_name)
            .bind(&tenant.name)
            .bind(tenant.school_type.as_str())
            .bind(&tenant.contact_name)
            .bind(&tenant.contact_email)
            .bind(tenant.is_active)
            .bind(tenant.on_trial)
            .bind(tenant.approval_status.as_str())
            .bind(&tenant.admin_notes)
            .bind(&tenant.rejection_reason)
            .bind(tenant.created_on)
            .fetch_optional(&mut *tx)
            .await?;

        let stored = match row {
            Some(row) => Self::row_to_tenant(&row)?,
            None => return Err(StoreError::AlreadyExists(tenant.schema_name)),
        };

        sqlx::query("INSERT INTO tenant_domains (domain, tenant_id, is_primary) VALUES ($1, $2, $3)")
            .bind(&domain.domain)
            .bind(domain.tenant_id)
            .bind(domain.is_primary)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn save_lifecycle(&self, tenant: &Tenant) -> Result<Tenant, StoreError> {
        let query = format!(
            r#"
            UPDATE tenants
            SET is_active = $2, on_trial = $3, approval_status = $4,
                admin_notes = $5, rejection_reason = $6
            WHERE schema_name = $1
            RETURNING {}
            "#,
            TENANT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&tenant.schema_name)
            .bind(tenant.is_active)
            .bind(tenant.on_trial)
            .bind(tenant.approval_status.as_str())
            .bind(&tenant.admin_notes)
            .bind(&tenant.rejection_reason)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_tenant(&row),
            None => Err(StoreError::NotFound(tenant.schema_name.clone())),
        }
    }
}
