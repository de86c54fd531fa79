use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One school's isolated data partition, addressed by its `schema_name` slug.
///
/// The slug is immutable once registered; lifecycle changes only touch the
/// flags and review notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub schema_name: String,
    pub name: String,
    pub school_type: SchoolType,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub on_trial: bool,
    pub approval_status: ApprovalStatus,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// Hostname alias for a tenant. Path routing does not consult it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,
    pub tenant_id: Uuid,
    pub is_primary: bool,
}

impl Domain {
    pub fn primary_for(tenant: &Tenant) -> Self {
        Self {
            domain: format!("{}.local", tenant.schema_name),
            tenant_id: tenant.id,
            is_primary: true,
        }
    }
}

/// Fields accepted when a signup application is registered.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTenant {
    pub schema_name: String,
    pub name: String,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl NewTenant {
    /// Pending, inactive trial tenant built from the application.
    pub fn into_pending(self) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            schema_name: self.schema_name,
            name: self.name,
            school_type: self.school_type,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            is_active: false,
            on_trial: true,
            approval_status: ApprovalStatus::Pending,
            admin_notes: None,
            rejection_reason: None,
            created_on: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    RequiresInfo,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::UnderReview => "under_review",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::RequiresInfo => "requires_info",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "under_review" => Ok(ApprovalStatus::UnderReview),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            "requires_info" => Ok(ApprovalStatus::RequiresInfo),
            other => Err(format!("unknown approval status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolType {
    Primary,
    Jhs,
    Shs,
    #[default]
    Basic,
    Other,
}

impl SchoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolType::Primary => "primary",
            SchoolType::Jhs => "jhs",
            SchoolType::Shs => "shs",
            SchoolType::Basic => "basic",
            SchoolType::Other => "other",
        }
    }
}

impl FromStr for SchoolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(SchoolType::Primary),
            "jhs" => Ok(SchoolType::Jhs),
            "shs" => Ok(SchoolType::Shs),
            "basic" => Ok(SchoolType::Basic),
            "other" => Ok(SchoolType::Other),
            other => Err(format!("unknown school type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_status_parses_wire_names() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::UnderReview,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
            ApprovalStatus::RequiresInfo,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>(), Ok(status));
        }
        assert!("Approved".parse::<ApprovalStatus>().is_err());
    }

    #[test]
    fn pending_application_starts_inactive_on_trial() {
        let tenant = NewTenant {
            schema_name: "kings".into(),
            name: "Kings College".into(),
            school_type: SchoolType::Shs,
            contact_name: None,
            contact_email: Some("head@kings.edu".into()),
        }
        .into_pending();

        assert!(!tenant.is_active);
        assert!(tenant.on_trial);
        assert_eq!(tenant.approval_status, ApprovalStatus::Pending);
        assert_eq!(Domain::primary_for(&tenant).domain, "kings.local");
    }
}
