//! Fakes shared by unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::database::models::{ApprovalStatus, SchoolType, Tenant};
use crate::tenancy::classifier::ScopeTarget;
use crate::tenancy::scope::{ConnectionError, SchemaConnection};
use crate::tenancy::store::{MemoryTenantRegistry, StoreError, TenantStore};

/// Approved, active tenant with the given slug.
pub fn tenant(slug: &str) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        schema_name: slug.to_string(),
        name: format!("{} school", slug),
        school_type: SchoolType::Basic,
        contact_name: None,
        contact_email: None,
        is_active: true,
        on_trial: false,
        approval_status: ApprovalStatus::Approved,
        admin_notes: None,
        rejection_reason: None,
        created_on: Utc::now(),
    }
}

/// Store wrapper that counts lookups, or fails every lookup.
pub struct CountingStore {
    inner: Option<MemoryTenantRegistry>,
    lookups: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryTenantRegistry) -> Self {
        Self { inner: Some(inner), lookups: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { inner: None, lookups: AtomicUsize::new(0) }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantStore for CountingStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.inner {
            Some(inner) => inner.find_by_slug(slug).await,
            None => Err(StoreError::InvalidRow("registry unavailable".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnsureLive,
    SetScope(ScopeTarget),
    ResetScope,
    Close,
    CurrentScope,
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn set_scope_attempts(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::SetScope(_))).count()
    }

    pub fn closes(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Close).count()
    }
}

/// Scripted connection. Queued results are consumed first, then the default applies.
pub struct FakeConnection {
    log: CallLog,
    ensure_live: VecDeque<Result<(), ConnectionError>>,
    set_scope: VecDeque<Result<(), ConnectionError>>,
    set_scope_default: Result<(), ConnectionError>,
    reset: Result<(), ConnectionError>,
    scope: Option<ScopeTarget>,
}

impl FakeConnection {
    pub fn healthy() -> Self {
        Self::always(Ok(()))
    }

    pub fn always(result: Result<(), ConnectionError>) -> Self {
        Self {
            log: CallLog::default(),
            ensure_live: VecDeque::new(),
            set_scope: VecDeque::new(),
            set_scope_default: result,
            reset: Ok(()),
            scope: None,
        }
    }

    pub fn with_set_scope_results(results: Vec<Result<(), ConnectionError>>) -> Self {
        let mut conn = Self::healthy();
        conn.set_scope = results.into();
        conn
    }

    pub fn with_ensure_live_results(mut self, results: Vec<Result<(), ConnectionError>>) -> Self {
        self.ensure_live = results.into();
        self
    }

    pub fn with_reset_result(mut self, result: Result<(), ConnectionError>) -> Self {
        self.reset = result;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl SchemaConnection for FakeConnection {
    async fn ensure_live(&mut self) -> Result<(), ConnectionError> {
        self.log.push(Call::EnsureLive);
        self.ensure_live.pop_front().unwrap_or(Ok(()))
    }

    async fn set_scope(&mut self, target: &ScopeTarget) -> Result<(), ConnectionError> {
        self.log.push(Call::SetScope(target.clone()));
        let result = self
            .set_scope
            .pop_front()
            .unwrap_or_else(|| self.set_scope_default.clone());
        if result.is_ok() {
            self.scope = Some(target.clone());
        }
        result
    }

    async fn reset_scope(&mut self) -> Result<(), ConnectionError> {
        self.log.push(Call::ResetScope);
        if self.reset.is_ok() {
            self.scope = Some(ScopeTarget::Public);
        }
        self.reset.clone()
    }

    async fn close(&mut self) {
        self.log.push(Call::Close);
        self.scope = None;
    }

    async fn current_scope(&mut self) -> Result<String, ConnectionError> {
        self.log.push(Call::CurrentScope);
        match &self.scope {
            Some(ScopeTarget::Tenant(slug)) => Ok(slug.clone()),
            Some(ScopeTarget::Public) => Ok("public".to_string()),
            None => Err(ConnectionError::Failed("not connected".into())),
        }
    }
}
