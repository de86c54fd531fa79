#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use uuid::Uuid;

use school_system::app::{self, AppService, AppState};
use school_system::config::{AppConfig, Environment};
use school_system::database::models::{ApprovalStatus, SchoolType, Tenant};
use school_system::tenancy::{
    BoxedConnection, ConnectionError, ConnectionScopeManager, ConnectionSource, MemoryTenantRegistry,
    ReservedRoutes, SchemaConnection, ScopeTarget,
};

/// Approved, active tenant.
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

pub fn stale() -> ConnectionError {
    ConnectionError::Stale("server closed the connection unexpectedly".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    EnsureLive(usize),
    SetScope(usize, ScopeTarget),
    Reset(usize),
    Close(usize),
}

impl Event {
    fn connection(&self) -> usize {
        match self {
            Event::EnsureLive(id) | Event::SetScope(id, _) | Event::Reset(id) | Event::Close(id) => *id,
        }
    }
}

#[derive(Default)]
struct PoolInner {
    events: Mutex<Vec<Event>>,
    bind_results: Mutex<VecDeque<Result<(), ConnectionError>>>,
    bind_default: Mutex<Option<ConnectionError>>,
    checkouts: AtomicUsize,
}

/// Connection source whose handles record every call in one shared log.
/// Scripted `set_scope` results are consumed in order across all handles.
#[derive(Clone, Default)]
pub struct FakePool(Arc<PoolInner>);

impl FakePool {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn scripted(results: Vec<Result<(), ConnectionError>>) -> Self {
        let pool = Self::default();
        *pool.0.bind_results.lock().unwrap() = results.into();
        pool
    }

    pub fn always_failing(err: ConnectionError) -> Self {
        let pool = Self::default();
        *pool.0.bind_default.lock().unwrap() = Some(err);
        pool
    }

    fn record(&self, event: Event) {
        self.0.events.lock().unwrap().push(event);
    }

    fn next_bind_result(&self) -> Result<(), ConnectionError> {
        if let Some(result) = self.0.bind_results.lock().unwrap().pop_front() {
            return result;
        }
        match self.0.bind_default.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.events.lock().unwrap().clone()
    }

    pub fn checkouts(&self) -> usize {
        self.0.checkouts.load(Ordering::SeqCst)
    }

    pub fn set_scope_attempts(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, Event::SetScope(..))).count()
    }

    pub fn closes(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, Event::Close(_))).count()
    }

    pub fn scopes_bound(&self) -> Vec<ScopeTarget> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SetScope(_, target) => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Every handed-out connection ended reset to public or closed.
    pub fn assert_all_released(&self) {
        let events = self.events();
        for id in 0..self.checkouts() {
            let last = events.iter().rev().find(|e| e.connection() == id);
            assert!(
                matches!(last, Some(Event::Reset(_)) | Some(Event::Close(_)) | None),
                "connection {} left scoped: {:?}",
                id,
                last
            );
        }
    }
}

impl ConnectionSource for FakePool {
    fn checkout(&self) -> BoxedConnection {
        let id = self.0.checkouts.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedConnection {
            id,
            pool: self.clone(),
            scope: None,
        })
    }
}

struct ScriptedConnection {
    id: usize,
    pool: FakePool,
    scope: Option<ScopeTarget>,
}

#[async_trait]
impl SchemaConnection for ScriptedConnection {
    async fn ensure_live(&mut self) -> Result<(), ConnectionError> {
        self.pool.record(Event::EnsureLive(self.id));
        Ok(())
    }

    async fn set_scope(&mut self, target: &ScopeTarget) -> Result<(), ConnectionError> {
        // Let concurrent requests interleave
        tokio::task::yield_now().await;
        self.pool.record(Event::SetScope(self.id, target.clone()));
        let result = self.pool.next_bind_result();
        if result.is_ok() {
            self.scope = Some(target.clone());
        }
        result
    }

    async fn reset_scope(&mut self) -> Result<(), ConnectionError> {
        self.pool.record(Event::Reset(self.id));
        self.scope = Some(ScopeTarget::Public);
        Ok(())
    }

    async fn close(&mut self) {
        self.pool.record(Event::Close(self.id));
        self.scope = None;
    }

    async fn current_scope(&mut self) -> Result<String, ConnectionError> {
        tokio::task::yield_now().await;
        match &self.scope {
            Some(ScopeTarget::Tenant(slug)) => Ok(slug.clone()),
            Some(ScopeTarget::Public) => Ok("public".to_string()),
            None => Err(ConnectionError::Failed("not connected".to_string())),
        }
    }
}

pub struct TestApp {
    pub service: AppService,
    pub registry: Arc<MemoryTenantRegistry>,
    pub pool: FakePool,
}

impl TestApp {
    pub fn new(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        Self::with_pool(tenants, FakePool::healthy())
    }

    pub fn with_pool(tenants: impl IntoIterator<Item = Tenant>, pool: FakePool) -> Self {
        Self::build(tenants, pool, ReservedRoutes::default())
    }

    pub fn with_reserved(tenants: impl IntoIterator<Item = Tenant>, reserved: ReservedRoutes) -> Self {
        Self::build(tenants, FakePool::healthy(), reserved)
    }

    fn build(tenants: impl IntoIterator<Item = Tenant>, pool: FakePool, reserved: ReservedRoutes) -> Self {
        let registry = Arc::new(MemoryTenantRegistry::with_tenants(tenants));
        let state = AppState::new(
            registry.clone(),
            Arc::new(pool.clone()),
            reserved,
            ConnectionScopeManager::default(),
        );
        let config = AppConfig::for_environment(Environment::Development);

        Self {
            service: app::service(state, &config),
            registry,
            pool,
        }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder().method(method).uri(path).body(Body::empty()).unwrap(),
        };

        let response = self.service.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

/// One captured event or span: its level, message or span name, and fields.
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: tracing::Level,
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl Captured {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FieldVisitor(Vec<(String, String)>);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

/// Records events and new spans for the current thread. Use with the
/// default current-thread `#[tokio::test]` runtime.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<Captured>>>,
    spans: Arc<Mutex<Vec<Captured>>>,
}

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<Captured> {
        self.events.lock().unwrap().clone()
    }

    pub fn spans(&self) -> Vec<Captured> {
        self.spans.lock().unwrap().clone()
    }

    /// Events at `level` whose message contains `needle`.
    pub fn count(&self, level: tracing::Level, needle: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.level == level && e.field("message").map_or(false, |m| m.contains(needle)))
            .count()
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, _id: &tracing::span::Id, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(Captured {
            level: *attrs.metadata().level(),
            name: attrs.metadata().name().to_string(),
            fields: visitor.0,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            name: event.metadata().name().to_string(),
            fields: visitor.0,
        });
    }
}
