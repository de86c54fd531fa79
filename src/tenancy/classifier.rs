use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::Tenant;
use super::reserved::ReservedRoutes;
use super::store::{StoreError, TenantStore};

/// What the first path segment resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Tenant(Tenant),
    Public,
}

impl Resolution {
    pub fn scope_target(&self) -> ScopeTarget {
        match self {
            Resolution::Tenant(tenant) => ScopeTarget::Tenant(tenant.schema_name.clone()),
            Resolution::Public => ScopeTarget::Public,
        }
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            Resolution::Tenant(tenant) => Some(tenant),
            Resolution::Public => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Resolution::Public)
    }
}

/// Schema a connection is bound to for the duration of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeTarget {
    Public,
    Tenant(String),
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeTarget::Public => f.write_str("<public>"),
            ScopeTarget::Tenant(slug) => f.write_str(slug),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("School '{0}' not found")]
    TenantNotFound(String),

    #[error("tenant lookup for '{slug}' failed: {source}")]
    Lookup {
        slug: String,
        #[source]
        source: StoreError,
    },
}

/// First non-empty segment of a request path, if any.
pub fn candidate_segment(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

/// Decides whether a request path targets a tenant or the public site.
///
/// Unknown candidates fail closed: they never fall back to the public site.
#[derive(Clone)]
pub struct PathClassifier {
    reserved: Arc<ReservedRoutes>,
    tenants: Arc<dyn TenantStore>,
}

impl PathClassifier {
    pub fn new(reserved: Arc<ReservedRoutes>, tenants: Arc<dyn TenantStore>) -> Self {
        Self { reserved, tenants }
    }

    pub fn reserved(&self) -> &ReservedRoutes {
        &self.reserved
    }

    pub async fn classify(&self, path: &str) -> Result<Resolution, ClassifyError> {
        let candidate = match candidate_segment(path) {
            Some(candidate) => candidate,
            None => return Ok(Resolution::Public),
        };

        // Reserved names win before any lookup happens
        if self.reserved.is_public_segment(candidate) {
            return Ok(Resolution::Public);
        }

        let found = self
            .tenants
            .find_by_slug(candidate)
            .await
            .map_err(|source| {
                tracing::error!("Tenant lookup failed for '{}': {}", candidate, source);
                ClassifyError::Lookup {
                    slug: candidate.to_string(),
                    source,
                }
            })?;

        match found {
            Some(tenant) => {
                tracing::debug!("Path '{}' resolved to tenant '{}'", path, tenant.schema_name);
                Ok(Resolution::Tenant(tenant))
            }
            None => {
                tracing::warn!("No tenant for path segment '{}' (path '{}')", candidate, path);
                Err(ClassifyError::TenantNotFound(candidate.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tenant, CountingStore};
    use crate::tenancy::store::MemoryTenantRegistry;

    fn classifier_with(store: Arc<dyn TenantStore>) -> PathClassifier {
        PathClassifier::new(Arc::new(ReservedRoutes::default()), store)
    }

    fn kings_store() -> Arc<dyn TenantStore> {
        Arc::new(MemoryTenantRegistry::with_tenants([tenant("kings")]))
    }

    #[test]
    fn candidate_skips_empty_segments() {
        assert_eq!(candidate_segment("/"), None);
        assert_eq!(candidate_segment(""), None);
        assert_eq!(candidate_segment("///"), None);
        assert_eq!(candidate_segment("/kings/dashboard/"), Some("kings"));
        assert_eq!(candidate_segment("//kings"), Some("kings"));
    }

    #[tokio::test]
    async fn root_path_is_public() {
        let classifier = classifier_with(kings_store());
        assert_eq!(classifier.classify("/").await.unwrap(), Resolution::Public);
        assert_eq!(classifier.classify("").await.unwrap(), Resolution::Public);
    }

    #[tokio::test]
    async fn tenant_slug_resolves_to_tenant() {
        let classifier = classifier_with(kings_store());
        let resolution = classifier.classify("/kings/dashboard/").await.unwrap();
        assert_eq!(resolution.tenant().map(|t| t.schema_name.as_str()), Some("kings"));
        assert_eq!(resolution.scope_target(), ScopeTarget::Tenant("kings".into()));
    }

    #[tokio::test]
    async fn reserved_segment_is_public() {
        let classifier = classifier_with(kings_store());
        assert_eq!(classifier.classify("/admin/login/").await.unwrap(), Resolution::Public);
        assert_eq!(classifier.classify("/public/anything").await.unwrap(), Resolution::Public);
        assert_eq!(classifier.classify("/favicon.ico").await.unwrap(), Resolution::Public);
    }

    #[tokio::test]
    async fn unknown_segment_fails_closed() {
        let classifier = classifier_with(kings_store());
        let err = classifier.classify("/unknownschool/anything").await.unwrap_err();
        assert!(matches!(err, ClassifyError::TenantNotFound(ref slug) if slug == "unknownschool"));
    }

    #[tokio::test]
    async fn comparison_is_case_sensitive() {
        let classifier = classifier_with(kings_store());
        assert!(matches!(
            classifier.classify("/Kings/").await,
            Err(ClassifyError::TenantNotFound(_))
        ));
        assert!(matches!(
            classifier.classify("/king/").await,
            Err(ClassifyError::TenantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn reserved_names_never_reach_the_store() {
        // Even a store that would answer for "admin" must not be consulted
        let store = Arc::new(CountingStore::new(MemoryTenantRegistry::with_tenants([
            tenant("admin"),
            tenant("kings"),
        ])));
        let classifier = classifier_with(store.clone());

        assert_eq!(classifier.classify("/admin/").await.unwrap(), Resolution::Public);
        assert_eq!(classifier.classify("/").await.unwrap(), Resolution::Public);
        assert_eq!(store.lookups(), 0);

        classifier.classify("/kings/").await.unwrap();
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn every_default_reserved_route_is_public_without_lookup() {
        let store = Arc::new(CountingStore::new(MemoryTenantRegistry::with_tenants([tenant("kings")])));
        let classifier = classifier_with(store.clone());

        for route in crate::config::DEFAULT_RESERVED_ROUTES {
            for path in [format!("/{}", route), format!("/{}/", route), format!("/{}/deeper/path", route)] {
                assert_eq!(classifier.classify(&path).await.unwrap(), Resolution::Public, "{}", path);
            }
        }
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn inactive_tenant_is_not_found() {
        let mut closed = tenant("closed");
        closed.is_active = false;
        let classifier = classifier_with(Arc::new(MemoryTenantRegistry::with_tenants([closed])));
        assert!(matches!(
            classifier.classify("/closed/").await,
            Err(ClassifyError::TenantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn store_failure_is_a_lookup_error() {
        let classifier = classifier_with(Arc::new(CountingStore::failing()));
        let err = classifier.classify("/kings/").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Lookup { ref slug, .. } if slug == "kings"));
    }
}
