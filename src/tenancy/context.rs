use crate::database::models::Tenant;
use super::classifier::Resolution;
use super::rewriter::RoutingPath;

/// Everything the tenant middleware decided about one request.
///
/// Lives in the request's extensions only and is dropped with the response.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub resolution: Resolution,
    pub routing: RoutingPath,
}

impl RequestScope {
    pub fn tenant(&self) -> Option<&Tenant> {
        self.resolution.tenant()
    }

    pub fn is_public(&self) -> bool {
        self.resolution.is_public()
    }

    pub fn original_path(&self) -> &str {
        self.routing.original()
    }

    pub fn script_prefix(&self) -> ScriptPrefix {
        ScriptPrefix::new(self.routing.script_prefix())
    }
}

/// Prefix prepended to every generated link so links stay tenant-scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptPrefix(String);

impl ScriptPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds an absolute link for an internal route such as `/dashboard/`.
    pub fn reverse(&self, route: &str) -> String {
        if route.starts_with('/') {
            format!("{}{}", self.0, route)
        } else {
            format!("{}/{}", self.0, route)
        }
    }
}
