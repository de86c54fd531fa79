use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("path '{path}' does not start with tenant segment '{slug}'")]
    PrefixMismatch { path: String, slug: String },
}

/// Result of stripping a tenant prefix.
///
/// `script_prefix + path_info` reconstructs the original path, except that a
/// bare `/<slug>` comes back as `/<slug>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenPath {
    pub original: String,
    /// Path seen by routing; always starts with `/`.
    pub path_info: String,
    /// `/<slug>`, prepended to every generated link.
    pub script_prefix: String,
}

/// Pure prefix strip. The first non-empty segment of `path` must equal `slug`.
pub fn strip_tenant_prefix(path: &str, slug: &str) -> Result<RewrittenPath, RewriteError> {
    let mismatch = || RewriteError::PrefixMismatch {
        path: path.to_string(),
        slug: slug.to_string(),
    };

    let trimmed = path.trim_start_matches('/');
    let rest = trimmed.strip_prefix(slug).ok_or_else(mismatch)?;
    if slug.is_empty() || !(rest.is_empty() || rest.starts_with('/')) {
        return Err(mismatch());
    }

    let path_info = if rest.is_empty() { "/".to_string() } else { rest.to_string() };

    Ok(RewrittenPath {
        original: path.to_string(),
        path_info,
        script_prefix: format!("/{}", slug),
    })
}

/// Initial state: the path exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrewrittenPath {
    original: String,
}

impl UnrewrittenPath {
    pub fn new(original: impl Into<String>) -> Self {
        Self { original: original.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Consumes the unrewritten state; there is no way back.
    pub fn rewrite(self, slug: &str) -> Result<RewrittenPath, RewriteError> {
        strip_tenant_prefix(&self.original, slug)
    }
}

/// Per-request routing view of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingPath {
    Unrewritten(UnrewrittenPath),
    Rewritten(RewrittenPath),
}

impl RoutingPath {
    pub fn original(&self) -> &str {
        match self {
            RoutingPath::Unrewritten(path) => path.as_str(),
            RoutingPath::Rewritten(path) => &path.original,
        }
    }

    /// Path used for internal routing.
    pub fn routed(&self) -> &str {
        match self {
            RoutingPath::Unrewritten(path) => path.as_str(),
            RoutingPath::Rewritten(path) => &path.path_info,
        }
    }

    /// Empty for the public context.
    pub fn script_prefix(&self) -> &str {
        match self {
            RoutingPath::Unrewritten(_) => "",
            RoutingPath::Rewritten(path) => &path.script_prefix,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, RoutingPath::Rewritten(_))
    }
}
