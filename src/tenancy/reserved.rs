use std::collections::HashSet;
use thiserror::Error;

use crate::config::TenancyConfig;

pub const SLUG_MIN_LEN: usize = 2;
pub const SLUG_MAX_LEN: usize = 50;

/// Segments the router mounts in the public context. Always reserved,
/// whatever the configured list says.
pub const PLATFORM_ROUTES: &[&str] = &["health", "signup", "landlord", "dashboard"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("School ID must be between {} and {} characters", SLUG_MIN_LEN, SLUG_MAX_LEN)]
    Length,

    #[error("School ID must contain only lowercase letters and numbers (no spaces)")]
    Characters,

    #[error("'{0}' is a reserved system name")]
    Reserved(String),
}

/// Process-wide set of first path segments that belong to the platform.
///
/// The path classifier and the slug validator both hold the same value, so a
/// slug that passes validation can never shadow a platform route.
#[derive(Debug, Clone)]
pub struct ReservedRoutes {
    public_schema: String,
    routes: HashSet<String>,
}

impl ReservedRoutes {
    pub fn new<I, S>(public_schema: impl Into<String>, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut routes: HashSet<String> = routes.into_iter().map(Into::into).collect();
        routes.extend(PLATFORM_ROUTES.iter().map(|r| r.to_string()));

        Self {
            public_schema: public_schema.into(),
            routes,
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(config.public_schema_name.clone(), config.reserved_routes.iter().cloned())
    }

    pub fn public_schema(&self) -> &str {
        &self.public_schema
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, segment: &str) -> bool {
        self.routes.contains(segment)
    }

    /// True when the segment always resolves to the public context.
    pub fn is_public_segment(&self, segment: &str) -> bool {
        segment == self.public_schema || self.contains(segment)
    }

    /// Normalizes a requested slug and checks its shape and reservation.
    /// Uniqueness against existing tenants is the registry's concern.
    pub fn validate_slug(&self, raw: &str) -> Result<String, SlugError> {
        let slug = raw.trim().to_lowercase();

        if slug.len() < SLUG_MIN_LEN || slug.len() > SLUG_MAX_LEN {
            return Err(SlugError::Length);
        }
        if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(SlugError::Characters);
        }
        if self.is_public_segment(&slug) {
            return Err(SlugError::Reserved(slug));
        }

        Ok(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }
}

impl Default for ReservedRoutes {
    fn default() -> Self {
        Self::from_config(&TenancyConfig::default())
    }
}
