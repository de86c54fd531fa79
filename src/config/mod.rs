use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub tenancy: TenancyConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Falls back to `DATABASE_URL` when unset.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait when acquiring a pooled connection.
    pub connection_timeout: u64,
    /// Reconnect attempts after the first stale-connection failure.
    pub stale_retry_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub public_schema_name: String,
    /// Path segments that never name a tenant. Slug validation reads the same
    /// list; the routes the platform itself mounts are always added.
    pub reserved_routes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_RESERVED_ROUTES: &[&str] = &[
    "static",
    "media",
    "admin",
    "accounts",
    "signup",
    "login",
    "logout",
    "debug",
    "favicon.ico",
    "dashboard",
    "password",
    "reset",
    "school",
    "register",
    "health",
    "landlord",
];

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            public_schema_name: "public".to_string(),
            reserved_routes: DEFAULT_RESERVED_ROUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Profile defaults, then the optional YAML file, then individual env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("SCHOOL_CONFIG_FILE") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::for_environment(Self::environment_from_env()),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_env() -> Self {
        Self::for_environment(Self::environment_from_env()).with_env_overrides()
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    fn environment_from_env() -> Environment {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_STALE_RETRY_LIMIT") {
            self.database.stale_retry_limit = v.parse().unwrap_or(self.database.stale_retry_limit);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_PUBLIC_SCHEMA") {
            if !v.trim().is_empty() {
                self.tenancy.public_schema_name = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("TENANCY_RESERVED_ROUTES") {
            self.tenancy.reserved_routes = split_list(&v);
        }

        // API overrides
        if let Ok(v) = env::var("SCHOOL_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                stale_retry_limit: 2,
            },
            tenancy: TenancyConfig::default(),
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:8000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                stale_retry_limit: 2,
            },
            tenancy: TenancyConfig::default(),
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                stale_retry_limit: 2,
            },
            tenancy: TenancyConfig::default(),
            api: ApiConfig {
                port: 8000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Read once at startup and never mutated afterwards
static CONFIG: Lazy<AppConfig> = Lazy::new(|| match AppConfig::load() {
    Ok(config) => config,
    Err(e) => {
        tracing::error!("{}; falling back to environment defaults", e);
        AppConfig::from_env()
    }
});

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.stale_retry_limit, 2);
        assert_eq!(config.tenancy.public_schema_name, "public");
        assert!(config.security.enable_cors);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn reserved_routes_cover_platform_paths() {
        let tenancy = TenancyConfig::default();
        for route in ["admin", "static", "login", "dashboard", "health", "landlord", "signup"] {
            assert!(tenancy.reserved_routes.iter().any(|r| r == route), "missing {}", route);
        }
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" admin, ,static,"), vec!["admin", "static"]);
    }

    #[test]
    fn yaml_round_trips_through_serde() {
        let yaml = r#"
environment: staging
database:
  max_connections: 4
  connection_timeout: 3
  stale_retry_limit: 1
tenancy:
  public_schema_name: shared
  reserved_routes: [admin, static]
api:
  port: 9000
  enable_request_logging: false
security:
  enable_cors: false
  cors_origins: []
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.database.url, None);
        assert_eq!(config.tenancy.public_schema_name, "shared");
        assert_eq!(config.tenancy.reserved_routes, vec!["admin", "static"]);
        assert_eq!(config.api.port, 9000);
    }
}
