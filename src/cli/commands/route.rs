use serde::Serialize;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::tenancy::{ClassifyError, PathClassifier, Resolution, RoutingPath, UnrewrittenPath};

/// What the request pipeline would do with a path, without binding a connection.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RouteReport {
    pub path: String,
    /// `tenant`, `public` or `not_found`
    pub context: &'static str,
    pub tenant: Option<String>,
    pub routed_path: Option<String>,
    pub script_prefix: Option<String>,
}

pub async fn describe(classifier: &PathClassifier, path: &str) -> anyhow::Result<RouteReport> {
    let unrewritten = UnrewrittenPath::new(path);

    let report = match classifier.classify(path).await {
        Ok(Resolution::Public) => {
            let routing = RoutingPath::Unrewritten(unrewritten);
            RouteReport {
                path: path.to_string(),
                context: "public",
                tenant: None,
                routed_path: Some(routing.routed().to_string()),
                script_prefix: Some(routing.script_prefix().to_string()),
            }
        }
        Ok(Resolution::Tenant(tenant)) => {
            let routing = RoutingPath::Rewritten(unrewritten.rewrite(&tenant.schema_name)?);
            RouteReport {
                path: path.to_string(),
                context: "tenant",
                tenant: Some(tenant.schema_name),
                routed_path: Some(routing.routed().to_string()),
                script_prefix: Some(routing.script_prefix().to_string()),
            }
        }
        Err(ClassifyError::TenantNotFound(slug)) => RouteReport {
            path: path.to_string(),
            context: "not_found",
            tenant: Some(slug),
            routed_path: None,
            script_prefix: None,
        },
        Err(e) => return Err(e.into()),
    };

    Ok(report)
}

pub async fn handle(path: &str, classifier: &PathClassifier, output_format: OutputFormat) -> anyhow::Result<()> {
    let report = describe(classifier, path).await?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "route": report }))?);
        }
        OutputFormat::Text => {
            let none = || "-".to_string();
            print_fields(&[
                ("Path", report.path.clone()),
                ("Context", report.context.to_string()),
                ("Tenant", report.tenant.clone().unwrap_or_else(none)),
                ("Routed path", report.routed_path.clone().unwrap_or_else(none)),
                ("Script prefix", report.script_prefix.clone().unwrap_or_else(none)),
            ]);
        }
    }

    Ok(())
}
