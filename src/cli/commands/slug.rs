use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::tenancy::ReservedRoutes;

/// Checks the naming rules only; whether the ID is taken needs the registry.
pub fn handle(raw: &str, reserved: &ReservedRoutes, output_format: OutputFormat) -> anyhow::Result<()> {
    match reserved.validate_slug(raw) {
        Ok(slug) => output_success(
            output_format,
            &format!("'{}' is a valid school ID", slug),
            Some(json!({ "schema_name": slug })),
        ),
        Err(e) => {
            output_failure(output_format, &e.to_string(), Some(json!({ "input": raw })))?;
            Err(anyhow::anyhow!("invalid school ID '{}'", raw))
        }
    }
}
