use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::{ApprovalStatus, NewTenant, SchoolType, Tenant};
use crate::services::{ReviewDecision, TenantService};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants, including pending and deactivated ones")]
    List,

    #[command(about = "Show tenant details and domains")]
    Show {
        #[arg(help = "School ID")]
        slug: String,
    },

    #[command(about = "Register a school application (pending until reviewed)")]
    Create {
        #[arg(help = "School ID, used as the path prefix")]
        slug: String,

        #[arg(help = "School name")]
        name: String,

        #[arg(long, default_value = "basic", help = "primary, jhs, shs, basic or other")]
        school_type: SchoolType,

        #[arg(long, help = "Contact person")]
        contact_name: Option<String>,

        #[arg(long, help = "Contact email")]
        contact_email: Option<String>,
    },

    #[command(about = "Record a review decision")]
    Review {
        #[arg(help = "School ID")]
        slug: String,

        #[arg(help = "pending, under_review, approved, rejected or requires_info")]
        status: ApprovalStatus,

        #[arg(long, help = "Internal admin notes")]
        notes: Option<String>,

        #[arg(long, help = "Reason shown to the applicant; required when rejecting")]
        reason: Option<String>,
    },

    #[command(about = "Deactivate a tenant (soft delete)")]
    Deactivate {
        #[arg(help = "School ID")]
        slug: String,
    },
}

pub async fn handle(cmd: TenantCommands, service: &TenantService, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::List => {
            let tenants = service.list().await?;

            if tenants.is_empty() {
                return output_empty_collection(output_format, "tenants", "No tenants registered");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "tenants": tenants }))?);
                }
                OutputFormat::Text => {
                    println!("{:<20} {:<30} {:<15} {:<8} {}", "SCHOOL ID", "NAME", "STATUS", "ACTIVE", "CREATED");
                    println!("{}", "-".repeat(90));

                    for tenant in &tenants {
                        println!(
                            "{:<20} {:<30} {:<15} {:<8} {}",
                            tenant.schema_name,
                            tenant.name,
                            tenant.approval_status,
                            if tenant.is_active { "yes" } else { "no" },
                            tenant.created_on.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }

            Ok(())
        }
        TenantCommands::Show { slug } => {
            let tenant = service
                .get(&slug)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Tenant '{}' not found", slug))?;
            let domains = service.domains(&slug).await?;

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "tenant": tenant, "domains": domains }))?
                    );
                }
                OutputFormat::Text => {
                    let domains: Vec<&str> = domains.iter().map(|d| d.domain.as_str()).collect();
                    print_fields(&tenant_fields(&tenant, &domains.join(", ")));
                }
            }

            Ok(())
        }
        TenantCommands::Create { slug, name, school_type, contact_name, contact_email } => {
            let tenant = service
                .submit_application(NewTenant {
                    schema_name: slug,
                    name,
                    school_type,
                    contact_name,
                    contact_email,
                })
                .await?;

            output_success(
                output_format,
                &format!("Application for '{}' registered (pending review)", tenant.schema_name),
                Some(json!({ "tenant": tenant })),
            )
        }
        TenantCommands::Review { slug, status, notes, reason } => {
            let tenant = service
                .review(
                    &slug,
                    ReviewDecision {
                        status,
                        admin_notes: notes,
                        rejection_reason: reason,
                    },
                )
                .await?;

            output_success(
                output_format,
                &format!(
                    "Tenant '{}' is now {} ({})",
                    tenant.schema_name,
                    tenant.approval_status,
                    if tenant.is_active { "active" } else { "inactive" }
                ),
                Some(json!({ "tenant": tenant })),
            )
        }
        TenantCommands::Deactivate { slug } => {
            let tenant = service.deactivate(&slug).await?;

            output_success(
                output_format,
                &format!("Tenant '{}' deactivated", tenant.schema_name),
                Some(json!({ "tenant": tenant })),
            )
        }
    }
}

fn tenant_fields(tenant: &Tenant, domains: &str) -> Vec<(&'static str, String)> {
    vec![
        ("School ID", tenant.schema_name.clone()),
        ("Name", tenant.name.clone()),
        ("Type", tenant.school_type.as_str().to_string()),
        ("Status", tenant.approval_status.to_string()),
        ("Active", tenant.is_active.to_string()),
        ("On trial", tenant.on_trial.to_string()),
        ("Contact", tenant.contact_name.clone().unwrap_or_default()),
        ("Email", tenant.contact_email.clone().unwrap_or_default()),
        ("Domains", domains.to_string()),
        ("Created", tenant.created_on.to_rfc3339()),
    ]
}
