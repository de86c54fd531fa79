pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgTenantRegistry};
use crate::services::TenantService;
use crate::tenancy::{PathClassifier, ReservedRoutes};

#[derive(Parser)]
#[command(name = "schoolctl")]
#[command(about = "schoolctl - operator tooling for the multi-tenant school platform")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show how a request path is classified and rewritten")]
    Route {
        #[arg(help = "Request path, e.g. /kings/dashboard/")]
        path: String,
    },

    #[command(about = "Check a school ID against the naming rules (offline)")]
    CheckSlug {
        #[arg(help = "Proposed school ID")]
        slug: String,
    },

    #[command(about = "Tenant registry and approval workflow")]
    Tenants {
        #[command(subcommand)]
        cmd: commands::tenants::TenantCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let reserved = Arc::new(ReservedRoutes::from_config(&config.tenancy));

    match cli.command {
        Commands::CheckSlug { slug } => commands::slug::handle(&slug, &reserved, output_format),
        Commands::Route { path } => {
            let database = connect(config).await?;
            let registry = Arc::new(PgTenantRegistry::new(database.pool().clone()));
            let classifier = PathClassifier::new(reserved, registry);
            let result = commands::route::handle(&path, &classifier, output_format).await;
            database.close().await;
            result
        }
        Commands::Tenants { cmd } => {
            let database = connect(config).await?;
            let registry = Arc::new(PgTenantRegistry::new(database.pool().clone()));
            let service = TenantService::new(registry, reserved);
            let result = commands::tenants::handle(cmd, &service, output_format).await;
            database.close().await;
            result
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<DatabaseManager> {
    Ok(DatabaseManager::connect(&config.database, &config.tenancy.public_schema_name).await?)
}
