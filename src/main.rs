mod cli;
mod commands;
mod fetch;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use pajemploi_core::config::AppConfig;

use crate::cli::{resolve_fields, Cli, Commands, FIELDS_ENV};
use crate::fetch::run_fetch;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config = AppConfig::from_toml(&config_str)?;

    // Lets tests and staging point the connector at another host
    if let Ok(v) = std::env::var("PAJEMPLOI_BASE_URL") {
        if !v.trim().is_empty() {
            config.portal.base_url = v;
        }
    }

    match cli.command {
        Commands::Fetch {
            login,
            password,
            destination,
        } => {
            let env_fields = std::env::var(FIELDS_ENV).ok();
            let (credentials, destination) =
                resolve_fields(login, password, destination, env_fields.as_deref())?;

            match run_fetch(&config, &credentials, &destination).await {
                Ok(summary) => info!(
                    employees = summary.employees,
                    payslips = summary.payslips,
                    "connector finished"
                ),
                Err(e) => {
                    error!(code = e.code(), "{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::ParseListing { file } => {
            commands::inspect::parse_listing_file(&config, &file)?;
        }
        Commands::CheckLogin { file } => {
            commands::inspect::check_login_file(&config, &file)?;
        }
    }

    Ok(())
}
