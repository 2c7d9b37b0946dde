use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use pajemploi_core::Credentials;

/// Environment variable holding the fields supplied by the orchestrating
/// platform, as a JSON object.
pub const FIELDS_ENV: &str = "PAJEMPLOI_FIELDS";

#[derive(Parser)]
#[command(name = "pajemploi", about = "Pajemploi payslip connector")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and download every payslip into per-employee folders
    Fetch {
        /// Pajemploi account login
        #[arg(short, long)]
        login: Option<String>,

        /// Pajemploi account password
        #[arg(short, long)]
        password: Option<String>,

        /// Folder receiving one sub-folder per employee
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },
    /// Parse a saved listing page and print the download plan
    ParseListing {
        /// HTML file returned by the listing endpoint
        file: PathBuf,
    },
    /// Classify a saved post-login page
    CheckLogin {
        /// HTML file returned by the login endpoint
        file: PathBuf,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Fields {
    login: Option<String>,
    password: Option<String>,
    #[serde(rename = "folderPath")]
    folder_path: Option<PathBuf>,
}

/// Merge command-line values with the JSON fields from the environment.
/// Command-line values win.
pub fn resolve_fields(
    login: Option<String>,
    password: Option<String>,
    destination: Option<PathBuf>,
    env_fields: Option<&str>,
) -> Result<(Credentials, PathBuf)> {
    let fields: Fields = match env_fields {
        Some(json) => serde_json::from_str(json)
            .with_context(|| format!("{} is not a valid JSON object", FIELDS_ENV))?,
        None => Fields::default(),
    };

    let login = login.or(fields.login);
    let password = password.or(fields.password);
    let destination = destination.or(fields.folder_path);

    let (Some(login), Some(password), Some(destination)) = (login, password, destination) else {
        bail!(
            "login, password and destination are required (flags or {} with login/password/folderPath)",
            FIELDS_ENV
        );
    };

    Ok((Credentials { login, password }, destination))
}
