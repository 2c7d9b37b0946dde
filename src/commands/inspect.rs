use std::path::Path;

use anyhow::{Context, Result};

use pajemploi_core::{AppConfig, AuthResult, Endpoints, PayslipsByEmployee};
use pajemploi_parser::{classify_login_page, parse_listing};

use crate::fetch::download_plan;

fn read_page(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

pub fn parse_listing_file(config: &AppConfig, file: &Path) -> Result<()> {
    let endpoints = Endpoints::from_config(&config.portal)?;
    let payslips = PayslipsByEmployee::group(parse_listing(&read_page(file)?)?);

    println!(
        "Found {} payslips for {} employees:\n",
        payslips.payslip_count(),
        payslips.employee_count()
    );
    for batch in download_plan(&payslips, &endpoints.download) {
        println!("  {}/  ({})", batch.folder, batch.employee);
        for request in &batch.requests {
            println!(
                "    {}  (ref={}, norng={})",
                request.filename,
                request.fetch.field("ref").unwrap_or_default(),
                request.fetch.field("norng").unwrap_or_default()
            );
        }
    }

    Ok(())
}

pub fn check_login_file(config: &AppConfig, file: &Path) -> Result<()> {
    let endpoints = Endpoints::from_config(&config.portal)?;

    match classify_login_page(&read_page(file)?, &endpoints.logout) {
        AuthResult::Success => println!("success: logout link present"),
        AuthResult::Failed => println!("failed: login form still present"),
        AuthResult::Ambiguous => println!("ambiguous: neither login form nor logout link"),
    }

    Ok(())
}
