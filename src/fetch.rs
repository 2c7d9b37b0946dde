use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};
use url::Url;

use pajemploi_core::{
    AppConfig, ConnectorError, Credentials, DownloadRequest, Endpoints, FileStore, PayslipsByEmployee,
    PortalTransport, QueryRange, SaveReport,
};
use pajemploi_portal::{fetch_payslips, Authenticator, HttpTransport};
use pajemploi_storage::{ensure_dir, folder_name, folder_names, LocalFileStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub employees: usize,
    pub payslips: usize,
    pub files: SaveReport,
}

/// One employee's downloads and the folder they are stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeBatch {
    pub employee: String,
    pub folder: String,
    pub requests: Vec<DownloadRequest>,
}

/// Download requests for each employee, in listing order. Every employee
/// gets a folder of its own, even when two names clean up to the same one.
pub fn download_plan(payslips: &PayslipsByEmployee, download_url: &Url) -> Vec<EmployeeBatch> {
    let employees: Vec<&str> = payslips.iter().map(|(employee, _)| employee).collect();
    let folders = folder_names(&employees);

    payslips
        .iter()
        .zip(folders)
        .map(|((employee, records), folder)| {
            if folder != folder_name(employee) {
                warn!(employee = %employee, folder = %folder, "folder name already taken, using a suffixed one");
            }
            EmployeeBatch {
                employee: employee.to_string(),
                folder,
                requests: records
                    .iter()
                    .map(|record| DownloadRequest::for_payslip(record, download_url))
                    .collect(),
            }
        })
        .collect()
}

/// Run one fetch cycle against the live portal, storing files on disk.
pub async fn run_fetch(
    config: &AppConfig,
    credentials: &Credentials,
    destination: &Path,
) -> Result<FetchSummary, ConnectorError> {
    let transport: Arc<dyn PortalTransport> = Arc::new(HttpTransport::new(&config.portal)?);
    let store = Arc::new(LocalFileStore::new(
        Arc::clone(&transport),
        config.storage.skip_existing,
    ));
    let today = chrono::Local::now().date_naive();

    run_with(config, transport, store, credentials, destination, today).await
}

pub async fn run_with(
    config: &AppConfig,
    transport: Arc<dyn PortalTransport>,
    store: Arc<dyn FileStore>,
    credentials: &Credentials,
    destination: &Path,
    today: chrono::NaiveDate,
) -> Result<FetchSummary, ConnectorError> {
    let range = QueryRange::through(config.listing.start_year, config.listing.start_month, today);
    let endpoints = Endpoints::from_config(&config.portal)?;

    let session = Authenticator::new(endpoints, transport).login(credentials).await?;
    let payslips = PayslipsByEmployee::group(fetch_payslips(&session, &range).await?);

    let mut summary = FetchSummary {
        employees: payslips.employee_count(),
        payslips: payslips.payslip_count(),
        files: SaveReport::default(),
    };
    if payslips.is_empty() {
        return Ok(summary);
    }

    let plan = download_plan(&payslips, &session.endpoints().download);
    summary.files = save_per_employee(store, destination, plan).await?;

    info!(
        employees = summary.employees,
        payslips = summary.payslips,
        saved = summary.files.saved,
        skipped = summary.files.skipped,
        "fetch complete"
    );
    Ok(summary)
}

/// One concurrent batch per employee. Every batch runs to completion; the
/// first failure is returned once all of them are done.
async fn save_per_employee(
    store: Arc<dyn FileStore>,
    destination: &Path,
    plan: Vec<EmployeeBatch>,
) -> Result<SaveReport, ConnectorError> {
    let mut batches = JoinSet::new();

    for batch in plan {
        let store = Arc::clone(&store);
        let destination: PathBuf = destination.to_path_buf();

        batches.spawn(async move {
            let result = async {
                let dir = ensure_dir(store.as_ref(), &destination, &batch.folder).await?;
                store.save_files(&dir, &batch.requests).await
            }
            .await;
            (batch.employee, result)
        });
    }

    let mut total = SaveReport::default();
    let mut first_error = None;

    while let Some(joined) = batches.join_next().await {
        match joined {
            Ok((_, Ok(report))) => total += report,
            Ok((employee, Err(e))) => {
                error!(employee = %employee, error = %e, "payslip batch failed");
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!(error = %e, "payslip batch panicked");
                first_error.get_or_insert(ConnectorError::Other(e.into()));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(total),
    }
}
