use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use pajemploi_core::{ConnectorError, DownloadRequest, FileStore, PortalTransport, SaveReport};

/// Stores payslips on the local filesystem, downloading them through the
/// portal session they were listed with.
pub struct LocalFileStore {
    transport: Arc<dyn PortalTransport>,
    skip_existing: bool,
}

impl LocalFileStore {
    pub fn new(transport: Arc<dyn PortalTransport>, skip_existing: bool) -> Self {
        Self {
            transport,
            skip_existing,
        }
    }

    async fn save_one(&self, dir: &Path, request: &DownloadRequest) -> Result<bool, ConnectorError> {
        let path = dir.join(&request.filename);

        if self.skip_existing && self.exists(&path).await? {
            debug!(path = %path.display(), "file already present, skipping");
            return Ok(false);
        }

        let resp = self.transport.send(&request.fetch).await?;

        // Write beside the target first so an interrupted run never leaves a
        // truncated payslip under the final name.
        let partial = dir.join(format!(".{}.part", request.filename));
        if let Err(e) = write_then_rename(&partial, &path, &resp.body).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = resp.body.len(), "payslip saved");
        Ok(true)
    }
}

async fn write_then_rename(partial: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, body).await?;
    tokio::fs::rename(partial, path).await
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, path: &Path) -> Result<bool, ConnectorError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn create_dir(&self, parent: &Path, name: &str) -> Result<PathBuf, ConnectorError> {
        let path = parent.join(folder_name(name));
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }

    async fn save_files(
        &self,
        dir: &Path,
        requests: &[DownloadRequest],
    ) -> Result<SaveReport, ConnectorError> {
        let mut report = SaveReport::default();
        let mut failures = Vec::new();

        for request in requests {
            match self.save_one(dir, request).await {
                Ok(true) => report.saved += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(file = %request.filename, error = %e, "failed to save payslip");
                    failures.push(format!("{}: {}", request.filename, e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(ConnectorError::Storage(format!(
                "{} of {} files failed in {} ({})",
                failures.len(),
                requests.len(),
                dir.display(),
                failures.join("; ")
            )));
        }

        info!(dir = %dir.display(), saved = report.saved, skipped = report.skipped, "files saved");
        Ok(report)
    }
}

/// Ensure `parent/name` exists, creating it if needed. An existing directory
/// is not an error.
pub async fn ensure_dir(
    store: &dyn FileStore,
    parent: &Path,
    name: &str,
) -> Result<PathBuf, ConnectorError> {
    let path = parent.join(folder_name(name));
    if store.exists(&path).await? {
        return Ok(path);
    }

    info!(folder = %path.display(), "folder does not exist yet, creating it");
    store.create_dir(parent, name).await
}

/// Directory name for an employee. Path separators and parent references
/// are neutralised so the name stays inside the destination.
pub fn folder_name(employee: &str) -> String {
    let cleaned: String = employee
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Folder names for a set of employees, one per entry and pairwise distinct
/// even on case-insensitive filesystems. Names that clean up to the same
/// folder get ` (2)`, ` (3)`... suffixes. Suffixes are handed out in name
/// order, so the assignment does not depend on listing order.
pub fn folder_names(employees: &[&str]) -> Vec<String> {
    let bases: Vec<String> = employees.iter().map(|e| folder_name(e)).collect();
    let reserved: HashSet<String> = bases.iter().map(|b| b.to_lowercase()).collect();

    let mut order: Vec<usize> = (0..employees.len()).collect();
    order.sort_by(|&a, &b| employees[a].cmp(employees[b]));

    let mut taken: HashSet<String> = HashSet::new();
    let mut names = vec![String::new(); employees.len()];

    for i in order {
        let base = &bases[i];
        let mut name = base.clone();
        let mut n = 1;
        // A suffixed name must not take the plain name of another employee.
        while taken.contains(&name.to_lowercase())
            || (n > 1 && reserved.contains(&name.to_lowercase()))
        {
            n += 1;
            name = format!("{} ({})", base, n);
        }
        taken.insert(name.to_lowercase());
        names[i] = name;
    }

    names
}
