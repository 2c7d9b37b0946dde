use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Datelike;
use url::Url;

use crate::error::ConnectorError;

/// Anything able to carry a request to the portal. Implementations own the
/// cookie jar, so one instance is one session.
#[async_trait]
pub trait PortalTransport: Send + Sync + 'static {
    async fn send(&self, request: &RemoteFetch) -> Result<FetchResponse, ConnectorError>;
}

/// Destination for downloaded payslips.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    async fn exists(&self, path: &Path) -> Result<bool, ConnectorError>;

    /// Create directory `name` under `parent` and return its full path.
    async fn create_dir(&self, parent: &Path, name: &str) -> Result<PathBuf, ConnectorError>;

    /// Fetch every request and store it as `dir/filename`.
    async fn save_files(
        &self,
        dir: &Path,
        requests: &[DownloadRequest],
    ) -> Result<SaveReport, ConnectorError>;
}

#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of inspecting the page returned by the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Success,
    Failed,
    Ambiguous,
}

/// A payslip month, both parts kept as the zero-padded text the portal uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    pub year: String,
    pub month: String,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipRecord {
    /// `YYYY-MM`
    pub period: String,
    pub employee: String,
    pub amount: String,
    pub r#ref: String,
    pub norng: String,
}

/// Payslips grouped per employee. Groups appear in first-seen order and keep
/// the relative order of their records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayslipsByEmployee {
    groups: Vec<(String, Vec<PayslipRecord>)>,
}

impl PayslipsByEmployee {
    pub fn group(records: Vec<PayslipRecord>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<PayslipRecord>)> = Vec::new();

        for record in records {
            match index.get(&record.employee) {
                Some(&i) => groups[i].1.push(record),
                None => {
                    index.insert(record.employee.clone(), groups.len());
                    groups.push((record.employee.clone(), vec![record]));
                }
            }
        }

        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PayslipRecord])> {
        self.groups
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn employee_count(&self) -> usize {
        self.groups.len()
    }

    pub fn payslip_count(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    UrlEncoded,
    Multipart,
}

/// Everything needed to issue one request against the portal. Every
/// portal endpoint is a form POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFetch {
    pub url: Url,
    pub form: Vec<(String, String)>,
    pub encoding: FormEncoding,
}

impl RemoteFetch {
    pub fn post_form(url: Url, form: &[(&str, &str)]) -> Self {
        Self {
            url,
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            encoding: FormEncoding::UrlEncoded,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Where the request ended up after redirects.
    pub final_url: Url,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One payslip file to retrieve: where to store it and how to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub filename: String,
    pub fetch: RemoteFetch,
}

impl DownloadRequest {
    pub fn for_payslip(record: &PayslipRecord, download_url: &Url) -> Self {
        Self {
            filename: format!("{}.pdf", record.period),
            fetch: RemoteFetch {
                url: download_url.clone(),
                form: vec![
                    ("ref".to_string(), record.r#ref.clone()),
                    ("norng".to_string(), record.norng.clone()),
                ],
                encoding: FormEncoding::Multipart,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for SaveReport {
    fn add_assign(&mut self, other: Self) {
        self.saved += other.saved;
        self.skipped += other.skipped;
    }
}

/// Month range sent with the listing request. The portal has no "all time"
/// query, so both ends are always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start_year: i32,
    pub start_month: u32,
    pub end_year: i32,
    pub end_month: u32,
}

impl QueryRange {
    pub fn through(start_year: i32, start_month: u32, today: chrono::NaiveDate) -> Self {
        Self {
            start_year,
            start_month,
            end_year: today.year(),
            end_month: today.month(),
        }
    }

    pub fn start(&self) -> Period {
        Period {
            year: self.start_year.to_string(),
            month: format!("{:02}", self.start_month),
        }
    }

    pub fn end(&self) -> Period {
        Period {
            year: self.end_year.to_string(),
            month: format!("{:02}", self.end_month),
        }
    }
}
