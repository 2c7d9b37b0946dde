use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;

use pajemploi_core::{ConnectorError, FetchResponse, PortalTransport, RemoteFetch};

/// Serves canned bodies by URL and records every request it sees.
#[derive(Default)]
pub struct FakeTransport {
    pages: HashMap<String, String>,
    pub sent: Mutex<Vec<RemoteFetch>>,
}

impl FakeTransport {
    pub fn with_page(mut self, url: &url::Url, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn sent(&self) -> Vec<RemoteFetch> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortalTransport for FakeTransport {
    async fn send(&self, request: &RemoteFetch) -> Result<FetchResponse, ConnectorError> {
        self.sent.lock().unwrap().push(request.clone());

        let body = self.pages.get(request.url.as_str()).ok_or_else(|| ConnectorError::Status {
            url: request.url.to_string(),
            status: 404,
        })?;

        Ok(FetchResponse {
            final_url: request.url.clone(),
            body: body.as_bytes().to_vec(),
        })
    }
}

/// Formatted log output of the current thread, WARN and above, collected
/// while the guard returned by `install` is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    /// Lines logged at `level`, e.g. `"WARN"`.
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
