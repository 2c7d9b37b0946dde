use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, warn};
use url::Url;

use pajemploi_core::config::PortalConfig;
use pajemploi_core::{ConnectorError, FetchResponse, FormEncoding, PortalTransport, RemoteFetch};

/// reqwest-backed transport. The client keeps the session cookies, so every
/// request sent through one `HttpTransport` shares the same login.
pub struct HttpTransport {
    client: reqwest::Client,
    max_body_size: usize,
}

impl HttpTransport {
    pub fn new(config: &PortalConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ConnectorError::Network(e.to_string()))?;

        Ok(Self {
            client,
            max_body_size: config.max_body_size(),
        })
    }

    fn build(&self, request: &RemoteFetch) -> reqwest::RequestBuilder {
        let builder = self.client.post(request.url.as_str());

        if request.form.is_empty() {
            return builder;
        }

        match request.encoding {
            FormEncoding::UrlEncoded => builder.form(&request.form),
            FormEncoding::Multipart => {
                let form = request
                    .form
                    .iter()
                    .fold(multipart::Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()));
                builder.multipart(form)
            }
        }
    }
}

#[async_trait]
impl PortalTransport for HttpTransport {
    async fn send(&self, request: &RemoteFetch) -> Result<FetchResponse, ConnectorError> {
        let start = Instant::now();
        let url = &request.url;
        debug!(url = %url, "sending portal request");

        let resp = self.build(request).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "portal request failed");
            ConnectorError::Network(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ConnectorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = Url::parse(resp.url().as_str()).unwrap_or_else(|_| url.clone());

        let body = resp
            .bytes()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;

        if body.len() > self.max_body_size {
            return Err(ConnectorError::BodyTooLarge {
                size: body.len(),
                max: self.max_body_size,
            });
        }

        debug!(
            url = %url,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "portal response received"
        );

        Ok(FetchResponse {
            final_url,
            body: body.to_vec(),
        })
    }
}
