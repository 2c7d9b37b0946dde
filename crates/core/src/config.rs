use serde::Deserialize;
use url::Url;

use crate::error::ConnectorError;

pub const DEFAULT_BASE_URL: &str = "http://www.pajemploi.urssaf.fr/pajeweb";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConnectorError> {
        toml::from_str(s).map_err(|e| ConnectorError::Config(e.to_string()))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
            max_body_size_mb: default_max_body_size_mb(),
        }
    }
}

impl PortalConfig {
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// First month the portal holds data for.
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_start_month")]
    pub start_month: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            start_month: default_start_month(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            skip_existing: default_skip_existing(),
        }
    }
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".to_string()
}
fn default_connect_timeout() -> u64 { 30 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_body_size_mb() -> usize { 20 }
fn default_start_year() -> i32 { 2004 }
fn default_start_month() -> u32 { 1 }
fn default_skip_existing() -> bool { true }

/// Fixed portal endpoints, resolved once from the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: Url,
    pub logout: Url,
    pub listing: Url,
    pub download: Url,
}

impl Endpoints {
    pub fn from_config(portal: &PortalConfig) -> Result<Self, ConnectorError> {
        let base = portal.base_url.trim_end_matches('/');
        let endpoint = |path: &str| {
            Url::parse(&format!("{}/{}", base, path))
                .map_err(|e| ConnectorError::Config(format!("invalid base_url {:?}: {}", base, e)))
        };

        Ok(Self {
            login: endpoint("j_spring_security_check")?,
            logout: endpoint("j_spring_security_logout")?,
            listing: endpoint("ajaxlistebs.jsp")?,
            download: endpoint("paje_bulletinsalaire.pdf")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::from_config(&PortalConfig::default()).unwrap();
        assert_eq!(
            endpoints.login.as_str(),
            "http://www.pajemploi.urssaf.fr/pajeweb/j_spring_security_check"
        );
        assert_eq!(
            endpoints.logout.as_str(),
            "http://www.pajemploi.urssaf.fr/pajeweb/j_spring_security_logout"
        );
        assert_eq!(
            endpoints.listing.as_str(),
            "http://www.pajemploi.urssaf.fr/pajeweb/ajaxlistebs.jsp"
        );
        assert_eq!(
            endpoints.download.as_str(),
            "http://www.pajemploi.urssaf.fr/pajeweb/paje_bulletinsalaire.pdf"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_url() {
        let portal = PortalConfig {
            base_url: "http://127.0.0.1:8080/pajeweb/".into(),
            ..PortalConfig::default()
        };
        let endpoints = Endpoints::from_config(&portal).unwrap();
        assert_eq!(endpoints.listing.as_str(), "http://127.0.0.1:8080/pajeweb/ajaxlistebs.jsp");
    }

    #[test]
    fn test_invalid_base_url() {
        let portal = PortalConfig {
            base_url: "not a url".into(),
            ..PortalConfig::default()
        };
        assert!(matches!(
            Endpoints::from_config(&portal),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml("[storage]\nskip_existing = false\n").unwrap();
        assert!(!config.storage.skip_existing);
        assert_eq!(config.portal.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.listing.start_year, 2004);
        assert_eq!(config.listing.start_month, 1);
    }
}
