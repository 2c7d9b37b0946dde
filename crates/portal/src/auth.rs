use std::sync::Arc;

use tracing::{error, info, warn};

use pajemploi_core::{AuthResult, ConnectorError, Credentials, Endpoints, PortalTransport, RemoteFetch};
use pajemploi_parser::classify_login_page;

use crate::session::Session;

pub struct Authenticator {
    endpoints: Endpoints,
    transport: Arc<dyn PortalTransport>,
}

impl Authenticator {
    pub fn new(endpoints: Endpoints, transport: Arc<dyn PortalTransport>) -> Self {
        Self { endpoints, transport }
    }

    /// The login form request. The portal expects the password twice; the
    /// second copy fills a decoy field.
    pub fn login_request(&self, credentials: &Credentials) -> RemoteFetch {
        RemoteFetch::post_form(
            self.endpoints.login.clone(),
            &[
                ("j_username", credentials.login.as_str()),
                ("j_password", credentials.password.as_str()),
                ("j_passwordfake", credentials.password.as_str()),
            ],
        )
    }

    /// Submit the credentials and classify the resulting page.
    ///
    /// An unrecognised page is logged and accepted; only a page still
    /// showing the login form is an error.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ConnectorError> {
        info!(login = %credentials.login, "authenticating");

        let resp = self.transport.send(&self.login_request(credentials)).await?;
        let auth = classify_login_page(&resp.text(), &self.endpoints.logout);

        match auth {
            AuthResult::Failed => {
                error!("login form still visible: login failed");
                return Err(ConnectorError::LoginFailed);
            }
            AuthResult::Success => info!("logout link found: login successful"),
            AuthResult::Ambiguous => {
                warn!(final_url = %resp.final_url, "cannot find login form or logout link after login")
            }
        }

        Ok(Session::new(Arc::clone(&self.transport), self.endpoints.clone(), auth))
    }
}
