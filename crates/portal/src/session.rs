use std::sync::Arc;

use pajemploi_core::{AuthResult, ConnectorError, Endpoints, FetchResponse, PortalTransport, RemoteFetch};

/// An established portal login. Cloning is cheap; every clone shares the
/// same transport and therefore the same cookies.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn PortalTransport>,
    endpoints: Endpoints,
    auth: AuthResult,
}

impl Session {
    pub(crate) fn new(transport: Arc<dyn PortalTransport>, endpoints: Endpoints, auth: AuthResult) -> Self {
        Self { transport, endpoints, auth }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// How the login page was classified. Never `Failed`.
    pub fn auth(&self) -> AuthResult {
        self.auth
    }

    pub async fn send(&self, request: &RemoteFetch) -> Result<FetchResponse, ConnectorError> {
        self.transport.send(request).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints)
            .field("auth", &self.auth)
            .finish()
    }
}
