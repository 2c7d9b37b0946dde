use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("LOGIN_FAILED")]
    LoginFailed,

    #[error("malformed payslip row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("malformed period: {0:?}")]
    MalformedPeriod(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("body too large: {size} bytes (max {max})")]
    BodyTooLarge { size: usize, max: usize },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ConnectorError {
    /// Classification reported to the orchestrating caller.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectorError::LoginFailed => "LOGIN_FAILED",
            _ => "UNKNOWN_ERROR",
        }
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        ConnectorError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ConnectorError::LoginFailed.code(), "LOGIN_FAILED");
        assert_eq!(ConnectorError::LoginFailed.to_string(), "LOGIN_FAILED");
        assert_eq!(
            ConnectorError::MalformedPeriod("garbage".into()).code(),
            "UNKNOWN_ERROR"
        );
        assert_eq!(
            ConnectorError::Status { url: "http://x/".into(), status: 500 }.code(),
            "UNKNOWN_ERROR"
        );
    }
}
