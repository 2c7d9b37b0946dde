pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, Endpoints};
pub use error::ConnectorError;
pub use types::*;
