pub mod auth;
pub mod http;
pub mod listing;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use self::auth::Authenticator;
pub use self::http::HttpTransport;
pub use self::listing::{fetch_payslips, listing_request};
pub use self::session::Session;
