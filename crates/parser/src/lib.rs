pub mod listing;
pub mod login_page;
pub mod period;

pub use listing::parse_listing;
pub use login_page::classify_login_page;
pub use period::parse_period;
