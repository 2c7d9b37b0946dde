use once_cell::sync::Lazy;
use regex::Regex;

use pajemploi_core::{ConnectorError, Period};

// The listing formats its first row as "2018-01-01 00:00:00.0" and every
// following row as "01/2018".
static FR_PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{2})/(\d{4})").unwrap());

static ISO_PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{4})-(\d{2})").unwrap());

/// Parse a listing period cell, either `MM/YYYY…` or `YYYY-MM…`.
pub fn parse_period(input: &str) -> Result<Period, ConnectorError> {
    if let Some(caps) = FR_PERIOD_RE.captures(input) {
        return Ok(Period {
            year: caps[2].to_string(),
            month: caps[1].to_string(),
        });
    }

    if let Some(caps) = ISO_PERIOD_RE.captures(input) {
        return Ok(Period {
            year: caps[1].to_string(),
            month: caps[2].to_string(),
        });
    }

    Err(ConnectorError::MalformedPeriod(input.to_string()))
}
