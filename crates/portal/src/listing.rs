use tracing::{info, warn};

use pajemploi_core::{ConnectorError, PayslipRecord, QueryRange, RemoteFetch};
use pajemploi_parser::parse_listing;

use crate::session::Session;

/// The listing request for every payslip issued in `range`, newest first.
pub fn listing_request(session: &Session, range: &QueryRange) -> RemoteFetch {
    let start = range.start();
    let end = range.end();

    RemoteFetch::post_form(
        session.endpoints().listing.clone(),
        &[
            ("activite", "T"),
            ("byAsc", "false"),
            ("dtDebAnnee", start.year.as_str()),
            ("dtDebMois", start.month.as_str()),
            ("dtFinAnnee", end.year.as_str()),
            ("dtFinMois", end.month.as_str()),
            ("noIntSala", ""),
            ("order", "periode"),
            ("paye", "false"),
        ],
    )
}

/// Request the full listing for `range` and parse it.
pub async fn fetch_payslips(
    session: &Session,
    range: &QueryRange,
) -> Result<Vec<PayslipRecord>, ConnectorError> {
    info!(
        "looking for payslips between {}/{} and {}/{}",
        range.start().month,
        range.start().year,
        range.end().month,
        range.end().year
    );

    let resp = session.send(&listing_request(session, range)).await?;
    let payslips = parse_listing(&resp.text())?;

    if payslips.is_empty() {
        warn!("no payslips found");
    } else {
        info!(count = payslips.len(), "found payslips");
    }

    Ok(payslips)
}
