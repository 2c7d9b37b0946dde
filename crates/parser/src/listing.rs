use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use pajemploi_core::{ConnectorError, PayslipRecord};

use crate::period::parse_period;

/// Interactive rows of the payslip table. Header and filler rows carry no
/// click handler.
static ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("#tabVsTous tr[onclick]").unwrap());

static PERIOD_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td:nth-child(1)").unwrap());
static EMPLOYEE_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td:nth-child(2)").unwrap());
static AMOUNT_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td:nth-child(3)").unwrap());

// The download form is filled and submitted from the row's click handler.
// Anything but this exact statement sequence is rejected.
static ONCLICK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^document\.getElementById\('ref'\)\.value='([^']+)';document\.getElementById\('norng'\)\.value='([^']+)';document\.formBulletinSalaire\.submit\(\);$",
    )
    .unwrap()
});

/// Parse the listing page into one record per payslip row, in page order.
///
/// A single malformed row fails the whole listing.
pub fn parse_listing(html: &str) -> Result<Vec<PayslipRecord>, ConnectorError> {
    info!("parsing payslip list");
    let document = Html::parse_document(html);

    let records = document
        .select(&ROWS)
        .enumerate()
        .map(|(i, row)| parse_row(i + 1, row))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), "payslip list parsed");
    Ok(records)
}

fn parse_row(index: usize, row: ElementRef<'_>) -> Result<PayslipRecord, ConnectorError> {
    let period = parse_period(&cell_text(row, &PERIOD_CELL))?;
    let employee = cell_text(row, &EMPLOYEE_CELL).trim().to_string();
    let amount = cell_text(row, &AMOUNT_CELL).trim().to_string();

    let onclick = row.value().attr("onclick").unwrap_or_default();
    let (r#ref, norng) = parse_onclick(onclick).ok_or_else(|| ConnectorError::MalformedRow {
        row: index,
        reason: format!("unexpected click handler {:?}", onclick),
    })?;

    Ok(PayslipRecord {
        period: period.to_string(),
        employee,
        amount,
        r#ref,
        norng,
    })
}

fn cell_text(row: ElementRef<'_>, cell: &Selector) -> String {
    row.select(cell).flat_map(|el| el.text()).collect()
}

fn parse_onclick(onclick: &str) -> Option<(String, String)> {
    let caps = ONCLICK_RE.captures(onclick)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onclick(r: &str, norng: &str) -> String {
        format!(
            "document.getElementById('ref').value='{}';document.getElementById('norng').value='{}';document.formBulletinSalaire.submit();",
            r, norng
        )
    }

    fn row(period: &str, employee: &str, amount: &str, handler: &str) -> String {
        format!(
            r#"<tr class="ligne" onclick="{}"><td>{}</td><td>{}</td><td>
                {}
            </td><td class="picto"><img src="pdf.gif"/></td></tr>"#,
            handler, period, employee, amount
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<div id="listeBS">
                <table id="tabVsTous">
                    <thead><tr><th>Période</th><th>Salarié</th><th>Net</th><th></th></tr></thead>
                    <tbody>{}</tbody>
                </table>
                <form name="formBulletinSalaire" action="paje_bulletinsalaire.pdf" method="post">
                    <input type="hidden" id="ref" name="ref" />
                    <input type="hidden" id="norng" name="norng" />
                </form>
            </div>"#,
            rows.join("\n")
        )
    }

    #[test]
    fn test_parse_both_period_formats() {
        let html = page(&[
            row("2018-03-01 00:00:00.0", "Alice Martin", "412,50 €", &onclick("R3", "N3")),
            row("02/2018", "Alice Martin", "398,00 €", &onclick("R2", "N2")),
            row("01/2018", "Bob Durand", "120,00 €", &onclick("R1", "N1")),
        ]);

        let records = parse_listing(&html).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].period, "2018-03");
        assert_eq!(records[0].employee, "Alice Martin");
        assert_eq!(records[0].amount, "412,50 €");
        assert_eq!(records[0].r#ref, "R3");
        assert_eq!(records[0].norng, "N3");

        assert_eq!(records[1].period, "2018-02");
        assert_eq!(records[2].period, "2018-01");
        assert_eq!(records[2].employee, "Bob Durand");
        assert_eq!(records[2].norng, "N1");

        for record in &records {
            assert_eq!(record.period.len(), 7);
            assert!(!record.r#ref.is_empty());
            assert!(!record.norng.is_empty());
        }
    }

    #[test]
    fn test_rows_without_handler_are_ignored() {
        let html = page(&[
            "<tr><td colspan=\"4\">Aucun bulletin</td></tr>".to_string(),
            row("01/2018", "Alice", "10,00 €", &onclick("R1", "N1")),
        ]);
        assert_eq!(parse_listing(&html).unwrap().len(), 1);
    }

    #[test]
    fn test_rows_outside_listing_table_are_ignored() {
        let html = format!(
            "<table id=\"autre\">{}</table>{}",
            row("01/2018", "Alice", "10,00 €", &onclick("R9", "N9")),
            page(&[])
        );
        assert!(parse_listing(&html).unwrap().is_empty());
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_listing(&page(&[])).unwrap().is_empty());
        assert!(parse_listing("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_handler_aborts_listing() {
        let spaced = onclick("R2", "N2").replace(";document", "; document");
        let html = page(&[
            row("01/2018", "Alice", "10,00 €", &onclick("R1", "N1")),
            row("02/2018", "Alice", "10,00 €", &spaced),
        ]);

        match parse_listing(&html) {
            Err(ConnectorError::MalformedRow { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_handler_must_match_exactly() {
        assert_eq!(
            parse_onclick(&onclick("abc", "42")),
            Some(("abc".to_string(), "42".to_string()))
        );
        assert!(parse_onclick(&onclick("", "42")).is_none());
        assert!(parse_onclick(&onclick("abc", "")).is_none());
        assert!(parse_onclick(&format!(" {}", onclick("abc", "42"))).is_none());
        assert!(parse_onclick(&format!("{}return false;", onclick("abc", "42"))).is_none());
        assert!(parse_onclick(&onclick("abc", "42").replace("'norng'", "'rng'")).is_none());
    }

    #[test]
    fn test_malformed_period_aborts_listing() {
        let html = page(&[row("bientôt", "Alice", "10,00 €", &onclick("R1", "N1"))]);
        assert!(matches!(
            parse_listing(&html),
            Err(ConnectorError::MalformedPeriod(_))
        ));
    }
}
