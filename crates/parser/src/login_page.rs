use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use pajemploi_core::AuthResult;

static LOGIN_INPUT: Lazy<Selector> = Lazy::new(|| Selector::parse("input#j_username").unwrap());

static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Classify the page served after submitting the login form.
///
/// The username input wins over everything else: if the form is still
/// there, the credentials were refused even when the page also carries a
/// logout link.
pub fn classify_login_page(html: &str, logout_url: &Url) -> AuthResult {
    let document = Html::parse_document(html);

    if document.select(&LOGIN_INPUT).next().is_some() {
        return AuthResult::Failed;
    }

    let has_logout_link = document
        .select(&LINKS)
        .filter_map(|el| el.value().attr("href"))
        .any(|href| href == logout_url.as_str());

    if has_logout_link {
        AuthResult::Success
    } else {
        AuthResult::Ambiguous
    }
}
