//! HTML link extraction
//!
//! Turns the anchors of a fetched page into absolute http(s) URLs. Canonical
//! `<link>` elements are ignored; only anchors a visitor could click are
//! followed.

use scraper::{Html, Selector};
use url::Url;

/// Extracts every followable link of an already parsed document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against `base_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links (`#section`)
/// - Anything that is not http or https after resolution
///
/// The result keeps document order and may contain duplicates.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Parses raw HTML and extracts its links
///
/// # Example
///
/// ```
/// use xpo_harvest::crawler::extract_links_from_html;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/kalender/">Agenda</a></body></html>"#;
/// let base_url = Url::parse("https://www.kortrijkxpo.com/").unwrap();
/// let links = extract_links_from_html(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://www.kortrijkxpo.com/kalender/");
/// ```
pub fn extract_links_from_html(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    extract_links(&document, base_url)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
