//! Ticket link and contact detail heuristics for external event sites

use crate::aggregator::ContactInfo;
use crate::url::extract_authority;
use crate::processor::text::element_text;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Words that mark a link as leading to a ticket shop (English and Dutch)
const TICKET_KEYWORDS: [&str; 11] = [
    "ticket",
    "tickets",
    "kaart",
    "kaarten",
    "kopen",
    "koop",
    "order",
    "bestel",
    "register",
    "inschrijven",
    "preorder",
];

/// Words that mark a link as leading to a booking or pricing page
const BOOKING_KEYWORDS: [&str; 9] = [
    "book", "ticket", "reserv", "prijs", "tarie", "booking", "shop", "koop", "tarieven",
];

/// Words that mark a text line as a postal address
const ADDRESS_KEYWORDS: [&str; 8] = [
    "straat",
    "laan",
    "weg",
    "plein",
    "boulevard",
    "address",
    "adres",
    "doorniksesteenweg",
];

/// Minimum number of digits for a phone number candidate
const MIN_PHONE_DIGITS: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d \t./()-]{6,}\d").expect("valid regex"));

static ADDRESS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:adres|address)\s*:\s*").expect("valid regex"));

fn has_ticket_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TICKET_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Finds the most likely ticket shop link on a page
///
/// The first anchor whose text or href mentions a ticket keyword wins, as long
/// as its href is absolute or root-relative. Otherwise buttons and ticket-styled
/// elements are inspected for an enclosing form action or a `data-href` /
/// `data-url` attribute.
///
/// # Arguments
///
/// * `document` - The parsed external page
/// * `base_url` - URL the page was fetched from
///
/// # Returns
///
/// The absolute ticket URL, or `None`
pub fn find_ticket_link(document: &Html, base_url: &Url) -> Option<String> {
    let anchors = Selector::parse("a[href]").ok()?;

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if !(has_ticket_keyword(&element_text(anchor)) || has_ticket_keyword(href)) {
            continue;
        }
        if href.starts_with("http") || href.starts_with('/') {
            if let Ok(url) = base_url.join(href) {
                return Some(url.to_string());
            }
        }
    }

    let buttons =
        Selector::parse(r#"button, [role="button"], [onclick*="ticket"], [class*="ticket"]"#)
            .ok()?;

    for button in document.select(&buttons) {
        let form_action = std::iter::once(button)
            .chain(button.ancestors().filter_map(scraper::ElementRef::wrap))
            .find(|el| el.value().name() == "form")
            .and_then(|form| form.value().attr("action"));

        let target = form_action
            .or_else(|| button.value().attr("data-href"))
            .or_else(|| button.value().attr("data-url"));

        if let Some(url) = target.and_then(|t| base_url.join(t.trim()).ok()) {
            return Some(url.to_string());
        }
    }

    None
}

/// Finds booking sub-pages on the same host as `page_url`
///
/// An anchor qualifies when its text or href mentions a booking keyword.
/// Results are absolute, deduplicated and in document order; links to the
/// page itself are left out.
pub fn find_booking_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let authority = extract_authority(page_url);

    let mut links: Vec<Url> = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let text = element_text(anchor).to_lowercase();
        let href_lower = href.to_lowercase();
        if !BOOKING_KEYWORDS
            .iter()
            .any(|kw| text.contains(kw) || href_lower.contains(kw))
        {
            continue;
        }

        let Ok(mut link) = page_url.join(href) else {
            continue;
        };
        link.set_fragment(None);
        if extract_authority(&link) != authority || link == *page_url || links.contains(&link) {
            continue;
        }
        links.push(link);
    }
    links
}

/// Extracts emails, phone numbers and address lines from page text
///
/// Lines are separated by newlines. Phone numbers are reduced to their digits
/// and kept when they have at least eight. Address lines must contain a street
/// keyword and a digit; a leading `Adres:` / `Address:` label is removed. Each
/// list keeps first-seen order without duplicates.
///
/// # Examples
///
/// ```
/// use xpo_harvest::processor::find_contact_info;
///
/// let info = find_contact_info("Mail info@expo.example.com\nTel +32 56 24 11 11\nAdres: Doorniksesteenweg 216");
/// assert_eq!(info.email, vec!["info@expo.example.com"]);
/// assert_eq!(info.phone, vec!["3256241111"]);
/// assert_eq!(info.address, vec!["Doorniksesteenweg 216"]);
/// ```
pub fn find_contact_info(text: &str) -> ContactInfo {
    let mut info = ContactInfo::default();

    for m in EMAIL_RE.find_iter(text) {
        push_unique(&mut info.email, m.as_str().to_string());
    }

    for m in PHONE_RE.find_iter(text) {
        let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
        if digits.len() >= MIN_PHONE_DIGITS {
            push_unique(&mut info.phone, digits);
        }
    }

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lowered = line.to_lowercase();
        let has_keyword = ADDRESS_KEYWORDS.iter().any(|kw| lowered.contains(kw));
        if has_keyword && line.chars().any(|c| c.is_ascii_digit()) {
            let cleaned = ADDRESS_PREFIX_RE.replace(line, "").trim().to_string();
            push_unique(&mut info.address, cleaned);
        }
    }

    info
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
