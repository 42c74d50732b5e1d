//! Page processing
//!
//! Turns fetched HTML into records. Everything here is a pure function of the
//! URL, the body and the run context; nothing touches shared crawl state.

mod booth;
mod contact;
mod event;
mod exhibitor;
mod text;

pub use booth::extract_booth_number;
pub use contact::{find_booking_links, find_contact_info, find_ticket_link};
pub use event::EventExtractor;
pub use exhibitor::{Exhibitor, ExhibitorExtractor};
pub use text::{body_text_nodes, collapse_whitespace, visible_text};

use crate::aggregator::ExternalPage;
use crate::url::extract_authority;
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

/// Where a processed page came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A page on the run's primary site
    EventSite,
    /// An external site linked directly from an event page
    PrimaryExternalEventSite,
    /// A booking page found on an external event site
    ExternalEventSubpage,
    /// Anything else
    #[default]
    Other,
}

impl SourceType {
    /// Source type of an external fetch
    pub fn external(deep_dive: bool) -> Self {
        if deep_dive {
            Self::ExternalEventSubpage
        } else {
            Self::PrimaryExternalEventSite
        }
    }
}

/// Flat record emitted for every page in site mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub run_identifier: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub raw_text_content: String,
    pub source_type: SourceType,
    pub booth_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhibitors: Option<Vec<Exhibitor>>,
}

/// Run-level inputs of the page processor
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    /// Lowercase run label copied into every record
    pub run_identifier: &'a str,

    /// Authority of the start URL
    pub primary_authority: &'a str,

    /// Exhibitor list extraction, when configured
    pub exhibitors: Option<&'a ExhibitorExtractor>,
}

impl ProcessContext<'_> {
    /// Classifies a page URL
    pub fn source_type(&self, url: &Url) -> SourceType {
        if extract_authority(url).as_deref() == Some(self.primary_authority) {
            SourceType::EventSite
        } else {
            SourceType::Other
        }
    }
}

/// Builds the page record for fetched HTML
///
/// # Example
///
/// ```
/// use url::Url;
/// use xpo_harvest::processor::{process, ProcessContext, SourceType};
///
/// let ctx = ProcessContext {
///     run_identifier: "ffd",
///     primary_authority: "www.flandersflooringdays.com",
///     exhibitors: None,
/// };
/// let url = Url::parse("https://www.flandersflooringdays.com/en/exhibitors/").unwrap();
/// let html = "<html><head><title> Exhibitors </title></head><body>Stand 07</body></html>";
///
/// let record = process(&url, html, &ctx);
/// assert_eq!(record.title, "Exhibitors");
/// assert_eq!(record.booth_number.as_deref(), Some("07"));
/// assert_eq!(record.source_type, SourceType::EventSite);
/// ```
pub fn process(url: &Url, html: &str, ctx: &ProcessContext<'_>) -> PageRecord {
    process_document(url, &Html::parse_document(html), ctx)
}

/// Builds the page record for an already parsed document
pub fn process_document(url: &Url, document: &Html, ctx: &ProcessContext<'_>) -> PageRecord {
    let raw_text_content = visible_text(document);
    let booth_number = extract_booth_number(&raw_text_content);

    PageRecord {
        run_identifier: ctx.run_identifier.to_string(),
        url: url.to_string(),
        title: page_title(document),
        description: page_description(document),
        raw_text_content,
        source_type: ctx.source_type(url),
        booth_number,
        exhibitors: ctx
            .exhibitors
            .and_then(|extractor| extractor.extract(url, document)),
    }
}

/// Reads title, description, ticket link, contacts and text of an external page
pub fn process_external(url: &Url, document: &Html, source_type: SourceType) -> ExternalPage {
    let nodes = body_text_nodes(document);
    let contact_info = find_contact_info(&nodes.join("\n"));

    ExternalPage {
        title: page_title(document),
        description: page_description(document),
        ticket_url: find_ticket_link(document, url),
        contact_info,
        raw_text_content: collapse_whitespace(&nodes.join(" ")),
        source_type,
    }
}

/// First `<title>` text, trimmed; "" when absent
fn page_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| text::first_text(document, &selector))
        .unwrap_or_default()
}

/// `meta[name=description]`, falling back to `og:description`; "" when absent
fn page_description(document: &Html) -> String {
    [
        r#"meta[name="description"]"#,
        r#"meta[property="og:description"]"#,
    ]
    .iter()
    .filter_map(|css| Selector::parse(css).ok())
    .find_map(|selector| text::first_attr(document, &selector, "content"))
    .unwrap_or_default()
}
