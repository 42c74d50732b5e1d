//! Event detail page extraction

use crate::aggregator::EventFields;
use crate::config::EventSelectors;
use crate::processor::text::{collapse_whitespace, first_attr, first_text};
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Compiled CSS selectors for event detail pages
#[derive(Debug, Clone)]
pub struct EventExtractor {
    title: Selector,
    date: Selector,
    location: Selector,
    image: Selector,
    description: Selector,
    og_image: Selector,
    og_description: Selector,
    mailto: Selector,
}

fn compile(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|_| {
        ConfigError::Validation(format!("selector '{}' ('{}') does not parse", name, css))
    })
}

impl EventExtractor {
    /// Compiles the configured selectors
    pub fn new(selectors: &EventSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile("title", &selectors.title)?,
            date: compile("date", &selectors.date)?,
            location: compile("location", &selectors.location)?,
            image: compile("image", &selectors.image)?,
            description: compile("description", &selectors.description)?,
            og_image: compile("og:image", r#"meta[property="og:image"]"#)?,
            og_description: compile("og:description", r#"meta[property="og:description"]"#)?,
            mailto: compile("mailto", r#"a[href^="mailto:"]"#)?,
        })
    }

    /// Reads the event fields from a detail page
    ///
    /// # Field sources
    ///
    /// | Field | Source |
    /// |-------|--------|
    /// | title | text of the title selector (`h1`), "" if absent |
    /// | date, location | text of their selectors |
    /// | image_url | `og:image`, else the image selector's `src`, made absolute |
    /// | description | `og:description`, else the description selector's text |
    /// | contact_email_on_main_site | first `mailto:` link, query stripped |
    pub fn extract(&self, url: &Url, document: &Html) -> EventFields {
        let image_url = first_attr(document, &self.og_image, "content")
            .or_else(|| first_attr(document, &self.image, "src"))
            .and_then(|src| url.join(&src).ok())
            .map(|u| u.to_string());

        let description = first_attr(document, &self.og_description, "content")
            .map(|d| collapse_whitespace(&d))
            .or_else(|| first_text(document, &self.description));

        let contact_email_on_main_site = first_attr(document, &self.mailto, "href")
            .and_then(|href| {
                let address = href.get("mailto:".len()..)?;
                let address = address.split('?').next().unwrap_or(address).trim();
                (!address.is_empty()).then(|| address.to_string())
            });

        EventFields {
            title: first_text(document, &self.title).unwrap_or_default(),
            date: first_text(document, &self.date),
            location: first_text(document, &self.location),
            image_url,
            event_url: url.to_string(),
            description,
            contact_email_on_main_site,
        }
    }
}
