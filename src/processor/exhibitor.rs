//! Exhibitor list extraction

use crate::config::ExhibitorSelectors;
use crate::processor::text::element_text;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// One row of an exhibitor list; missing fields are ""
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exhibitor {
    pub name: String,
    pub city: String,
    pub country: String,
    pub booth: String,
}

/// Compiled selectors of an exhibitor list page
#[derive(Debug, Clone)]
pub struct ExhibitorExtractor {
    url_marker: String,
    item: Selector,
    name: Selector,
    city: Selector,
    country: Selector,
    booth: Selector,
}

fn compile(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|_| {
        ConfigError::Validation(format!(
            "exhibitor selector '{}' ('{}') does not parse",
            name, css
        ))
    })
}

impl ExhibitorExtractor {
    pub fn new(selectors: &ExhibitorSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            url_marker: selectors.url_marker.clone(),
            item: compile("item", &selectors.item)?,
            name: compile("name", &selectors.name)?,
            city: compile("city", &selectors.city)?,
            country: compile("country", &selectors.country)?,
            booth: compile("booth", &selectors.booth)?,
        })
    }

    /// Returns true if `url` is an exhibitor list page
    pub fn applies_to(&self, url: &Url) -> bool {
        url.as_str().contains(&self.url_marker)
    }

    /// Reads every exhibitor row of a list page, `None` for other pages
    ///
    /// A list page without rows yields an empty list.
    pub fn extract(&self, url: &Url, document: &Html) -> Option<Vec<Exhibitor>> {
        if !self.applies_to(url) {
            return None;
        }

        let exhibitors = document
            .select(&self.item)
            .map(|row| Exhibitor {
                name: field(row, &self.name),
                city: field(row, &self.city),
                country: field(row, &self.country),
                booth: field(row, &self.booth),
            })
            .collect();
        Some(exhibitors)
    }
}

fn field(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector).next().map(element_text).unwrap_or_default()
}
