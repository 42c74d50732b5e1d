//! Visible text extraction

use scraper::{ElementRef, Html, Selector};

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: [&str; 2] = ["script", "style"];

/// Collects the text nodes under `<body>` that are not inside script or style
///
/// Each returned entry is one trimmed, non-empty text node in document order.
pub fn body_text_nodes(document: &Html) -> Vec<String> {
    let Ok(body_selector) = Selector::parse("body") else {
        return Vec::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return Vec::new();
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Returns the visible body text as a single whitespace-collapsed string
pub fn visible_text(document: &Html) -> String {
    collapse_whitespace(&body_text_nodes(document).join(" "))
}

/// Replaces every run of whitespace with one space and trims the ends
///
/// # Examples
///
/// ```
/// use xpo_harvest::processor::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Booth:\n\t142  "), "Booth: 142");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed text of the first element matching `selector`, if non-empty
pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Whitespace-collapsed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Trimmed value of `attr` on the first element matching `selector`
pub fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
