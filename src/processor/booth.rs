//! Booth number extraction

use regex::Regex;
use std::sync::LazyLock;

/// "Booth" on English pages, "Stand" in Dutch, French and German
static BOOTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:booth|stand)\s*[:#]?\s*(\d{1,4})").expect("valid regex")
});

/// Returns the first booth or stand number mentioned in `text`
///
/// # Examples
///
/// ```
/// use xpo_harvest::processor::extract_booth_number;
///
/// assert_eq!(
///     extract_booth_number("...visit us at Booth: 142 for more..."),
///     Some("142".to_string())
/// );
/// assert_eq!(extract_booth_number("Stand 07"), Some("07".to_string()));
/// assert_eq!(extract_booth_number("no booth info here"), None);
/// ```
pub fn extract_booth_number(text: &str) -> Option<String> {
    BOOTH_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
