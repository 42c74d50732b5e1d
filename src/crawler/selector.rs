//! Language variant selection
//!
//! Event sites publish the same page under several language prefixes
//! (`/en/b`, `/nl/b`, `/b`). Links found on one page are grouped by their
//! language-stripped path and only one link per group is followed: the English
//! variant if present, otherwise the unprefixed default, otherwise none.

use crate::state::VisitedRegistry;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// Base language codes recognized as a path prefix
const KNOWN_LANGUAGES: [&str; 4] = ["en", "nl", "fr", "de"];

static LANGUAGE_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]{2})(?:[-_][a-z]{2})?$").expect("valid regex")
});

/// Language class of a single link inside its group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageClass {
    /// `en` or a regional English variant such as `en-gb`
    English,
    /// No language prefix
    Default,
    /// Any other known language, carrying the full tag (`nl`, `fr-be`)
    Other(String),
}

/// Outcome of filtering one page's links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Canonical links to enqueue, in group first-encounter order
    pub selected: Vec<Url>,

    /// Candidates dropped as non-canonical variants or already visited
    pub dropped: usize,
}

/// Returns the lowercase language tag of the first path segment, if any
///
/// # Examples
///
/// ```
/// use url::Url;
/// use xpo_harvest::crawler::language_tag;
///
/// let url = Url::parse("https://example.com/fr-BE/programma/").unwrap();
/// assert_eq!(language_tag(&url), Some("fr-be".to_string()));
/// let url = Url::parse("https://example.com/it/programma/").unwrap();
/// assert_eq!(language_tag(&url), None);
/// ```
pub fn language_tag(url: &Url) -> Option<String> {
    let first = url.path().trim_start_matches('/').split('/').next()?;
    let lowered = first.to_ascii_lowercase();

    let captures = LANGUAGE_SEGMENT_RE.captures(&lowered)?;
    let base = captures.get(1)?.as_str();

    KNOWN_LANGUAGES.contains(&base).then_some(lowered)
}

/// Classifies a link by its language prefix
pub fn classify_language(url: &Url) -> LanguageClass {
    match language_tag(url) {
        None => LanguageClass::Default,
        Some(tag) if base_code(&tag) == "en" => LanguageClass::English,
        Some(tag) => LanguageClass::Other(tag),
    }
}

/// Builds the key that makes translations of one page collide
///
/// The language segment is removed from the path (`/en/` becomes `/`) and the
/// query string is appended verbatim, so `/participant/?id=123` and
/// `/participant/?id=456` stay in separate groups.
pub fn grouping_key(url: &Url) -> String {
    let path = url.path();

    let stripped = match language_tag(url) {
        Some(_) => {
            let rest = path.trim_start_matches('/');
            match rest.find('/') {
                Some(idx) => rest[idx..].to_string(),
                None => "/".to_string(),
            }
        }
        None => path.to_string(),
    };

    match url.query() {
        Some(query) => format!("{}?{}", stripped, query),
        None => stripped,
    }
}

fn base_code(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[derive(Debug, Default)]
struct Group {
    english: Option<Url>,
    english_is_bare: bool,
    default: Option<Url>,
}

/// Selects one canonical link per language-variant group
///
/// Candidates are deduplicated and sorted first, so the first-encountered
/// tie-break depends only on the set of links, not on their order in the page.
/// A bare `en` link replaces an `en-*` variant seen earlier in the same group.
/// Links already present in `visited` are skipped before grouping and a chosen
/// link is never one already visited.
///
/// # Arguments
///
/// * `candidates` - Links discovered on one page
/// * `visited` - The run's visited registry
///
/// # Returns
///
/// The canonical links plus the number of candidates that were dropped
pub fn select_canonical(candidates: Vec<Url>, visited: &VisitedRegistry) -> Selection {
    let mut candidates = candidates;
    candidates.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    candidates.dedup();

    let total = candidates.len();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for url in candidates {
        if visited.contains(url.as_str()) {
            tracing::trace!("Variant filter: {} already visited", url);
            continue;
        }

        let key = grouping_key(&url);
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Group::default()
        });

        match classify_language(&url) {
            LanguageClass::English => {
                let is_bare = language_tag(&url).as_deref() == Some("en");
                if group.english.is_none() || (is_bare && !group.english_is_bare) {
                    group.english = Some(url);
                    group.english_is_bare = is_bare;
                }
            }
            LanguageClass::Default => {
                if group.default.is_none() {
                    group.default = Some(url);
                }
            }
            LanguageClass::Other(tag) => {
                tracing::trace!("Variant filter: skipping {} variant {}", tag, url);
            }
        }
    }

    let mut selected = Vec::new();
    for key in order {
        let Some(group) = groups.remove(&key) else {
            continue;
        };

        match group.english.or(group.default) {
            Some(url) if !visited.contains(url.as_str()) => {
                tracing::debug!("Group '{}': following {}", key, url);
                selected.push(url);
            }
            Some(url) => tracing::debug!("Group '{}': {} already visited", key, url),
            None => tracing::debug!("Group '{}': only other-language variants, skipped", key),
        }
    }

    Selection {
        dropped: total - selected.len(),
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn select(links: &[&str], visited: &VisitedRegistry) -> Vec<String> {
        select_canonical(links.iter().map(|s| url(s)).collect(), visited)
            .selected
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_language_tag() {
        assert_eq!(language_tag(&url("https://x.com/en/b")), Some("en".into()));
        assert_eq!(language_tag(&url("https://x.com/nl-be/b")), Some("nl-be".into()));
        assert_eq!(language_tag(&url("https://x.com/de_DE/")), Some("de_de".into()));
        assert_eq!(language_tag(&url("https://x.com/EN")), Some("en".into()));
        assert_eq!(language_tag(&url("https://x.com/es/b")), None);
        assert_eq!(language_tag(&url("https://x.com/english/b")), None);
        assert_eq!(language_tag(&url("https://x.com/")), None);
        assert_eq!(language_tag(&url("https://x.com/b/en/")), None);
    }

    #[test]
    fn test_classify_language() {
        assert_eq!(classify_language(&url("https://x.com/en-gb/b")), LanguageClass::English);
        assert_eq!(classify_language(&url("https://x.com/b")), LanguageClass::Default);
        assert_eq!(
            classify_language(&url("https://x.com/fr/b")),
            LanguageClass::Other("fr".into())
        );
    }

    #[test]
    fn test_grouping_key() {
        assert_eq!(grouping_key(&url("https://x.com/en/b")), "/b");
        assert_eq!(grouping_key(&url("https://x.com/nl/b")), "/b");
        assert_eq!(grouping_key(&url("https://x.com/b")), "/b");
        assert_eq!(grouping_key(&url("https://x.com/en/")), "/");
        assert_eq!(grouping_key(&url("https://x.com/en")), "/");
        assert_eq!(grouping_key(&url("https://x.com/fr/a/b/")), "/a/b/");
        assert_eq!(
            grouping_key(&url("https://x.com/en/participant/?id=123")),
            "/participant/?id=123"
        );
    }

    #[test]
    fn test_english_wins_over_default_and_others() {
        let visited = VisitedRegistry::new();
        let chosen = select(
            &["https://x.com/nl/b", "https://x.com/b", "https://x.com/en/b"],
            &visited,
        );
        assert_eq!(chosen, vec!["https://x.com/en/b"]);
    }

    #[test]
    fn test_default_when_no_english() {
        let visited = VisitedRegistry::new();
        let chosen = select(&["https://x.com/fr/b", "https://x.com/b"], &visited);
        assert_eq!(chosen, vec!["https://x.com/b"]);
    }

    #[test]
    fn test_only_other_languages_selects_nothing() {
        let visited = VisitedRegistry::new();
        let selection = select_canonical(
            vec![url("https://x.com/nl/b"), url("https://x.com/fr/b")],
            &visited,
        );
        assert!(selection.selected.is_empty());
        assert_eq!(selection.dropped, 2);
    }

    #[test]
    fn test_bare_en_replaces_regional_variant() {
        let visited = VisitedRegistry::new();
        let chosen = select(&["https://x.com/en-gb/b", "https://x.com/en/b"], &visited);
        assert_eq!(chosen, vec!["https://x.com/en/b"]);

        let chosen = select(&["https://x.com/en-us/b", "https://x.com/en-gb/b"], &visited);
        assert_eq!(chosen, vec!["https://x.com/en-gb/b"]);
    }

    #[test]
    fn test_query_strings_keep_groups_distinct() {
        let visited = VisitedRegistry::new();
        let chosen = select(
            &[
                "https://x.com/participant/?id=123",
                "https://x.com/participant/?id=456",
            ],
            &visited,
        );
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn test_never_selects_visited() {
        let visited = VisitedRegistry::new();
        visited.try_claim("https://x.com/en/b");
        let chosen = select(&["https://x.com/en/b", "https://x.com/nl/b"], &visited);
        assert!(chosen.is_empty());

        // The visited English link is skipped, so the default variant remains
        let chosen = select(&["https://x.com/en/b", "https://x.com/b"], &visited);
        assert_eq!(chosen, vec!["https://x.com/b"]);
    }

    #[test]
    fn test_duplicates_and_order() {
        let visited = VisitedRegistry::new();
        let selection = select_canonical(
            vec![
                url("https://x.com/z"),
                url("https://x.com/a"),
                url("https://x.com/a"),
            ],
            &visited,
        );
        let chosen: Vec<&str> = selection.selected.iter().map(|u| u.as_str()).collect();
        assert_eq!(chosen, vec!["https://x.com/a", "https://x.com/z"]);
        assert_eq!(selection.dropped, 0);
    }
}
