use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the form used as a visited-registry claim key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host and lowercase it
/// 4. Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters, keeping the rest in their original order
/// 7. Remove empty query string (trailing ?)
///
/// The path, trailing slash included, is left as the site wrote it. Query
/// parameters are never sorted because the remaining query string takes part in
/// language-variant grouping verbatim.
///
/// # Examples
///
/// ```
/// use xpo_harvest::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/page/?id=3&utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/page/?id=3");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // The url crate already lowercases registered domains, but not every host kind
    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let lowered = host.to_lowercase();
            if lowered != host {
                url.set_host(Some(&lowered))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
            }
        }
        _ => return Err(UrlError::MissingDomain),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let kept: Vec<&str> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or_default();
                !is_tracking_param(key)
            })
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            let rebuilt = kept.join("&");
            url.set_query(Some(&rebuilt));
        }
    }

    Ok(url)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

/// Returns true when the URL path points at a PDF document
pub fn is_pdf(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_keeps_trailing_slash() {
        let result = normalize_url("https://example.com/participant/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/participant/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result = normalize_url("https://example.com/page?utm_source=twitter").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_order_preserved() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?b=2&a=1");
    }

    #[test]
    fn test_mixed_query_params() {
        let result =
            normalize_url("https://example.com/page?keep=yes&utm_medium=email&id=7&fbclid=123")
                .unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?keep=yes&id=7");
    }

    #[test]
    fn test_dot_segments_resolved() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_domain_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_mailto_rejected() {
        assert!(normalize_url("mailto:info@example.com").is_err());
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(&Url::parse("https://example.com/files/Plan.PDF").unwrap()));
        assert!(!is_pdf(&Url::parse("https://example.com/pdf/overview").unwrap()));
        assert!(!is_pdf(&Url::parse("https://example.com/?file=a.pdf").unwrap()));
    }
}
