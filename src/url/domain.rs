use url::Url;

/// Extracts the network authority (`host[:port]`) from a URL
///
/// The host is lowercased. An explicit non-default port is kept, so two servers
/// on the same host but different ports are different authorities. Returns
/// `None` if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use xpo_harvest::url::extract_authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Extracts the lowercase host from a URL, without any port
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_authority() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_authority(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://www.kortrijkxpo.com/kalender/").unwrap();
        assert_eq!(
            extract_authority(&url),
            Some("www.kortrijkxpo.com".to_string())
        );
    }

    #[test]
    fn test_explicit_port_kept() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_authority(&url), Some("example.com:8080".to_string()));
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_default_port_dropped() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(extract_authority(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_mixed_case() {
        let url = Url::parse("https://Example.COM/Path?q=1#frag").unwrap();
        assert_eq!(extract_authority(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(extract_authority(&url), None);
    }
}
