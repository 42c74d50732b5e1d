/// Checks if a host belongs to a blacklisted domain pattern
///
/// Patterns are matched as suffixes on label boundaries:
/// 1. `"facebook.com"` matches `"facebook.com"` and `"www.facebook.com"`
/// 2. `"*.example.com"` is accepted as an alias of `"example.com"`
/// 3. `".eu"` (leading dot) matches any host under that suffix, e.g. `"europa.eu"`
///
/// Both arguments are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use xpo_harvest::url::matches_domain;
///
/// assert!(matches_domain("facebook.com", "www.facebook.com"));
/// assert!(matches_domain(".eu", "ec.europa.eu"));
/// assert!(!matches_domain("facebook.com", "notfacebook.com"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    if pattern.is_empty() || host.is_empty() {
        return false;
    }

    if let Some(suffix) = pattern.strip_prefix('.') {
        return host == suffix || host.ends_with(pattern);
    }

    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    host == base || host.ends_with(&format!(".{}", base))
}

/// Returns true if the host matches any pattern in the list
pub fn matches_any(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|p| matches_domain(p, host))
}
