//! URL handling module for Xpo-Harvest
//!
//! This module provides URL normalization, authority extraction, blacklist
//! matching and link-origin classification.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{extract_authority, extract_host};
pub use matcher::{matches_any, matches_domain};
pub use normalize::{is_pdf, normalize_url};

/// Where a discovered link points relative to the run's primary authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOrigin {
    /// Same authority as the run's start URL
    Internal,
    /// A different authority that is not blacklisted
    External,
    /// A different authority matching the blacklist
    Blacklisted,
}

impl LinkOrigin {
    /// Returns true if the link stays on the primary site
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Returns true if the link may be fetched as an external child
    pub fn is_followable_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

/// Classifies a URL against the primary authority and the blacklist
///
/// The blacklist is only consulted for external links; the primary site can
/// never be blacklisted.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use xpo_harvest::url::{classify_link, LinkOrigin};
///
/// let blacklist = vec!["facebook.com".to_string()];
/// let url = Url::parse("https://www.facebook.com/expo").unwrap();
/// assert_eq!(classify_link(&url, "www.kortrijkxpo.com", &blacklist), LinkOrigin::Blacklisted);
/// ```
pub fn classify_link(url: &Url, primary_authority: &str, blacklist: &[String]) -> LinkOrigin {
    if extract_authority(url).as_deref() == Some(primary_authority) {
        return LinkOrigin::Internal;
    }

    match extract_host(url) {
        Some(host) if matches_any(blacklist, &host) => LinkOrigin::Blacklisted,
        _ => LinkOrigin::External,
    }
}
