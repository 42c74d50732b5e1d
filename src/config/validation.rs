use crate::config::types::{
    Config, CrawlerConfig, EventsConfig, ExhibitorSelectors, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_start_url(config.run.start_url.as_deref())?;
    validate_events_config(&config.events)?;
    if let Some(exhibitors) = &config.exhibitors {
        validate_exhibitor_selectors(exhibitors)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // depth_limit of 0 means unlimited, so every u32 is valid

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some(p) if p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the start URL when the config file provides one
///
/// A missing start URL is not an error here; the command line may still supply
/// it, and run resolution fails fast if neither does.
fn validate_start_url(start_url: Option<&str>) -> Result<(), ConfigError> {
    let Some(raw) = start_url else {
        return Ok(());
    };

    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start_url '{}' must use http or https",
            raw
        )));
    }

    Ok(())
}

/// Validates the event-calendar settings
fn validate_events_config(config: &EventsConfig) -> Result<(), ConfigError> {
    if !config.follow_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "follow_prefix must start with '/', got '{}'",
            config.follow_prefix
        )));
    }

    Regex::new(&config.event_pattern).map_err(|e| {
        ConfigError::Validation(format!(
            "event_pattern '{}' is not a valid regex: {}",
            config.event_pattern, e
        ))
    })?;

    for pattern in &config.blacklist {
        validate_domain_pattern(pattern)?;
    }

    let selectors = &config.selectors;
    for (name, css) in [
        ("title", &selectors.title),
        ("date", &selectors.date),
        ("location", &selectors.location),
        ("image", &selectors.image),
        ("description", &selectors.description),
    ] {
        Selector::parse(css).map_err(|_| {
            ConfigError::Validation(format!("selector '{}' ('{}') does not parse", name, css))
        })?;
    }

    Ok(())
}

/// Validates the exhibitor list selectors
fn validate_exhibitor_selectors(config: &ExhibitorSelectors) -> Result<(), ConfigError> {
    if config.url_marker.is_empty() {
        return Err(ConfigError::Validation(
            "exhibitors.url-marker cannot be empty".to_string(),
        ));
    }

    for (name, css) in [
        ("item", &config.item),
        ("name", &config.name),
        ("city", &config.city),
        ("country", &config.country),
        ("booth", &config.booth),
    ] {
        Selector::parse(css).map_err(|_| {
            ConfigError::Validation(format!(
                "exhibitor selector '{}' ('{}') does not parse",
                name, css
            ))
        })?;
    }

    Ok(())
}

/// Validates a blacklist pattern (`example.com`, `*.example.com` or `.eu`)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(suffix) = pattern.strip_prefix('.') {
        // Bare suffixes such as ".eu" need no inner dot
        return validate_domain_chars(suffix);
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_chars(domain)?;

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Validates the characters of a domain string (without prefix)
fn validate_domain_chars(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be lowercase and contain only letters, digits, '.' or '-'",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
