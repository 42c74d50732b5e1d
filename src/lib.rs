//! Xpo-Harvest: an event-site crawler
//!
//! This crate crawls a constrained set of event websites and collects flat page
//! records, or event records enriched with data fetched from the external sites
//! they link to. The crawl core is made of a run-scoped visited registry, a
//! language-variant link selector, a policy-enforcing frontier and a fan-out/fan-in
//! aggregator that emits every event exactly once after all of its external
//! fetches have resolved.

pub mod aggregator;
pub mod config;
pub mod crawler;
pub mod output;
pub mod processor;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Xpo-Harvest operations
///
/// Only configuration-level failures abort a run. Per-page and per-child
/// failures are recorded as data and never surface through this type.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("A start URL is required (set run.start-url or pass --start-url)")]
    MissingStartUrl,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Xpo-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use aggregator::{Aggregator, ExternalResult, ParentRecord};
pub use config::{Config, CrawlMode, RunParams};
pub use processor::{PageRecord, SourceType};
pub use state::{CompletionRegistry, ParentPhase, VisitedRegistry};
pub use url::{extract_authority, normalize_url};
