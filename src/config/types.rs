use serde::Deserialize;

/// Main configuration structure for Xpo-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub events: EventsConfig,
    /// Exhibitor list extraction, enabled by the presence of the section
    #[serde(default)]
    pub exhibitors: Option<ExhibitorSelectors>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the start URL (0 means unlimited)
    #[serde(rename = "depth-limit")]
    pub depth_limit: u32,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Pause between two dispatches (milliseconds)
    #[serde(rename = "download-delay")]
    pub download_delay: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth_limit: 0,
            max_concurrent_fetches: 8,
            request_timeout: 30,
            download_delay: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the JSON record files
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Indent the JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Collapse whitespace runs inside every string value
    #[serde(rename = "collapse-whitespace", default)]
    pub collapse_whitespace: bool,

    /// Drop non-ASCII characters from string values
    #[serde(rename = "ascii-only", default)]
    pub ascii_only: bool,

    /// Optional path of the markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Which spider behavior a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Crawl one site and emit a flat record per page
    #[default]
    Site,
    /// Crawl an event calendar and enrich each event from its external links
    Events,
}

impl CrawlMode {
    /// Lowercase name used in file names and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Events => "events",
        }
    }
}

/// Invocation parameters that may also be given on the command line
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Absolute URL the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: Option<String>,

    /// Free-form label namespacing the output
    #[serde(rename = "run-identifier")]
    pub run_identifier: String,

    /// Spider behavior
    pub mode: CrawlMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            run_identifier: "event".to_string(),
            mode: CrawlMode::Site,
        }
    }
}

/// Event-calendar crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Path prefix of primary-site pages worth following
    #[serde(rename = "follow-prefix")]
    pub follow_prefix: String,

    /// Regex matched against the path of event detail pages
    #[serde(rename = "event-pattern")]
    pub event_pattern: String,

    /// Domains whose links are never fetched as external children
    pub blacklist: Vec<String>,

    /// CSS selectors for event detail fields
    pub selectors: EventSelectors,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            follow_prefix: "/kalender/".to_string(),
            event_pattern: r"^/kalender/event/pxk/\d+/[^/]+/$".to_string(),
            blacklist: default_blacklist(),
            selectors: EventSelectors::default(),
        }
    }
}

/// Social networks, app stores and browser support sites
fn default_blacklist() -> Vec<String> {
    [
        ".eu",
        "facebook.com",
        "instagram.com",
        "twitter.com",
        "linkedin.com",
        "youtube.com",
        "apps.apple.com",
        "play.google.com",
        "mozillazine.org",
        "support.mozilla.org",
        "support.microsoft.com",
        "support.apple.com",
        "support.google.com",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

/// CSS selectors used to read event detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventSelectors {
    pub title: String,
    pub date: String,
    pub location: String,
    pub image: String,
    pub description: String,
}

impl Default for EventSelectors {
    fn default() -> Self {
        Self {
            title: "h1".to_string(),
            date: ".event-date".to_string(),
            location: ".event-location".to_string(),
            image: ".event-image img".to_string(),
            description: ".event-description".to_string(),
        }
    }
}

/// CSS selectors of an exhibitor list page
///
/// Only pages whose URL contains `url-marker` are searched. Each element
/// matching `item` yields one exhibitor; the field selectors are applied
/// inside it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExhibitorSelectors {
    #[serde(rename = "url-marker")]
    pub url_marker: String,
    pub item: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub booth: String,
}

impl Default for ExhibitorSelectors {
    fn default() -> Self {
        Self {
            url_marker: "list-of-exhibitors".to_string(),
            item: "div.exposantenLijst_exposantjs".to_string(),
            name: "div.exposantenLijst_exposantNaam".to_string(),
            city: "div.exposantenLijst_exposantStad".to_string(),
            country: "div.exposantenLijst_exposantLand".to_string(),
            booth: "div.exposantenLijst_exposantPlaats".to_string(),
        }
    }
}
