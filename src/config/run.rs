use crate::config::types::{Config, CrawlMode};
use crate::url::{extract_authority, normalize_url};
use crate::ConfigError;
use url::Url;

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub start_url: Option<String>,
    pub run_identifier: Option<String>,
    pub depth_limit: Option<u32>,
    pub mode: Option<CrawlMode>,
}

/// Fully resolved parameters of one crawl run
///
/// The primary authority is derived once from the start URL and never changes
/// for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub start_url: Url,
    pub primary_authority: String,
    pub run_identifier: String,
    pub depth_limit: u32,
    pub mode: CrawlMode,
}

impl RunParams {
    /// Resolves run parameters from the config and command-line overrides
    ///
    /// # Errors
    ///
    /// * `ConfigError::MissingStartUrl` - no start URL anywhere
    /// * `ConfigError::InvalidUrl` - the start URL is not an absolute http(s) URL
    pub fn resolve(config: &Config, overrides: &RunOverrides) -> Result<Self, ConfigError> {
        let raw_start = overrides
            .start_url
            .as_deref()
            .or(config.run.start_url.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingStartUrl)?;

        let start_url = normalize_url(raw_start)
            .map_err(|e| ConfigError::InvalidUrl(format!("start URL '{}': {}", raw_start, e)))?;

        let primary_authority = extract_authority(&start_url).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("start URL '{}' has no host", raw_start))
        })?;

        let run_identifier = overrides
            .run_identifier
            .clone()
            .unwrap_or_else(|| config.run.run_identifier.clone())
            .trim()
            .to_lowercase();

        if run_identifier.is_empty() {
            return Err(ConfigError::Validation(
                "run identifier cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            start_url,
            primary_authority,
            run_identifier,
            depth_limit: overrides.depth_limit.unwrap_or(config.crawler.depth_limit),
            mode: overrides.mode.unwrap_or(config.run.mode),
        })
    }

    /// Returns true when the depth limit is disabled
    pub fn is_unlimited(&self) -> bool {
        self.depth_limit == 0
    }
}
