//! Configuration module for Xpo-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving them together with command-line overrides into the parameters
//! of one crawl run.
//!
//! # Example
//!
//! ```no_run
//! use xpo_harvest::config::{load_config, RunOverrides, RunParams};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! let params = RunParams::resolve(&config, &RunOverrides::default()).unwrap();
//! println!("Crawling {} as '{}'", params.start_url, params.run_identifier);
//! ```

mod parser;
mod run;
mod types;
mod validation;

// Re-export types
pub use run::{RunOverrides, RunParams};
pub use types::{
    Config, CrawlMode, CrawlerConfig, EventSelectors, EventsConfig, ExhibitorSelectors, OutputConfig,
    RunConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
