//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind a swappable `Fetcher` trait
//! - HTML link extraction
//! - Language variant selection among discovered links
//! - The policy-enforcing frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod selector;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, fetch_url, is_html_content_type, FetchResult, Fetcher, HttpFetcher,
};
pub use frontier::{CrawlTask, Frontier, FrontierPolicy, Rejection, TaskKind};
pub use parser::{extract_links, extract_links_from_html};
pub use selector::{
    classify_language, grouping_key, language_tag, select_canonical, LanguageClass, Selection,
};
