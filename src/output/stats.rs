//! Crawl statistics
//!
//! This module provides the counters collected during a run and their
//! console rendering.

use crate::config::CrawlMode;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Run label
    pub run_identifier: String,

    /// Spider behavior used
    pub mode: CrawlMode,

    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Wall-clock end of the run
    pub finished_at: Option<DateTime<Utc>>,

    /// Page fetches that returned HTML
    pub pages_fetched: u64,

    /// Page records handed to the sink
    pub pages_emitted: u64,

    /// Page fetches that failed
    pub fetch_failures: u64,

    /// Tasks refused by depth, scheme, domain or PDF rules
    pub policy_drops: u64,

    /// Tasks refused because they were already visited or claimed
    pub duplicate_drops: u64,

    /// Links dropped by the language variant selector
    pub variant_drops: u64,

    /// Event records opened
    pub parents_opened: u64,

    /// Event records emitted
    pub parents_finalized: u64,

    /// External fetches that succeeded
    pub child_successes: u64,

    /// External fetches that failed
    pub child_errors: u64,

    /// Event records still waiting when the run ended
    pub unfinished_parents: u64,

    /// Records written by the sink
    pub records_written: u64,

    /// Total run time
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Creates zeroed statistics for a run starting now
    pub fn new(run_identifier: impl Into<String>, mode: CrawlMode) -> Self {
        Self {
            run_identifier: run_identifier.into(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            pages_fetched: 0,
            pages_emitted: 0,
            fetch_failures: 0,
            policy_drops: 0,
            duplicate_drops: 0,
            variant_drops: 0,
            parents_opened: 0,
            parents_finalized: 0,
            child_successes: 0,
            child_errors: 0,
            unfinished_parents: 0,
            records_written: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Total external fetches that resolved
    pub fn child_outcomes(&self) -> u64 {
        self.child_successes + self.child_errors
    }

    /// Share of page fetches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.fetch_failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Identifier: {}", stats.run_identifier);
    println!("  Mode: {}", stats.mode.as_str());
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Pages:");
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Failed: {}", stats.fetch_failures);
    println!("  Emitted: {}", stats.pages_emitted);
    println!();

    println!("Links:");
    println!("  Dropped by policy: {}", stats.policy_drops);
    println!("  Already visited: {}", stats.duplicate_drops);
    println!("  Language variants skipped: {}", stats.variant_drops);
    println!();

    if stats.mode == CrawlMode::Events {
        println!("Events:");
        println!("  Opened: {}", stats.parents_opened);
        println!("  Finalized: {}", stats.parents_finalized);
        println!(
            "  External fetches: {} ({} ok, {} failed)",
            stats.child_outcomes(),
            stats.child_successes,
            stats.child_errors
        );
        if stats.unfinished_parents > 0 {
            println!("  Unfinished: {}", stats.unfinished_parents);
        }
        println!();
    }

    println!("Records written: {}", stats.records_written);
    println!(
        "Success Rate: {:.1}% ({} / {} page fetches)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.pages_fetched + stats.fetch_failures
    );
}
