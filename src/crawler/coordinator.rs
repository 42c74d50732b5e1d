//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the core together:
//! - Owning the frontier and dispatching tasks up to the concurrency bound
//! - Claiming URLs in the visited registry at dispatch time
//! - Fetching and processing pages on spawned tasks
//! - Opening event records and feeding child outcomes to the aggregator
//! - Flushing the sink and reporting statistics

use crate::aggregator::{Aggregator, ExternalResult, OpenOutcome, ParentRecord};
use crate::config::{Config, CrawlMode, RunParams};
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::crawler::frontier::{CrawlTask, Frontier, FrontierPolicy, TaskKind};
use crate::crawler::parser::extract_links;
use crate::crawler::selector::select_canonical;
use crate::output::{CrawlStatistics, RecordSink};
use crate::processor::{
    find_booking_links, process_document, process_external, EventExtractor, ExhibitorExtractor,
    ProcessContext, SourceType,
};
use crate::state::{CompletionRegistry, VisitedRegistry};
use crate::url::normalize_url;
use crate::{ConfigError, HarvestError};
use chrono::Utc;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Events-mode rules compiled once per run
struct EventRules {
    follow_prefix: String,
    pattern: Regex,
    extractor: EventExtractor,
}

impl EventRules {
    fn is_event_page(&self, url: &Url) -> bool {
        self.pattern.is_match(url.path())
    }

    fn is_followed(&self, url: &Url) -> bool {
        url.path().starts_with(&self.follow_prefix) || self.is_event_page(url)
    }
}

/// Everything a spawned fetch task needs
struct TaskContext {
    params: RunParams,
    policy: FrontierPolicy,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
    visited: Arc<VisitedRegistry>,
    aggregator: Arc<Aggregator>,
    events: EventRules,
    exhibitors: Option<ExhibitorExtractor>,
}

/// Counter deltas and discovered work of one finished task
#[derive(Debug, Default)]
struct TaskReport {
    discovered: Vec<CrawlTask>,
    pages_fetched: u64,
    fetch_failures: u64,
    pages_emitted: u64,
    policy_drops: u64,
    duplicate_drops: u64,
    variant_drops: u64,
    parents_opened: u64,
    child_successes: u64,
    child_errors: u64,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<TaskContext>,
    frontier: Frontier,
    max_concurrent: usize,
    download_delay: Duration,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `params` - Resolved run parameters
    /// * `fetcher` - Source of page bodies
    /// * `sink` - Destination of emitted records
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The event pattern or a selector does not compile
    pub fn new(
        config: &Config,
        params: RunParams,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, HarvestError> {
        let pattern = Regex::new(&config.events.event_pattern).map_err(|e| {
            ConfigError::Validation(format!(
                "invalid event pattern '{}': {}",
                config.events.event_pattern, e
            ))
        })?;
        let events = EventRules {
            follow_prefix: config.events.follow_prefix.clone(),
            pattern,
            extractor: EventExtractor::new(&config.events.selectors)?,
        };
        let exhibitors = config
            .exhibitors
            .as_ref()
            .map(ExhibitorExtractor::new)
            .transpose()?;

        let policy = FrontierPolicy {
            primary_authority: params.primary_authority.clone(),
            depth_limit: params.depth_limit,
            blacklist: config.events.blacklist.clone(),
        };

        let visited = Arc::new(VisitedRegistry::new());
        let completed = Arc::new(CompletionRegistry::new());
        let aggregator = Arc::new(Aggregator::new(completed, Arc::clone(&sink)));
        let frontier = Frontier::new(policy.clone(), Arc::clone(&visited));

        Ok(Self {
            ctx: Arc::new(TaskContext {
                params,
                policy,
                fetcher,
                sink,
                visited,
                aggregator,
                events,
                exhibitors,
            }),
            frontier,
            max_concurrent: config.crawler.max_concurrent_fetches.max(1) as usize,
            download_delay: Duration::from_millis(config.crawler.download_delay),
        })
    }

    /// Runs the crawl until the frontier is exhausted and every task returned
    ///
    /// Fetch failures never abort the run; only a failing sink flush does.
    pub async fn run(mut self) -> Result<CrawlStatistics, HarvestError> {
        let params = &self.ctx.params;
        tracing::info!(
            "Starting {} run '{}' at {} (depth limit {})",
            params.mode.as_str(),
            params.run_identifier,
            params.start_url,
            if params.is_unlimited() {
                "none".to_string()
            } else {
                params.depth_limit.to_string()
            }
        );

        let mut stats = CrawlStatistics::new(&params.run_identifier, params.mode);
        let start_time = Instant::now();

        self.frontier
            .enqueue([CrawlTask::page(params.start_url.clone(), 0)]);

        let mut tasks: JoinSet<TaskReport> = JoinSet::new();
        let mut completed_tasks: u64 = 0;

        loop {
            while tasks.len() < self.max_concurrent {
                let Some(task) = self.frontier.next() else {
                    break;
                };

                if !self.ctx.visited.try_claim(&task.claim_key()) {
                    self.refuse_duplicate(task, &mut stats);
                    continue;
                }

                if !self.download_delay.is_zero() {
                    tokio::time::sleep(self.download_delay).await;
                }

                let ctx = Arc::clone(&self.ctx);
                tasks.spawn(execute(ctx, task));
            }

            let Some(joined) = tasks.join_next().await else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            match joined {
                Ok(report) => self.absorb(report, &mut stats),
                Err(e) => tracing::error!("Fetch task aborted: {}", e),
            }

            completed_tasks += 1;
            if completed_tasks % 10 == 0 {
                let rate = completed_tasks as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} fetches done, {} queued, {} in flight, {:.2} fetches/sec",
                    completed_tasks,
                    self.frontier.len(),
                    tasks.len(),
                    rate
                );
            }
        }

        self.finish(stats, start_time)
    }

    /// Counts a task whose claim key was taken between enqueue and dispatch
    fn refuse_duplicate(&self, task: CrawlTask, stats: &mut CrawlStatistics) {
        stats.duplicate_drops += 1;
        if let Some(parent) = task.parent.as_deref().filter(|_| task.is_child()) {
            tracing::debug!("Child {} of '{}' already dispatched", task.url, parent);
            stats.child_errors += 1;
            self.ctx.aggregator.record(
                parent,
                ExternalResult::error(task.url.as_str(), "Duplicate external fetch"),
            );
        }
    }

    /// Merges a task report and queues what it discovered
    fn absorb(&mut self, report: TaskReport, stats: &mut CrawlStatistics) {
        stats.pages_fetched += report.pages_fetched;
        stats.fetch_failures += report.fetch_failures;
        stats.pages_emitted += report.pages_emitted;
        stats.policy_drops += report.policy_drops;
        stats.duplicate_drops += report.duplicate_drops;
        stats.variant_drops += report.variant_drops;
        stats.parents_opened += report.parents_opened;
        stats.child_successes += report.child_successes;
        stats.child_errors += report.child_errors;

        for task in report.discovered {
            let (url, parent) = (task.url.clone(), task.parent.clone());
            if let Err(rejection) = self.frontier.try_enqueue(task) {
                // An opened parent counts on every child it was given.
                if let Some(parent) = parent {
                    stats.child_errors += 1;
                    self.ctx.aggregator.record(
                        &parent,
                        ExternalResult::error(url.as_str(), format!("Not fetched: {}", rejection)),
                    );
                }
            }
        }
    }

    fn finish(
        self,
        mut stats: CrawlStatistics,
        start_time: Instant,
    ) -> Result<CrawlStatistics, HarvestError> {
        let aggregator = &self.ctx.aggregator;

        let unfinished = aggregator.drain_unfinished();
        for parent in &unfinished {
            tracing::warn!(
                "Event '{}' never finalized, {} external results missing",
                parent.record.identifier,
                parent.pending
            );
        }

        stats.policy_drops += self.frontier.policy_drops() as u64;
        stats.duplicate_drops += self.frontier.duplicate_drops() as u64;
        stats.parents_finalized = aggregator.finalized_count() as u64;
        stats.unfinished_parents = unfinished.len() as u64;
        stats.records_written = self.ctx.sink.finish()? as u64;
        stats.elapsed = start_time.elapsed();
        stats.finished_at = Some(Utc::now());

        tracing::info!(
            "Run '{}' finished: {} pages fetched, {} records written in {:.1}s",
            stats.run_identifier,
            stats.pages_fetched,
            stats.records_written,
            stats.elapsed.as_secs_f64()
        );

        Ok(stats)
    }
}

/// Fetches one task and processes the response
async fn execute(ctx: Arc<TaskContext>, task: CrawlTask) -> TaskReport {
    tracing::debug!("Fetching {} (depth {})", task.url, task.depth);
    let result = ctx.fetcher.fetch(&task.url).await;

    match task.kind {
        TaskKind::Page => ctx.handle_page(&task, result),
        TaskKind::Child | TaskKind::DeepDive => ctx.handle_child(&task, result),
    }
}

impl TaskContext {
    fn handle_page(&self, task: &CrawlTask, result: FetchResult) -> TaskReport {
        let mut report = TaskReport::default();

        let (final_url, body) = match result {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            failure => {
                tracing::warn!(
                    "Failed to fetch {}: {}",
                    task.url,
                    failure.error_message().unwrap_or_default()
                );
                report.fetch_failures = 1;
                return report;
            }
        };
        report.pages_fetched = 1;

        let page_url = normalize_url(final_url.as_str()).unwrap_or(final_url);
        if let Err(rejection) = self.policy.check(&CrawlTask::page(page_url.clone(), task.depth)) {
            tracing::debug!("{} redirected to {}: {}", task.url, page_url, rejection);
            report.policy_drops = 1;
            return report;
        }
        if page_url != task.url && !self.visited.try_claim(page_url.as_str()) {
            tracing::debug!("{} redirected to already visited {}", task.url, page_url);
            report.duplicate_drops = 1;
            return report;
        }

        let document = Html::parse_document(&body);
        let links: Vec<Url> = extract_links(&document, &page_url)
            .into_iter()
            .filter_map(|link| normalize_url(link.as_str()).ok())
            .collect();

        match self.params.mode {
            CrawlMode::Site => self.site_page(task, &page_url, &document, links, &mut report),
            CrawlMode::Events => self.event_page(task, &page_url, &document, links, &mut report),
        }

        report
    }

    /// Emits a page record and follows the canonical variant of each internal link
    fn site_page(
        &self,
        task: &CrawlTask,
        page_url: &Url,
        document: &Html,
        links: Vec<Url>,
        report: &mut TaskReport,
    ) {
        let process_ctx = ProcessContext {
            run_identifier: &self.params.run_identifier,
            primary_authority: &self.params.primary_authority,
            exhibitors: self.exhibitors.as_ref(),
        };
        let record = process_document(page_url, document, &process_ctx);
        match self.sink.emit_page(record) {
            Ok(()) => report.pages_emitted = 1,
            Err(e) => tracing::error!("Failed to emit record for {}: {}", page_url, e),
        }

        let depth = task.depth + 1;
        let total = links.len();
        let candidates: Vec<Url> = links
            .into_iter()
            .filter(|link| self.policy.check(&CrawlTask::page(link.clone(), depth)).is_ok())
            .collect();
        report.policy_drops += (total - candidates.len()) as u64;

        let selection = select_canonical(candidates, &self.visited);
        report.variant_drops += selection.dropped as u64;
        report.discovered.extend(
            selection
                .selected
                .into_iter()
                .map(|url| CrawlTask::page(url, depth)),
        );
    }

    /// Opens an event record for event pages and follows listing links
    fn event_page(
        &self,
        task: &CrawlTask,
        page_url: &Url,
        document: &Html,
        links: Vec<Url>,
        report: &mut TaskReport,
    ) {
        let depth = task.depth + 1;

        if self.events.is_event_page(page_url) {
            let record = ParentRecord::new(self.events.extractor.extract(page_url, document));
            let identifier = record.identifier.clone();

            let mut seen = HashSet::new();
            let children: Vec<CrawlTask> = links
                .iter()
                .filter(|link| seen.insert(link.to_string()))
                .map(|link| CrawlTask::child(link.clone(), identifier.as_str(), depth))
                .filter(|child| self.admits(child))
                .collect();

            match self.aggregator.open(record, children.len()) {
                OpenOutcome::Duplicate => {
                    tracing::debug!("Event '{}' already collected", identifier);
                }
                outcome => {
                    tracing::info!(
                        "Event '{}' opened with {} external links",
                        identifier,
                        children.len()
                    );
                    if outcome != OpenOutcome::Finalized {
                        report.discovered.extend(children);
                    }
                    report.parents_opened = 1;
                }
            }
        }

        let mut seen = HashSet::new();
        for link in links {
            if !seen.insert(link.to_string()) || !self.events.is_followed(&link) {
                continue;
            }
            let next = CrawlTask::page(link, depth);
            if self.policy.check(&next).is_ok() {
                report.discovered.push(next);
            }
        }
    }

    fn handle_child(&self, task: &CrawlTask, result: FetchResult) -> TaskReport {
        let mut report = TaskReport::default();
        let Some(parent) = task.parent.as_deref() else {
            return report;
        };

        let outcome = match result {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let document = Html::parse_document(&body);
                let deep_dive = task.kind == TaskKind::DeepDive;
                if !deep_dive {
                    self.dive(task, parent, &final_url, &document, &mut report);
                }
                report.child_successes = 1;
                ExternalResult::success(
                    task.url.as_str(),
                    process_external(&final_url, &document, SourceType::external(deep_dive)),
                )
            }
            failure => {
                let message = failure
                    .error_message()
                    .unwrap_or_else(|| "Unknown fetch error".to_string());
                tracing::error!(
                    "External fetch {} for '{}' failed: {}",
                    task.url,
                    parent,
                    message
                );
                report.child_errors = 1;
                ExternalResult::error(task.url.as_str(), message)
            }
        };

        self.aggregator.record(parent, outcome);
        report
    }

    /// Queues the booking pages of a child page under the same parent
    ///
    /// The parent's pending count grows before the child's own outcome is
    /// recorded, so it cannot finalize in between.
    fn dive(
        &self,
        task: &CrawlTask,
        parent: &str,
        page_url: &Url,
        document: &Html,
        report: &mut TaskReport,
    ) {
        let mut seen = HashSet::new();
        let subpages: Vec<CrawlTask> = find_booking_links(document, page_url)
            .into_iter()
            .filter_map(|link| normalize_url(link.as_str()).ok())
            .filter(|link| seen.insert(link.to_string()))
            .map(|link| CrawlTask::deep_dive(link, parent, task.depth + 1))
            .filter(|subpage| self.admits(subpage))
            .collect();

        if subpages.is_empty() || !self.aggregator.extend(parent, subpages.len()) {
            return;
        }
        tracing::debug!(
            "{} booking pages on {} added to '{}'",
            subpages.len(),
            page_url,
            parent
        );
        report.discovered.extend(subpages);
    }

    /// Policy and visited check for a child before its parent is opened
    fn admits(&self, task: &CrawlTask) -> bool {
        self.policy.check(task).is_ok() && !self.visited.contains(&task.claim_key())
    }
}

/// Runs a complete crawl over HTTP
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `params` - Resolved run parameters
/// * `sink` - Destination of emitted records
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(HarvestError)` - Setup or the final flush failed
pub async fn run_crawl(
    config: &Config,
    params: RunParams,
    sink: Arc<dyn RecordSink>,
) -> Result<CrawlStatistics, HarvestError> {
    let timeout = Duration::from_secs(config.crawler.request_timeout);
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent, timeout)?);
    Coordinator::new(config, params, fetcher, sink)?.run().await
}
