//! Crawl frontier with admission policy
//!
//! This module handles:
//! - Priority queue management for tasks waiting to be fetched
//! - Depth, scheme, domain and PDF admission rules
//! - Rejecting tasks whose claim key was already dispatched

use crate::state::VisitedRegistry;
use crate::url::{classify_link, extract_authority, is_pdf, LinkOrigin};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// What a task is fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A page of the primary site, processed and followed
    Page,
    /// An external page whose result belongs to a parent record
    Child,
    /// A booking page found on a child page, owned by the same parent
    DeepDive,
}

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL to fetch
    pub url: Url,

    /// Identifier of the owning parent record (child tasks only)
    pub parent: Option<String>,

    /// Link distance from the start URL
    pub depth: u32,

    /// Page or child fetch
    pub kind: TaskKind,
}

impl CrawlTask {
    /// Creates a page task
    pub fn page(url: Url, depth: u32) -> Self {
        Self {
            url,
            parent: None,
            depth,
            kind: TaskKind::Page,
        }
    }

    /// Creates a child task owned by `parent`
    pub fn child(url: Url, parent: impl Into<String>, depth: u32) -> Self {
        Self {
            url,
            parent: Some(parent.into()),
            depth,
            kind: TaskKind::Child,
        }
    }

    /// Creates a deep-dive task owned by `parent`
    pub fn deep_dive(url: Url, parent: impl Into<String>, depth: u32) -> Self {
        Self {
            url,
            parent: Some(parent.into()),
            depth,
            kind: TaskKind::DeepDive,
        }
    }

    /// Key this task is deduplicated on in the visited registry
    ///
    /// Page tasks use the URL itself. Child and deep-dive tasks share a key
    /// space scoped to their parent, so two events linking the same external
    /// site each get their own outcome while one event fetches a URL once.
    pub fn claim_key(&self) -> String {
        match &self.parent {
            Some(parent) if self.is_child() => format!("child:{}|{}", parent, self.url),
            _ => self.url.to_string(),
        }
    }

    /// Returns true for tasks whose outcome belongs to a parent record
    pub fn is_child(&self) -> bool {
        matches!(self.kind, TaskKind::Child | TaskKind::DeepDive)
    }
}

/// Why a task was refused by the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Deeper than the run's depth limit
    TooDeep,
    /// Not http or https
    Scheme,
    /// Page task outside the primary authority
    OffSite,
    /// Child task pointing back at the primary authority
    OnSite,
    /// Child task on a blacklisted domain
    Blacklisted,
    /// PDF document
    Pdf,
    /// Claim key already dispatched
    Visited,
}

impl Rejection {
    /// Returns true for rejections caused by the admission policy
    /// (as opposed to deduplication)
    pub fn is_policy(&self) -> bool {
        !matches!(self, Self::Visited)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::TooDeep => "beyond depth limit",
            Self::Scheme => "unsupported scheme",
            Self::OffSite => "outside primary authority",
            Self::OnSite => "child on primary authority",
            Self::Blacklisted => "blacklisted domain",
            Self::Pdf => "pdf document",
            Self::Visited => "already visited",
        };
        f.write_str(reason)
    }
}

/// Admission rules of one run
#[derive(Debug, Clone)]
pub struct FrontierPolicy {
    /// Authority (`host[:port]`) of the start URL
    pub primary_authority: String,

    /// Maximum task depth, 0 for unlimited
    pub depth_limit: u32,

    /// Domain patterns never fetched as children
    pub blacklist: Vec<String>,
}

impl FrontierPolicy {
    /// Checks a task against the policy, ignoring the visited registry
    pub fn check(&self, task: &CrawlTask) -> Result<(), Rejection> {
        if self.depth_limit != 0 && task.depth > self.depth_limit {
            return Err(Rejection::TooDeep);
        }

        if task.url.scheme() != "http" && task.url.scheme() != "https" {
            return Err(Rejection::Scheme);
        }

        if is_pdf(&task.url) {
            return Err(Rejection::Pdf);
        }

        match task.kind {
            TaskKind::Page => {
                if extract_authority(&task.url).as_deref() != Some(self.primary_authority.as_str())
                {
                    return Err(Rejection::OffSite);
                }
            }
            TaskKind::Child | TaskKind::DeepDive => {
                match classify_link(&task.url, &self.primary_authority, &self.blacklist) {
                    LinkOrigin::Internal => return Err(Rejection::OnSite),
                    LinkOrigin::Blacklisted => return Err(Rejection::Blacklisted),
                    LinkOrigin::External => {}
                }
            }
        }

        Ok(())
    }
}

/// A task waiting in the queue with its arrival sequence number
#[derive(Debug, Clone)]
struct QueuedTask {
    task: CrawlTask,
    seq: u64,
}

// BinaryHeap pops the greatest element: children before pages, then shallower
// depth, then earlier arrival.
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .is_child()
            .cmp(&other.task.is_child())
            .then_with(|| other.task.depth.cmp(&self.task.depth))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

/// Queue of pending crawl tasks
///
/// The frontier rejects tasks that break the admission policy and tasks whose
/// claim key is already in the visited registry. The registry is only read
/// here; claiming happens at dispatch time, because the same URL may be queued
/// from several pages before its first fetch starts.
pub struct Frontier {
    policy: FrontierPolicy,
    visited: Arc<VisitedRegistry>,
    queue: BinaryHeap<QueuedTask>,
    next_seq: u64,
    policy_drops: usize,
    duplicate_drops: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `policy` - Admission rules of the run
    /// * `visited` - The run's visited registry
    pub fn new(policy: FrontierPolicy, visited: Arc<VisitedRegistry>) -> Self {
        Self {
            policy,
            visited,
            queue: BinaryHeap::new(),
            next_seq: 0,
            policy_drops: 0,
            duplicate_drops: 0,
        }
    }

    /// The admission rules in force
    pub fn policy(&self) -> &FrontierPolicy {
        &self.policy
    }

    /// Checks whether a task would be accepted, without queueing it
    pub fn check(&self, task: &CrawlTask) -> Result<(), Rejection> {
        self.policy.check(task)?;
        if self.visited.contains(&task.claim_key()) {
            return Err(Rejection::Visited);
        }
        Ok(())
    }

    /// Returns true if the task would be accepted
    pub fn admits(&self, task: &CrawlTask) -> bool {
        self.check(task).is_ok()
    }

    /// Queues one task, or counts and returns the reason it was refused
    pub fn try_enqueue(&mut self, task: CrawlTask) -> Result<(), Rejection> {
        if let Err(rejection) = self.check(&task) {
            tracing::trace!("Dropped {}: {}", task.url, rejection);
            if rejection.is_policy() {
                self.policy_drops += 1;
            } else {
                self.duplicate_drops += 1;
            }
            return Err(rejection);
        }

        tracing::trace!("Queued {:?} {} at depth {}", task.kind, task.url, task.depth);
        self.queue.push(QueuedTask {
            task,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Queues every admissible task and returns how many were accepted
    ///
    /// Rejected tasks are dropped silently and counted.
    pub fn enqueue(&mut self, tasks: impl IntoIterator<Item = CrawlTask>) -> usize {
        let mut accepted = 0;
        for task in tasks {
            if self.try_enqueue(task).is_ok() {
                accepted += 1;
            }
        }
        accepted
    }

    /// Pops the highest-priority task
    pub fn next(&mut self) -> Option<CrawlTask> {
        self.queue.pop().map(|queued| queued.task)
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tasks refused by the admission policy so far
    pub fn policy_drops(&self) -> usize {
        self.policy_drops
    }

    /// Tasks refused because their claim key was already dispatched
    pub fn duplicate_drops(&self) -> usize {
        self.duplicate_drops
    }
}
