//! Fan-out/fan-in aggregation of event records
//!
//! An event page yields a parent record plus N external links. The parent is
//! opened with the number of child fetches actually dispatched; every child
//! outcome (success or failure) is recorded against it, and the outcome that
//! brings the pending count to zero finalizes the record and hands it to the
//! sink. Each parent lives in an arena keyed by its identifier, and the
//! decrement-and-test happens under one lock, so arrival order and concurrency
//! never cause a lost or duplicate emission.

mod record;

pub use record::{
    ContactInfo, EventFields, ExternalOutcome, ExternalPage, ExternalResult, ParentRecord,
};

use crate::output::RecordSink;
use crate::state::{CompletionRegistry, ParentPhase};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// What happened when a parent was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Waiting for this many child outcomes
    Dispatched { pending: usize },
    /// No children; the record was finalized immediately
    Finalized,
    /// The identifier is already open or finalized; nothing changed
    Duplicate,
}

/// What happened when a child outcome was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// More outcomes are expected
    Pending { remaining: usize },
    /// This was the last outcome and the record was finalized
    Finalized,
    /// No open parent with that identifier; the outcome was ignored
    Unknown,
}

/// A parent that never received all of its outcomes
#[derive(Debug, Clone)]
pub struct UnfinishedParent {
    pub record: ParentRecord,
    pub pending: usize,
}

#[derive(Debug)]
struct ParentEntry {
    record: ParentRecord,
    phase: ParentPhase,
}

/// Arena of open parent records
pub struct Aggregator {
    arena: Mutex<HashMap<String, ParentEntry>>,
    completed: Arc<CompletionRegistry>,
    sink: Arc<dyn RecordSink>,
}

impl Aggregator {
    /// Creates an aggregator emitting finalized records into `sink`
    pub fn new(completed: Arc<CompletionRegistry>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            arena: Mutex::new(HashMap::new()),
            completed,
            sink,
        }
    }

    /// Registers a parent that waits for `child_count` outcomes
    ///
    /// A parent without children is finalized at once. Opening an identifier
    /// that is already open or was finalized is reported as
    /// [`OpenOutcome::Duplicate`] and changes nothing.
    pub fn open(&self, record: ParentRecord, child_count: usize) -> OpenOutcome {
        let identifier = record.identifier.clone();

        let ready = {
            let mut arena = self.arena.lock();
            if arena.contains_key(&identifier) || self.completed.is_finalized(&identifier) {
                tracing::debug!("Parent '{}' opened twice, ignoring", identifier);
                return OpenOutcome::Duplicate;
            }

            match ParentPhase::opened(child_count) {
                ParentPhase::Finalizing => {
                    self.completed.mark_finalized(&identifier);
                    record
                }
                phase => {
                    arena.insert(identifier.clone(), ParentEntry { record, phase });
                    tracing::info!(
                        "Parent '{}' dispatched {} external fetches",
                        identifier,
                        child_count
                    );
                    return OpenOutcome::Dispatched {
                        pending: child_count,
                    };
                }
            }
        };

        tracing::info!("Parent '{}' has no external links", identifier);
        self.emit(ready);
        OpenOutcome::Finalized
    }

    /// Records one child outcome against its parent
    ///
    /// The result is appended and the pending count decremented in one locked
    /// step. When the count reaches zero the parent leaves the arena, is marked
    /// in the completion registry and is emitted after the lock is released.
    pub fn record(&self, identifier: &str, result: ExternalResult) -> RecordOutcome {
        let ready = {
            let mut arena = self.arena.lock();
            let Some(entry) = arena.get_mut(identifier) else {
                tracing::warn!(
                    "Outcome for unknown parent '{}' ({}) ignored",
                    identifier,
                    result.url
                );
                return RecordOutcome::Unknown;
            };

            let Some(next) = entry.phase.after_outcome() else {
                tracing::warn!("Parent '{}' does not accept outcomes", identifier);
                return RecordOutcome::Unknown;
            };

            entry.record.external_data.push(result);
            entry.phase = next;

            if next != ParentPhase::Finalizing {
                tracing::debug!("Parent '{}': {}", identifier, next);
                return RecordOutcome::Pending {
                    remaining: next.pending(),
                };
            }

            let Some(entry) = arena.remove(identifier) else {
                return RecordOutcome::Unknown;
            };
            if !self.completed.mark_finalized(identifier) {
                tracing::warn!("Parent '{}' was already finalized", identifier);
                return RecordOutcome::Unknown;
            }
            entry.record
        };

        tracing::info!(
            "Parent '{}' complete with {} external results ({} errors)",
            identifier,
            ready.external_data.len(),
            ready.error_count()
        );
        self.emit(ready);
        RecordOutcome::Finalized
    }

    /// Raises the pending count of an open parent by `additional`
    ///
    /// Must happen before the outcome that discovered the extra children is
    /// recorded. Returns false when no open parent has that identifier.
    pub fn extend(&self, identifier: &str, additional: usize) -> bool {
        let mut arena = self.arena.lock();
        let Some(entry) = arena.get_mut(identifier) else {
            tracing::warn!("Cannot extend unknown parent '{}'", identifier);
            return false;
        };
        let Some(next) = entry.phase.extended(additional) else {
            return false;
        };

        entry.phase = next;
        tracing::debug!("Parent '{}' extended: {}", identifier, next);
        true
    }

    fn emit(&self, record: ParentRecord) {
        let identifier = record.identifier.clone();
        if let Err(e) = self.sink.emit_parent(record) {
            tracing::error!("Failed to emit parent '{}': {}", identifier, e);
        }
    }

    /// Outstanding child count of an open parent
    pub fn pending(&self, identifier: &str) -> Option<usize> {
        self.arena
            .lock()
            .get(identifier)
            .map(|entry| entry.phase.pending())
    }

    /// Current phase of a parent, `None` if it was never opened
    pub fn phase(&self, identifier: &str) -> Option<ParentPhase> {
        if let Some(entry) = self.arena.lock().get(identifier) {
            return Some(entry.phase);
        }
        self.completed
            .is_finalized(identifier)
            .then_some(ParentPhase::Finalized)
    }

    /// Number of parents still waiting for outcomes
    pub fn in_flight(&self) -> usize {
        self.arena.lock().len()
    }

    /// Number of parents finalized so far
    pub fn finalized_count(&self) -> usize {
        self.completed.len()
    }

    /// Removes and returns every parent still waiting for outcomes
    ///
    /// Used at shutdown; the returned records are never emitted.
    pub fn drain_unfinished(&self) -> Vec<UnfinishedParent> {
        let mut unfinished: Vec<UnfinishedParent> = self
            .arena
            .lock()
            .drain()
            .map(|(_, entry)| UnfinishedParent {
                pending: entry.phase.pending(),
                record: entry.record,
            })
            .collect();
        unfinished.sort_by(|a, b| a.record.identifier.cmp(&b.record.identifier));
        unfinished
    }
}
