//! State module for tracking crawl progress
//!
//! This module provides the run-scoped shared state of a crawl.
//!
//! # Components
//!
//! - `VisitedRegistry`: claim keys already dispatched in this run
//! - `CompletionRegistry`: parent identifiers already finalized
//! - `ParentPhase`: lifecycle of a parent record in the aggregator

mod parent_phase;
mod registry;

// Re-export main types
pub use parent_phase::ParentPhase;
pub use registry::{CompletionRegistry, VisitedRegistry};
