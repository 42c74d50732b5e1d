//! Emission sink trait and output errors
//!
//! This module defines the trait interface records are emitted through and the
//! error type shared by every output writer.

use crate::aggregator::ParentRecord;
use crate::processor::PageRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination of finished records
///
/// Records arrive in completion order from concurrently running fetch tasks,
/// so implementations must be thread-safe. Emission never blocks on the
/// network.
pub trait RecordSink: Send + Sync {
    /// Accepts one site-mode page record
    ///
    /// # Arguments
    ///
    /// * `record` - The processed page
    fn emit_page(&self, record: PageRecord) -> OutputResult<()>;

    /// Accepts one finalized event record
    ///
    /// # Arguments
    ///
    /// * `record` - The parent with all of its external results
    fn emit_parent(&self, record: ParentRecord) -> OutputResult<()>;

    /// Flushes buffered records
    ///
    /// # Returns
    ///
    /// The number of records written
    fn finish(&self) -> OutputResult<usize>;
}
