//! Output module for emitted records and run reports
//!
//! This module handles:
//! - Writing page and event records as JSON arrays
//! - Generating markdown summaries of a run
//! - Recording crawl statistics

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::{clean_value, output_file_path, JsonFileSink, JsonOptions, MemorySink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::aggregator::ParentRecord;
use crate::config::CrawlMode;
use crate::processor::PageRecord;
use std::sync::Arc;

/// Sink forwarding every record to several sinks in order
///
/// The first error stops forwarding of that record and is returned.
pub struct TeeSink {
    sinks: Vec<Arc<dyn RecordSink>>,
}

impl TeeSink {
    /// Creates a tee over `sinks`
    pub fn new(sinks: Vec<Arc<dyn RecordSink>>) -> Self {
        Self { sinks }
    }
}

impl RecordSink for TeeSink {
    fn emit_page(&self, record: PageRecord) -> OutputResult<()> {
        for sink in &self.sinks {
            sink.emit_page(record.clone())?;
        }
        Ok(())
    }

    fn emit_parent(&self, record: ParentRecord) -> OutputResult<()> {
        for sink in &self.sinks {
            sink.emit_parent(record.clone())?;
        }
        Ok(())
    }

    /// Finishes every sink and returns the count reported by the first one
    fn finish(&self) -> OutputResult<usize> {
        let mut written = None;
        for sink in &self.sinks {
            let count = sink.finish()?;
            written.get_or_insert(count);
        }
        Ok(written.unwrap_or(0))
    }
}

/// Builds the sink of one run around its JSON file
///
/// Event records are also kept in memory when an events run writes a summary;
/// page records are never copied. Returns the sink and the in-memory copy.
pub fn run_sink(
    file_sink: Arc<JsonFileSink>,
    mode: CrawlMode,
    with_summary: bool,
) -> (Arc<dyn RecordSink>, Option<Arc<MemorySink>>) {
    if mode != CrawlMode::Events || !with_summary {
        return (file_sink as Arc<dyn RecordSink>, None);
    }

    let memory = Arc::new(MemorySink::new());
    let tee = TeeSink::new(vec![
        file_sink as Arc<dyn RecordSink>,
        memory.clone() as Arc<dyn RecordSink>,
    ]);
    (Arc::new(tee), Some(memory))
}
