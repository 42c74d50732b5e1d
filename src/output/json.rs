//! JSON array output and an in-memory sink

use crate::aggregator::ParentRecord;
use crate::config::{CrawlMode, OutputConfig};
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::processor::{collapse_whitespace, PageRecord};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Cleanup and formatting options of the JSON writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indent with two spaces
    pub pretty: bool,
    /// Collapse whitespace runs in every string value and trim it
    pub collapse_whitespace: bool,
    /// Drop non-ASCII characters from every string value
    pub ascii_only: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            collapse_whitespace: false,
            ascii_only: false,
        }
    }
}

impl From<&OutputConfig> for JsonOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            pretty: config.pretty,
            collapse_whitespace: config.collapse_whitespace,
            ascii_only: config.ascii_only,
        }
    }
}

/// Returns the output file of a run
///
/// `<dir>/<run>_site_data.json` in site mode, `<dir>/<run>_events.json` in
/// events mode.
pub fn output_file_path(output_dir: &Path, run_identifier: &str, mode: CrawlMode) -> PathBuf {
    let file_name = match mode {
        CrawlMode::Site => format!("{}_site_data.json", run_identifier),
        CrawlMode::Events => format!("{}_events.json", run_identifier),
    };
    output_dir.join(file_name)
}

/// Sink that buffers records and writes them as one JSON array on finish
pub struct JsonFileSink {
    path: PathBuf,
    options: JsonOptions,
    records: Mutex<Vec<Value>>,
}

impl JsonFileSink {
    /// Creates a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>, options: JsonOptions) -> Self {
        Self {
            path: path.into(),
            options,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Creates a sink writing to the standard file of a run
    pub fn for_run(
        output_dir: &Path,
        run_identifier: &str,
        mode: CrawlMode,
        options: JsonOptions,
    ) -> Self {
        Self::new(output_file_path(output_dir, run_identifier, mode), options)
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing was emitted yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, value: Value) {
        self.records.lock().push(value);
    }
}

impl RecordSink for JsonFileSink {
    fn emit_page(&self, record: PageRecord) -> OutputResult<()> {
        self.push(serde_json::to_value(record)?);
        Ok(())
    }

    fn emit_parent(&self, record: ParentRecord) -> OutputResult<()> {
        self.push(serde_json::to_value(record)?);
        Ok(())
    }

    fn finish(&self) -> OutputResult<usize> {
        let mut array: Vec<Value> = self.records.lock().clone();
        for value in array.iter_mut() {
            clean_value(value, &self.options);
        }

        let write_error =
            |e: std::io::Error| OutputError::Write(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let json = if self.options.pretty {
            serde_json::to_string_pretty(&array)?
        } else {
            serde_json::to_string(&array)?
        };
        fs::write(&self.path, json).map_err(write_error)?;

        tracing::info!("Wrote {} records to {}", array.len(), self.path.display());
        Ok(array.len())
    }
}

/// Applies the string cleanup options to every string inside `value`
pub fn clean_value(value: &mut Value, options: &JsonOptions) {
    match value {
        Value::String(s) => {
            if options.ascii_only {
                s.retain(|c| c.is_ascii());
            }
            if options.collapse_whitespace {
                *s = collapse_whitespace(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| clean_value(v, options)),
        Value::Object(map) => map.values_mut().for_each(|v| clean_value(v, options)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Sink keeping every record in memory
///
/// Feeds the markdown summary of a run and the tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Mutex<Vec<PageRecord>>,
    parents: Mutex<Vec<ParentRecord>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Page records in emission order
    pub fn pages(&self) -> Vec<PageRecord> {
        self.pages.lock().clone()
    }

    /// Parent records in emission order
    pub fn parents(&self) -> Vec<ParentRecord> {
        self.parents.lock().clone()
    }
}

impl RecordSink for MemorySink {
    fn emit_page(&self, record: PageRecord) -> OutputResult<()> {
        self.pages.lock().push(record);
        Ok(())
    }

    fn emit_parent(&self, record: ParentRecord) -> OutputResult<()> {
        self.parents.lock().push(record);
        Ok(())
    }

    fn finish(&self) -> OutputResult<usize> {
        Ok(self.pages.lock().len() + self.parents.lock().len())
    }
}
