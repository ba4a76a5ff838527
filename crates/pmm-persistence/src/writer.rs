//! Buffered record writers for run output.
//!
//! One writer per output file. Records are buffered and written on
//! [`RecordWriter::flush`] (or automatically when the buffer fills):
//! - JSON Lines: each line is a complete JSON object
//! - CSV: header row from the record's field names, in field order
//!
//! Output files are truncated on open: every run produces a fresh series.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pmm_mm::{FillEvent, MetricsSample};
use pmm_telemetry::RunSummary;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, PersistenceResult};

/// File format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    JsonLines,
    Csv,
}

impl OutputFormat {
    /// `.csv` → CSV, `.jsonl` / `.ndjson` → JSON Lines.
    pub fn from_path(path: &Path) -> PersistenceResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("jsonl") | Some("ndjson") => Ok(Self::JsonLines),
            _ => Err(PersistenceError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

enum Sink {
    JsonLines(BufWriter<File>),
    Csv(csv::Writer<File>),
}

/// Buffered writer for serializable records.
pub struct RecordWriter<T: Serialize> {
    path: PathBuf,
    sink: Sink,
    /// Buffer of pending records.
    buffer: Vec<T>,
    /// Maximum buffer size before flush.
    max_buffer_size: usize,
    records_written: usize,
}

/// Per-tick metrics series.
pub type MetricsWriter = RecordWriter<MetricsSample>;

/// Executed fills.
pub type FillLogWriter = RecordWriter<FillEvent>;

/// Sweep results, one row per grid point. JSON Lines only: the regime
/// counts are a nested record.
pub type SummaryWriter = RecordWriter<RunSummary>;

impl<T: Serialize> RecordWriter<T> {
    /// Open `path` for writing, creating parent directories as needed.
    ///
    /// The format follows the file extension.
    pub fn create(path: impl AsRef<Path>, max_buffer_size: usize) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let format = OutputFormat::from_path(&path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), ?format, "Opening output writer");

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let sink = match format {
            OutputFormat::JsonLines => Sink::JsonLines(BufWriter::new(file)),
            OutputFormat::Csv => Sink::Csv(csv::Writer::from_writer(file)),
        };

        let max_buffer_size = max_buffer_size.max(1);
        Ok(Self {
            path,
            sink,
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size,
            records_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written to the file so far (excludes the pending buffer).
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Add a record to the buffer.
    pub fn add_record(&mut self, record: T) -> PersistenceResult<()> {
        self.buffer.push(record);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    /// Add every record from an iterator.
    pub fn extend(&mut self, records: impl IntoIterator<Item = T>) -> PersistenceResult<()> {
        for record in records {
            self.add_record(record)?;
        }
        Ok(())
    }

    /// Write the buffer to the file.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let record_count = self.buffer.len();

        match &mut self.sink {
            Sink::JsonLines(writer) => {
                for record in &self.buffer {
                    let json = serde_json::to_string(record)?;
                    writeln!(writer, "{}", json)?;
                }
                writer.flush()?;
            }
            Sink::Csv(writer) => {
                for record in &self.buffer {
                    writer.serialize(record)?;
                }
                writer.flush()?;
            }
        }

        self.records_written += record_count;
        self.buffer.clear();

        debug!(
            path = %self.path.display(),
            records = record_count,
            "Flushed records"
        );

        Ok(())
    }

    /// Flush pending records and close the file.
    ///
    /// Returns the total number of records written.
    pub fn close(mut self) -> PersistenceResult<usize> {
        self.flush()?;
        info!(
            path = %self.path.display(),
            records = self.records_written,
            "Closed output writer"
        );
        Ok(self.records_written)
    }
}

impl<T: Serialize> Drop for RecordWriter<T> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, path = %self.path.display(), "Failed to flush buffer on drop");
        }
    }
}
