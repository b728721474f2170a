// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Append-only delimited report writers
//!
//! A [`StructuredReporter`] writes rows under a fixed header. Every operation
//! takes `&self` and holds the reporter's lock for its whole duration, so
//! rows written from concurrent detection callbacks never interleave.
//!
//! [`CsvReporter`] writes semicolon-delimited text to a file (or any
//! writer); [`MemoryReporter`] keeps rows in memory for tests.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Delimiter between the cells of a row
pub const FIELD_DELIMITER: char = ';';

/// Platform-native record separator
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Platform-native record separator
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Errors raised by report writers
#[derive(Debug, Error)]
pub enum ReportError {
    /// The underlying medium rejected a write, flush or close
    #[error("Report I/O error: {0}")]
    Io(#[from] io::Error),

    /// The reporter was already closed
    #[error("Reporter is closed")]
    Closed,

    /// A row does not have one value per header column
    #[error("Row has {actual} fields but the header has {expected}")]
    FieldCount {
        /// Number of header columns
        expected: usize,
        /// Number of values in the rejected row
        actual: usize,
    },
}

/// A row-oriented report with a fixed header
pub trait StructuredReporter: Send + Sync {
    /// Column names, in row order
    fn header(&self) -> &[String];

    /// Append one row; values must follow header order
    ///
    /// # Errors
    ///
    /// `ReportError::Closed` after [`close`](Self::close), `FieldCount` on
    /// arity mismatch, `Io` when the medium rejects the row.
    fn write(&self, fields: &[String]) -> Result<(), ReportError>;

    /// Push buffered rows to the medium. Calling it again is harmless.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` when the medium rejects the flush.
    fn flush(&self) -> Result<(), ReportError>;

    /// Flush and release the medium. Later writes fail with `Closed`;
    /// closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` when the final flush fails.
    fn close(&self) -> Result<(), ReportError>;
}

fn check_arity(header: &[String], fields: &[String]) -> Result<(), ReportError> {
    if header.len() != fields.len() {
        return Err(ReportError::FieldCount {
            expected: header.len(),
            actual: fields.len(),
        });
    }
    Ok(())
}

/// Quote a cell when it would otherwise break the row structure
///
/// Cells containing the delimiter, a double quote or a line break are
/// wrapped in double quotes, with embedded quotes doubled.
#[must_use]
pub fn quote_field(field: &str) -> Cow<'_, str> {
    let needs_quotes = field
        .chars()
        .any(|c| c == FIELD_DELIMITER || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render one row, including the trailing record separator
#[must_use]
pub fn format_row(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_DELIMITER);
        }
        line.push_str(&quote_field(field));
    }
    line.push_str(LINE_SEPARATOR);
    line
}

type Sink = BufWriter<Box<dyn Write + Send>>;

/// Semicolon-delimited report backed by a buffered writer
pub struct CsvReporter {
    destination: String,
    header: Vec<String>,
    out: Mutex<Option<Sink>>,
}

impl CsvReporter {
    /// Create (or truncate) the report file at `path` and write the header
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the file cannot be created.
    pub fn create(path: impl AsRef<Path>, header: Vec<String>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Self::from_writer(path.display().to_string(), file, header)
    }

    /// Write a report to an arbitrary writer
    ///
    /// `destination` only names the report in logs.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the header cannot be written.
    pub fn from_writer<W>(
        destination: impl Into<String>,
        writer: W,
        header: Vec<String>,
    ) -> Result<Self, ReportError>
    where
        W: Write + Send + 'static,
    {
        let mut out: Sink = BufWriter::new(Box::new(writer));
        out.write_all(format_row(&header).as_bytes())?;

        let destination = destination.into();
        debug!(destination = %destination, columns = header.len(), "Opened report");
        Ok(Self {
            destination,
            header,
            out: Mutex::new(Some(out)),
        })
    }

    /// Name of the report destination
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl StructuredReporter for CsvReporter {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn write(&self, fields: &[String]) -> Result<(), ReportError> {
        check_arity(&self.header, fields)?;
        let line = format_row(fields);

        let mut guard = self.out.lock();
        let out = guard.as_mut().ok_or(ReportError::Closed)?;
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), ReportError> {
        if let Some(out) = self.out.lock().as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), ReportError> {
        let Some(mut out) = self.out.lock().take() else {
            return Ok(());
        };
        out.flush()?;
        debug!(destination = %self.destination, "Closed report");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Vec<String>>,
    closed: bool,
    flushes: usize,
}

/// In-memory reporter that records rows instead of writing them
#[derive(Debug)]
pub struct MemoryReporter {
    header: Vec<String>,
    fail_after: Option<usize>,
    fail_flush: bool,
    state: Mutex<MemoryState>,
}

impl MemoryReporter {
    /// Create an empty in-memory report
    #[must_use]
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            fail_after: None,
            fail_flush: false,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Reject every write once `rows` rows have been accepted, like a full disk
    #[must_use]
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    /// Reject every flush, like a medium that went away; closing still works
    #[must_use]
    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    /// Rows written so far
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.state.lock().rows.clone()
    }

    /// Number of rows written so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    /// Whether no rows were written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](StructuredReporter::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of explicit flushes
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.state.lock().flushes
    }
}

impl StructuredReporter for MemoryReporter {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn write(&self, fields: &[String]) -> Result<(), ReportError> {
        check_arity(&self.header, fields)?;

        let mut state = self.state.lock();
        if state.closed {
            return Err(ReportError::Closed);
        }
        if self.fail_after.is_some_and(|limit| state.rows.len() >= limit) {
            return Err(ReportError::Io(io::Error::other("no space left on device")));
        }
        state.rows.push(fields.to_vec());
        Ok(())
    }

    fn flush(&self) -> Result<(), ReportError> {
        if self.fail_flush {
            return Err(ReportError::Io(io::Error::other("device unavailable")));
        }
        self.state.lock().flushes += 1;
        Ok(())
    }

    fn close(&self) -> Result<(), ReportError> {
        self.state.lock().closed = true;
        Ok(())
    }
}
