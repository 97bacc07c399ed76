//! Streaming CSV output.
//!
//! [`CsvWriter`] writes one table at a time and keeps just enough state to
//! separate consecutive tables with a single blank line, so callers can hand
//! it each page's tables as soon as they are resolved.

use std::borrow::Cow;
use std::io::{self, Write};

/// Escape a CSV field.
///
/// If the text contains commas, double quotes, carriage returns or newlines,
/// wraps it in double quotes and escapes any internal double quotes by
/// doubling them.
pub fn csv_escape(text: &str) -> Cow<'_, str> {
    if text.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Writes tables as CSV to any [`Write`] destination.
#[derive(Debug)]
pub struct CsvWriter<W: Write> {
    inner: W,
    tables: usize,
    rows: usize,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            tables: 0,
            rows: 0,
        }
    }

    /// Write one table. Tables without rows are skipped entirely.
    pub fn write_table(&mut self, rows: &[Vec<String>]) -> io::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        if self.tables > 0 {
            self.inner.write_all(b"\n")?;
        }
        for row in rows {
            self.write_row(row)?;
        }
        self.tables += 1;
        Ok(())
    }

    fn write_row(&mut self, row: &[String]) -> io::Result<()> {
        // A lone empty field would otherwise print as a blank separator line.
        if let [only] = row {
            if only.is_empty() {
                self.rows += 1;
                return self.inner.write_all(b"\"\"\n");
            }
        }
        let line = row
            .iter()
            .map(|field| csv_escape(field))
            .collect::<Vec<_>>()
            .join(",");
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Number of tables written so far.
    pub fn tables_written(&self) -> usize {
        self.tables
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
