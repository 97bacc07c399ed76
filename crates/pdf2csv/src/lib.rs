//! pdf2csv: extract bordered tables from PDF documents as CSV.
//!
//! This is the public API facade. It re-exports the engine from
//! pdf2csv-core and uses pdf2csv-parse to decode pages.
//!
//! # Architecture
//!
//! - **pdf2csv-core**: data model and the table pipeline (segments, grid,
//!   cells, CSV, debug SVG)
//! - **pdf2csv-parse**: PDF page decoding via lopdf
//! - **pdf2csv** (this crate): document access, page ranges, ordered
//!   streaming, debug output files and atomic output
//!
//! # Example
//!
//! ```ignore
//! use pdf2csv::{ExtractOptions, Extractor, Pdf};
//!
//! let pdf = Pdf::open_file("statement.pdf")?;
//! let summary = Extractor::new(ExtractOptions::default())?
//!     .run(&pdf, std::io::stdout().lock())?;
//! eprintln!("{} tables, {} rows", summary.tables, summary.rows);
//! ```

mod error;
mod extract;
mod output;
mod pdf;

pub use error::Error;
pub use extract::{ExtractOptions, ExtractSummary, Extractor, PageExtraction, extract_page};
pub use output::{AtomicOutput, write_atomic};
pub use pdf::Pdf;

pub use pdf2csv_core::{
    BBox, Cell, ConfigError, CsvWriter, DEFAULT_BORDER_WIDTH, DEFAULT_LINE_MERGE_RATIO,
    ExtractWarning, LineSegment, Page, PageRange, PageSource, ResolvedTable, Settings,
    SvgPathTemplate, TextRun, WarningCode,
};
pub use pdf2csv_parse::BackendError;

pub use pdf2csv_core;
pub use pdf2csv_parse;
