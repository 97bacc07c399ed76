//! pdf2csv-core: backend-independent table reconstruction.
//!
//! This crate holds the page data model ([`Page`], [`Primitive`], [`TextRun`])
//! and every stage of the border-based table pipeline:
//!
//! 1. [`extract_segments`] turns painted primitives into orthogonal
//!    [`LineSegment`]s.
//! 2. [`build_tables`] clusters segments into [`GridLine`]s and assembles
//!    [`Table`] lattices.
//! 3. [`resolve_cells`] and [`assign_text`] merge lattice cells where borders
//!    are missing and fill them with text.
//! 4. [`CsvWriter`] streams the resulting rows, and [`SvgRenderer`] draws the
//!    intermediate geometry for debugging.
//!
//! It knows nothing about PDF syntax; pages come from a [`PageSource`].

pub mod cells;
pub mod csv;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod lines;
pub mod page;
pub mod settings;
pub mod svg;

pub use cells::{Cell, ResolvedTable, assign_text, resolve_cells};
pub use csv::{CsvWriter, csv_escape};
pub use error::{ConfigError, ExtractWarning, WarningCode};
pub use geometry::{BBox, Orientation, Point};
pub use grid::{Coverage, GridLine, Span, Table, build_tables, cluster_lines};
pub use lines::{LineSegment, extract_segments};
pub use page::{MissingPage, Page, PageSource, PaintOp, Primitive, TextRun};
pub use settings::{DEFAULT_BORDER_WIDTH, DEFAULT_LINE_MERGE_RATIO, PageRange, Settings};
pub use svg::{SvgPathTemplate, SvgRenderer};
