//! pdf2csv-parse: PDF page decoding for the pdf2csv table engine.
//!
//! Turns one page of a PDF into an immutable [`pdf2csv_core::Page`]: the
//! painted vector primitives and the shown text runs, both in top-left page
//! space. Document access goes through the [`PdfBackend`] trait; the default
//! implementation, [`LopdfBackend`], is built on lopdf.

pub mod backend;
pub mod cmap;
pub mod error;
pub mod fonts;
pub mod interpreter;
pub mod interpreter_state;
pub mod lopdf_backend;
pub mod page_geometry;
pub mod text_state;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use page_geometry::PageGeometry;
pub use pdf2csv_core;
