//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for ergonomic error derivation. A [`BackendError`]
//! raised while opening a document is fatal; one raised while decoding a
//! single page only costs that page.

use thiserror::Error;

/// Error type for PDF parsing backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is encrypted.
    #[error("PDF is encrypted")]
    Encrypted,

    /// A page index past the end of the document.
    #[error("page index {index} is out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),
}
