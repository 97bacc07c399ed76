//! Top-level PDF document type.

use std::path::Path;

use pdf2csv_core::{Page, PageSource};
use pdf2csv_parse::{BackendError, LopdfBackend, LopdfDocument, PdfBackend};

/// A PDF document opened for table extraction.
///
/// Pages are decoded lazily, one [`Page`] snapshot per call to
/// [`PageSource::load_page`].
///
/// # Example
///
/// ```ignore
/// let pdf = Pdf::open_file("report.pdf")?;
/// let first = pdf.load_page(0)?;
/// ```
#[derive(Debug)]
pub struct Pdf {
    doc: LopdfDocument,
}

impl Pdf {
    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Encrypted`] for encrypted documents and
    /// [`BackendError::Parse`] if the bytes are not a readable PDF.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let doc = LopdfBackend::open(bytes)?;
        tracing::debug!(pages = LopdfBackend::page_count(&doc), "opened PDF");
        Ok(Self { doc })
    }

    /// Read and open a PDF file.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Pdf::open`].
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes)
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }
}

impl PageSource for Pdf {
    type Error = BackendError;

    fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    fn load_page(&self, index: usize) -> Result<Page, Self::Error> {
        LopdfBackend::load_page(&self.doc, index)
    }
}
