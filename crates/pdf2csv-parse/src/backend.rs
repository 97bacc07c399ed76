//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the PDF access layer the
//! table engine depends on: open a document, count its pages and decode one
//! page into an immutable [`Page`] snapshot.

use pdf2csv_core::Page;

/// Trait abstracting PDF parsing operations.
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page_count = MyBackend::page_count(&doc);
/// let page = MyBackend::load_page(&doc, 0)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// Backend-specific error type.
    type Error: std::error::Error;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a readable PDF document.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Decode the page at a 0-based index into its vector primitives and
    /// text runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the page content
    /// cannot be decoded.
    fn load_page(doc: &Self::Document, index: usize) -> Result<Page, Self::Error>;
}
