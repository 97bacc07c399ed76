//! Per-page snapshot handed to the engine by a PDF access layer.
//!
//! A [`Page`] holds everything the border-detection pipeline needs: the page
//! box, the painted vector primitives and the positioned text runs. All
//! coordinates use the top-left origin of [`BBox`].

use crate::geometry::{BBox, Point};

/// How a path or rectangle was painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

impl PaintOp {
    /// Whether the outline is stroked (and so has a visible line width).
    pub fn strokes(self) -> bool {
        matches!(self, PaintOp::Stroke | PaintOp::FillAndStroke)
    }
}

/// A painted vector drawing primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    /// An axis-aligned rectangle.
    Rect {
        bbox: BBox,
        paint: PaintOp,
        line_width: f64,
    },
    /// A polyline; curves have already been flattened to their chords.
    Path {
        points: Vec<Point>,
        closed: bool,
        paint: PaintOp,
        line_width: f64,
    },
}

/// A contiguous piece of decoded text with its bounding box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    pub text: String,
    pub bbox: BBox,
    /// Baseline y coordinate.
    pub baseline: f64,
    pub font_size: f64,
    pub font_name: String,
}

impl TextRun {
    /// Convenience constructor used mostly by tests and synthetic sources.
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            baseline: bbox.bottom,
            font_size: bbox.height(),
            font_name: String::new(),
        }
    }
}

/// Immutable snapshot of one page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub bbox: BBox,
    pub primitives: Vec<Primitive>,
    pub runs: Vec<TextRun>,
}

impl Page {
    pub fn new(number: usize, bbox: BBox) -> Self {
        Self {
            number,
            bbox,
            primitives: Vec::new(),
            runs: Vec::new(),
        }
    }
}

/// Something that can hand out decoded pages by 0-based index.
///
/// Implemented by the PDF document type of the facade crate and by in-memory
/// sources in tests.
pub trait PageSource {
    /// Error raised when a single page cannot be decoded.
    type Error: std::fmt::Display;

    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Decode the page at `index` (0-based).
    fn load_page(&self, index: usize) -> Result<Page, Self::Error>;
}

/// Raised by in-memory sources for an index past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page index {0} is out of range")]
pub struct MissingPage(pub usize);

impl PageSource for Vec<Page> {
    type Error = MissingPage;

    fn page_count(&self) -> usize {
        self.len()
    }

    fn load_page(&self, index: usize) -> Result<Page, Self::Error> {
        self.get(index).cloned().ok_or(MissingPage(index))
    }
}
