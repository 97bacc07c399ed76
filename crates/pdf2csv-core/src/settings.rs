//! Validated extraction settings and page selection.

use std::ops::Range;

use crate::error::ConfigError;

/// Default border tolerance in page units.
pub const DEFAULT_BORDER_WIDTH: f64 = 1.0;

/// Default vertical merge ratio for text runs sharing a cell.
pub const DEFAULT_LINE_MERGE_RATIO: f64 = 0.5;

/// Numeric tolerances used by the pipeline.
///
/// Only constructible through [`Settings::new`] (or [`Default`]), so every
/// value seen by the engine has already been validated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Settings {
    border_width: f64,
    line_merge_ratio: f64,
}

impl Settings {
    /// Create settings with the given border tolerance and the default
    /// line merge ratio.
    pub fn new(border_width: f64) -> Result<Self, ConfigError> {
        if !border_width.is_finite() || border_width <= 0.0 {
            return Err(ConfigError::BorderWidth(border_width));
        }
        Ok(Self {
            border_width,
            line_merge_ratio: DEFAULT_LINE_MERGE_RATIO,
        })
    }

    /// Replace the line merge ratio.
    pub fn with_line_merge_ratio(mut self, ratio: f64) -> Result<Self, ConfigError> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(ConfigError::LineMergeRatio(ratio));
        }
        self.line_merge_ratio = ratio;
        Ok(self)
    }

    /// Distance below which two drawn edges count as one border line.
    pub fn border_width(&self) -> f64 {
        self.border_width
    }

    /// Fraction of a text line's height two run tops may differ by and still
    /// share that line.
    pub fn line_merge_ratio(&self) -> f64 {
        self.line_merge_ratio
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            border_width: DEFAULT_BORDER_WIDTH,
            line_merge_ratio: DEFAULT_LINE_MERGE_RATIO,
        }
    }
}

/// Inclusive 1-based page selection; `None` ends are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRange {
    first: Option<usize>,
    last: Option<usize>,
}

impl PageRange {
    /// Every page of the document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(first: Option<usize>, last: Option<usize>) -> Result<Self, ConfigError> {
        if first == Some(0) || last == Some(0) {
            return Err(ConfigError::ZeroPage);
        }
        if let (Some(first), Some(last)) = (first, last) {
            if first > last {
                return Err(ConfigError::PageRange { first, last });
            }
        }
        Ok(Self { first, last })
    }

    /// A range holding exactly one page.
    pub fn single(page: usize) -> Result<Self, ConfigError> {
        Self::new(Some(page), Some(page))
    }

    pub fn first(&self) -> Option<usize> {
        self.first
    }

    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// 0-based indices to load from a document of `page_count` pages.
    ///
    /// Pages past the end of the document are simply absent.
    pub fn indices(&self, page_count: usize) -> Range<usize> {
        let start = self.first.map_or(0, |f| f - 1);
        let end = self.last.map_or(page_count, |l| l.min(page_count));
        start.min(end)..end
    }
}
