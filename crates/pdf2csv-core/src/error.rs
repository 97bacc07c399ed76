//! Error and warning types for pdf2csv.
//!
//! Provides [`ConfigError`] for invalid configuration, which is fatal and
//! raised before any page is touched, and [`ExtractWarning`] for non-fatal
//! issues that allow best-effort continuation.

use std::fmt;

use thiserror::Error;

/// Invalid configuration detected while building settings or options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `border_width` must be a finite number greater than zero.
    #[error("border width must be a positive finite number, got {0}")]
    BorderWidth(f64),
    /// The first page of a range lies after its last page.
    #[error("invalid page range: first page {first} is after last page {last}")]
    PageRange { first: usize, last: usize },
    /// Page numbers are 1-based.
    #[error("invalid page range: page numbers start at 1")]
    ZeroPage,
    /// A page-range string did not match `N`, `N-M`, `N-` or `-M`.
    #[error("invalid page range {0:?}: expected N, N-M, N- or -M")]
    PageRangeSyntax(String),
    /// The text line merge ratio must be finite and non-negative.
    #[error("line merge ratio must be a non-negative finite number, got {0}")]
    LineMergeRatio(f64),
}

/// Machine-readable warning code for categorizing extraction issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningCode {
    /// A page could not be decoded and contributed no rows.
    PageAccess,
    /// A lattice edge was only partially covered by a border.
    GridAmbiguity,
    /// A text run fell outside every table on its page.
    TextDropped,
    /// A debug SVG file could not be written.
    DebugOutput,
}

impl WarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::PageAccess => "PAGE_ACCESS",
            WarningCode::GridAmbiguity => "GRID_AMBIGUITY",
            WarningCode::TextDropped => "TEXT_DROPPED",
            WarningCode::DebugOutput => "DEBUG_OUTPUT",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning encountered during extraction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    /// Machine-readable warning code.
    pub code: WarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// 1-based page number where the warning occurred, if applicable.
    pub page: Option<usize>,
}

impl ExtractWarning {
    /// Create a warning with a specific code and description.
    pub fn new(code: WarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
        }
    }

    /// Create a warning with page context.
    pub fn on_page(code: WarningCode, description: impl Into<String>, page: usize) -> Self {
        Self {
            code,
            description: description.into(),
            page: Some(page),
        }
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        Ok(())
    }
}
