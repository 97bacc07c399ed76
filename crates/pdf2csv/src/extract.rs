//! The per-page pipeline and the document-level extraction run.
//!
//! [`extract_page`] takes one decoded page through segment extraction, grid
//! building, cell resolution and text assignment. [`Extractor`] drives it
//! over a [`PageSource`], streaming each page's rows to a [`CsvWriter`] in
//! page order and writing optional debug SVG files.

use std::io::Write;

use pdf2csv_core::{
    CsvWriter, ExtractWarning, LineSegment, Page, PageRange, PageSource, ResolvedTable, Settings,
    SvgPathTemplate, SvgRenderer, WarningCode, assign_text, build_tables, extract_segments,
    resolve_cells,
};
use tracing::{debug, info, info_span, warn};

use crate::error::Error;
use crate::output::write_atomic;

/// Everything extracted from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageExtraction {
    /// 1-based page number.
    pub page: usize,
    pub segments: Vec<LineSegment>,
    /// Tables in reading order (top to bottom, then left to right).
    pub tables: Vec<ResolvedTable>,
    pub warnings: Vec<ExtractWarning>,
}

impl PageExtraction {
    /// CSV rows of every table, one inner `Vec` per table.
    pub fn rows(&self) -> Vec<Vec<Vec<String>>> {
        self.tables.iter().map(ResolvedTable::rows).collect()
    }
}

/// Run the table pipeline on a single page.
pub fn extract_page(page: &Page, settings: &Settings) -> PageExtraction {
    let _span = info_span!("page", number = page.number).entered();
    let mut warnings = Vec::new();

    let segments = extract_segments(page, settings);
    let grids = build_tables(&segments, settings);
    let mut tables: Vec<ResolvedTable> = grids
        .iter()
        .map(|table| resolve_cells(table, settings, page.number, &mut warnings))
        .collect();
    assign_text(&mut tables, &page.runs, settings, page.number, &mut warnings);
    debug!(
        segments = segments.len(),
        tables = tables.len(),
        "page extracted"
    );

    PageExtraction {
        page: page.number,
        segments,
        tables,
        warnings,
    }
}

/// Resolved configuration of an extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub settings: Settings,
    pub page_range: PageRange,
    /// Where to write per-page debug SVG files, if anywhere.
    pub debug_svg: Option<SvgPathTemplate>,
    /// Decode and resolve pages on the rayon pool. Needs the `parallel`
    /// feature; ignored without it.
    pub parallel: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractSummary {
    pub warnings: Vec<ExtractWarning>,
    pub pages_processed: usize,
    /// Pages in range that could not be decoded.
    pub pages_skipped: usize,
    pub tables: usize,
    pub rows: usize,
}

/// Drives the pipeline over a document.
///
/// # Example
///
/// ```ignore
/// let pdf = Pdf::open_file("report.pdf")?;
/// let summary = Extractor::new(ExtractOptions::default())?
///     .run(&pdf, std::io::stdout().lock())?;
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    /// Validate `options`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the settings or page range are invalid.
    pub fn new(options: ExtractOptions) -> Result<Self, Error> {
        // Rebuild both values through their checked constructors so that
        // deserialized or hand-assembled options are held to the same rules.
        let settings = Settings::new(options.settings.border_width())?
            .with_line_merge_ratio(options.settings.line_merge_ratio())?;
        let page_range = PageRange::new(options.page_range.first(), options.page_range.last())?;
        Ok(Self {
            options: ExtractOptions {
                settings,
                page_range,
                ..options
            },
        })
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every page in range and stream the CSV to `writer`.
    ///
    /// Pages that fail to decode are skipped with a warning. The writer is
    /// flushed before returning.
    ///
    /// # Errors
    ///
    /// [`Error::OutputWrite`] if writing to `writer` fails.
    pub fn run<S, W>(&self, source: &S, writer: W) -> Result<ExtractSummary, Error>
    where
        S: PageSource + Sync,
        W: Write,
    {
        let page_count = source.page_count();
        if let Some(first) = self.options.page_range.first().filter(|f| *f > page_count) {
            warn!(first, page_count, "page range starts after the last page");
        }
        let indices: Vec<usize> = self.options.page_range.indices(page_count).collect();
        let multi_page = indices.len() > 1;
        info!(pages = indices.len(), page_count, "extracting tables");

        let mut csv = CsvWriter::new(writer);
        let mut summary = ExtractSummary::default();
        // Emission waits for the whole window, so output follows page order.
        for window in indices.chunks(self.window_size()) {
            for (index, loaded) in self.process_window(source, window) {
                self.emit(index, loaded, multi_page, &mut csv, &mut summary)?;
            }
        }
        csv.flush()?;
        summary.tables = csv.tables_written();
        summary.rows = csv.rows_written();
        info!(
            pages = summary.pages_processed,
            skipped = summary.pages_skipped,
            tables = summary.tables,
            rows = summary.rows,
            "extraction finished"
        );
        Ok(summary)
    }

    fn window_size(&self) -> usize {
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            return rayon::current_num_threads().max(1);
        }
        1
    }

    fn process_window<S: PageSource + Sync>(
        &self,
        source: &S,
        window: &[usize],
    ) -> Vec<(usize, Result<(Page, PageExtraction), String>)> {
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            use rayon::prelude::*;
            // `collect` on an indexed parallel iterator keeps input order.
            return window
                .par_iter()
                .map(|&index| (index, self.process(source, index)))
                .collect();
        }
        window
            .iter()
            .map(|&index| (index, self.process(source, index)))
            .collect()
    }

    /// Load and extract one page. The error is the collaborator's message.
    fn process<S: PageSource>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<(Page, PageExtraction), String> {
        let page = source.load_page(index).map_err(|e| e.to_string())?;
        let extraction = extract_page(&page, &self.options.settings);
        Ok((page, extraction))
    }

    fn emit<W: Write>(
        &self,
        index: usize,
        loaded: Result<(Page, PageExtraction), String>,
        multi_page: bool,
        csv: &mut CsvWriter<W>,
        summary: &mut ExtractSummary,
    ) -> Result<(), Error> {
        let number = index + 1;
        let (page, extraction) = match loaded {
            Ok(done) => done,
            Err(message) => {
                warn!(page = number, error = %message, "skipping unreadable page");
                summary.warnings.push(ExtractWarning::on_page(
                    WarningCode::PageAccess,
                    message,
                    number,
                ));
                summary.pages_skipped += 1;
                return Ok(());
            }
        };

        for table in &extraction.tables {
            csv.write_table(&table.rows())?;
        }
        if let Some(template) = &self.options.debug_svg {
            if let Some(warning) = write_debug_svg(template, &page, &extraction, multi_page) {
                summary.warnings.push(warning);
            }
        }
        summary.warnings.extend(extraction.warnings);
        summary.pages_processed += 1;
        Ok(())
    }
}

/// Render and write one page's debug SVG. Failures become a warning.
fn write_debug_svg(
    template: &SvgPathTemplate,
    page: &Page,
    extraction: &PageExtraction,
    multi_page: bool,
) -> Option<ExtractWarning> {
    let path = template.path_for(page.number, multi_page);
    let svg = SvgRenderer::new(page, &extraction.segments, &extraction.tables).to_svg();
    match write_atomic(&path, svg.as_bytes()) {
        Ok(()) => {
            debug!(page = page.number, path = %path.display(), "wrote debug SVG");
            None
        }
        Err(e) => {
            warn!(page = page.number, path = %path.display(), error = %e, "failed to write debug SVG");
            Some(ExtractWarning::on_page(
                WarningCode::DebugOutput,
                format!("{}: {e}", path.display()),
                page.number,
            ))
        }
    }
}
