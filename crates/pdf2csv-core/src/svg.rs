//! SVG rendering for visual debugging of table detection.
//!
//! Each page renders as one SVG document with a layer per pipeline stage:
//! the page box, text run boxes, raw border segments, table boxes, grid
//! lines and resolved cells. The SVG coordinate system matches the
//! top-left origin used everywhere else.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::cells::ResolvedTable;
use crate::geometry::{BBox, Orientation};
use crate::lines::LineSegment;
use crate::page::Page;

/// Renders one page's intermediate geometry as SVG markup.
pub struct SvgRenderer<'a> {
    page: &'a Page,
    segments: &'a [LineSegment],
    tables: &'a [ResolvedTable],
}

impl<'a> SvgRenderer<'a> {
    pub fn new(page: &'a Page, segments: &'a [LineSegment], tables: &'a [ResolvedTable]) -> Self {
        Self {
            page,
            segments,
            tables,
        }
    }

    /// Generate a complete SVG 1.1 document.
    pub fn to_svg(&self) -> String {
        let bbox = self.page.bbox;
        let (width, height) = (bbox.width(), bbox.height());
        let mut svg = String::new();

        // `write!` into a String cannot fail.
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             width=\"{width}\" height=\"{height}\" \
             viewBox=\"{} {} {width} {height}\">",
            bbox.x0, bbox.top
        );
        let _ = writeln!(
            svg,
            "  <rect class=\"page\" x=\"{}\" y=\"{}\" width=\"{width}\" height=\"{height}\" \
             fill=\"white\" stroke=\"black\" stroke-width=\"0.5\"/>",
            bbox.x0, bbox.top
        );

        svg.push_str("  <g class=\"char\" fill=\"none\" stroke=\"gray\" stroke-width=\"0.3\">\n");
        for run in &self.page.runs {
            push_rect(&mut svg, &run.bbox, "");
        }
        svg.push_str("  </g>\n");

        svg.push_str("  <g class=\"geo\" stroke=\"blue\" stroke-opacity=\"0.6\">\n");
        for segment in self.segments {
            let _ = writeln!(
                svg,
                "    <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke-width=\"{}\"/>",
                segment.start.x,
                segment.start.y,
                segment.end.x,
                segment.end.y,
                segment.width.max(0.25)
            );
        }
        svg.push_str("  </g>\n");

        svg.push_str("  <g class=\"bbox\" fill=\"none\" stroke=\"green\" stroke-width=\"1\">\n");
        for resolved in self.tables {
            push_rect(&mut svg, &resolved.table.bbox, "");
        }
        svg.push_str("  </g>\n");

        svg.push_str(
            "  <g class=\"split\" stroke=\"red\" stroke-width=\"0.5\" stroke-dasharray=\"2,2\">\n",
        );
        for resolved in self.tables {
            let t = &resolved.table;
            for line in t.horizontals.iter().chain(&t.verticals) {
                let (x1, y1, x2, y2) = match line.orientation {
                    Orientation::Horizontal => (t.bbox.x0, line.position, t.bbox.x1, line.position),
                    Orientation::Vertical => (line.position, t.bbox.top, line.position, t.bbox.bottom),
                };
                let _ = writeln!(
                    svg,
                    "    <line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"/>"
                );
            }
        }
        svg.push_str("  </g>\n");

        svg.push_str(
            "  <g class=\"cell\" fill=\"orange\" fill-opacity=\"0.15\" stroke=\"orange\" stroke-width=\"0.5\">\n",
        );
        for resolved in self.tables {
            for cell in &resolved.cells {
                let title = format!(
                    "r{} c{} {}x{}",
                    cell.row, cell.col, cell.row_span, cell.col_span
                );
                push_rect(&mut svg, &cell.bbox, &title);
            }
        }
        svg.push_str("  </g>\n");

        svg.push_str("</svg>\n");
        svg
    }
}

fn push_rect(svg: &mut String, bbox: &BBox, title: &str) {
    let _ = write!(
        svg,
        "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
        bbox.x0,
        bbox.top,
        bbox.width(),
        bbox.height()
    );
    if title.is_empty() {
        svg.push_str("/>\n");
    } else {
        let _ = writeln!(svg, "><title>{}</title></rect>", escape_xml(title));
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"%(-)?(0)?(\d*)d").ok());

/// Output path for per-page debug SVG files.
///
/// The template may hold printf-style page placeholders (`%d`, `%04d`,
/// `%-3d`); each one is replaced by the 1-based page number. A template
/// without a placeholder is used as-is for a single page, and gets
/// `_page{N}` inserted before its extension when several pages are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgPathTemplate {
    template: String,
}

impl SvgPathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn placeholder(&self) -> Option<&'static Regex> {
        PLACEHOLDER
            .as_ref()
            .filter(|re| re.is_match(&self.template))
    }

    /// Path for `page`, given whether more than one page will be written.
    pub fn path_for(&self, page: usize, multi_page: bool) -> PathBuf {
        if let Some(re) = self.placeholder() {
            let replaced = re.replace_all(&self.template, |caps: &regex::Captures| {
                let left = caps.get(1).is_some();
                let zero = caps.get(2).is_some();
                let width: usize = caps
                    .get(3)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0);
                match (left, zero) {
                    (true, _) => format!("{page:<width$}"),
                    (false, true) => format!("{page:0width$}"),
                    (false, false) => format!("{page:>width$}"),
                }
            });
            return PathBuf::from(replaced.into_owned());
        }
        let path = Path::new(&self.template);
        if !multi_page {
            return path.to_path_buf();
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{stem}_page{page}.{}", ext.to_string_lossy()),
            None => format!("{stem}_page{page}"),
        };
        path.with_file_name(name)
    }
}
