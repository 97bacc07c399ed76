//! Border segment extraction from painted vector primitives.
//!
//! Every stroked path and every rectangle (stroked or filled) on a page is a
//! border candidate. A primitive that is thinner than `border_width` along one
//! axis collapses to a single [`LineSegment`] along the other axis; anything
//! else contributes its axis-aligned sides. Diagonals and degenerate pieces
//! are discarded.

use tracing::trace;

use crate::geometry::{BBox, Orientation, Point};
use crate::page::{PaintOp, Page, Primitive};
use crate::settings::Settings;

/// Largest `minor / major` extent ratio a path segment may have and still
/// count as axis-aligned (about three degrees).
pub const AXIS_SKEW_TOLERANCE: f64 = 0.05;

/// An orthogonal border candidate.
///
/// `start` and `end` share their perpendicular coordinate; `start` is always
/// the smaller end along the segment's own axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    /// Stroke width, or the thin-axis extent of a collapsed primitive.
    pub width: f64,
    pub orientation: Orientation,
}

impl LineSegment {
    /// A horizontal segment at `y` from `x0` to `x1`.
    pub fn horizontal(y: f64, x0: f64, x1: f64, width: f64) -> Self {
        Self {
            start: Point::new(x0.min(x1), y),
            end: Point::new(x0.max(x1), y),
            width,
            orientation: Orientation::Horizontal,
        }
    }

    /// A vertical segment at `x` from `top` to `bottom`.
    pub fn vertical(x: f64, top: f64, bottom: f64, width: f64) -> Self {
        Self {
            start: Point::new(x, top.min(bottom)),
            end: Point::new(x, top.max(bottom)),
            width,
            orientation: Orientation::Vertical,
        }
    }

    /// Coordinate on the perpendicular axis (y for horizontal, x for vertical).
    pub fn position(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.start.y,
            Orientation::Vertical => self.start.x,
        }
    }

    /// `(start, end)` along the segment's own axis.
    pub fn span(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Horizontal => (self.start.x, self.end.x),
            Orientation::Vertical => (self.start.y, self.end.y),
        }
    }

    pub fn length(&self) -> f64 {
        let (a, b) = self.span();
        b - a
    }

    /// Area covered by the segment, thickness included.
    pub fn bbox(&self) -> BBox {
        let half = self.width / 2.0;
        match self.orientation {
            Orientation::Horizontal => {
                BBox::new(self.start.x, self.start.y - half, self.end.x, self.start.y + half)
            }
            Orientation::Vertical => {
                BBox::new(self.start.x - half, self.start.y, self.start.x + half, self.end.y)
            }
        }
    }
}

/// Extract candidate border segments from all primitives of `page`.
///
/// Returns an empty list for pages without visible borders.
pub fn extract_segments(page: &Page, settings: &Settings) -> Vec<LineSegment> {
    let border_width = settings.border_width();
    let mut segments = Vec::new();
    for primitive in &page.primitives {
        match primitive {
            Primitive::Rect {
                bbox,
                paint,
                line_width,
            } => {
                let corners = [
                    Point::new(bbox.x0, bbox.top),
                    Point::new(bbox.x1, bbox.top),
                    Point::new(bbox.x1, bbox.bottom),
                    Point::new(bbox.x0, bbox.bottom),
                ];
                collect_outline(&corners, true, *paint, *line_width, border_width, &mut segments);
            }
            Primitive::Path {
                points,
                closed,
                paint,
                line_width,
            } => {
                collect_outline(points, *closed, *paint, *line_width, border_width, &mut segments);
            }
        }
    }
    trace!(count = segments.len(), "extracted border segments");
    segments
}

fn collect_outline(
    points: &[Point],
    closed: bool,
    paint: PaintOp,
    line_width: f64,
    border_width: f64,
    out: &mut Vec<LineSegment>,
) {
    let Some(first) = points.first() else {
        return;
    };
    let bbox = points
        .iter()
        .fold(BBox::from_corners(*first, *first), |acc, p| {
            acc.union(&BBox::from_corners(*p, *p))
        });
    let stroke = if paint.strokes() { line_width.max(0.0) } else { 0.0 };

    // A primitive thin on one axis is one border line along the other.
    let thin_x = bbox.width() < border_width;
    let thin_y = bbox.height() < border_width;
    match (thin_x, thin_y) {
        (true, true) => {
            trace!(?bbox, "discarding degenerate primitive");
            return;
        }
        (false, true) => {
            let y = (bbox.top + bbox.bottom) / 2.0;
            out.push(LineSegment::horizontal(y, bbox.x0, bbox.x1, bbox.height() + stroke));
            return;
        }
        (true, false) => {
            let x = (bbox.x0 + bbox.x1) / 2.0;
            out.push(LineSegment::vertical(x, bbox.top, bbox.bottom, bbox.width() + stroke));
            return;
        }
        (false, false) => {}
    }

    // Otherwise each axis-aligned side counts on its own. An open filled path
    // is implicitly closed by the fill.
    let close = closed || paint != PaintOp::Stroke;
    let pairs = points.windows(2).map(|w| (w[0], w[1]));
    let closing = if close && points.len() > 2 {
        points.last().map(|last| (*last, *first))
    } else {
        None
    };
    for (a, b) in pairs.chain(closing) {
        if let Some(segment) = classify(a, b, stroke, border_width) {
            out.push(segment);
        }
    }
}

/// Turn one polyline piece into a border segment if it is axis-aligned and
/// long enough.
fn classify(a: Point, b: Point, width: f64, border_width: f64) -> Option<LineSegment> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    let (major, minor) = (dx.max(dy), dx.min(dy));
    if major < border_width {
        trace!(?a, ?b, "discarding degenerate segment");
        return None;
    }
    if minor >= border_width || minor > major * AXIS_SKEW_TOLERANCE {
        trace!(?a, ?b, "discarding diagonal segment");
        return None;
    }
    if dx >= dy {
        Some(LineSegment::horizontal((a.y + b.y) / 2.0, a.x, b.x, width))
    } else {
        Some(LineSegment::vertical((a.x + b.x) / 2.0, a.y, b.y, width))
    }
}
