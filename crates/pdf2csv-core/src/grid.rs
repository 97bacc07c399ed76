//! Grid reconstruction: border segments to table lattices.
//!
//! Segments are first grouped into connected components (segments whose
//! boxes touch within `border_width`). Each component large enough on both
//! axes is clustered per axis into canonical [`GridLine`]s, and becomes a
//! [`Table`] when it has at least two grid lines in each direction.

use tracing::{debug, trace};

use crate::geometry::{BBox, Orientation};
use crate::lines::LineSegment;
use crate::settings::Settings;

/// A closed interval along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }
}

/// How much of a lattice edge a grid line actually draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// One extent spans the whole edge.
    Full,
    /// Some border is drawn along the edge, but not all of it.
    Partial,
    /// Nothing is drawn along the edge.
    Absent,
}

/// A canonical border line: one cluster of merged segments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLine {
    pub orientation: Orientation,
    /// Coordinate on the perpendicular axis.
    pub position: f64,
    /// Widest merged source segment.
    pub thickness: f64,
    /// Drawn sub-ranges along the line's own axis, sorted and disjoint.
    pub extents: Vec<Span>,
    /// Total drawn length of the merged segments, used as averaging weight.
    weight: f64,
}

impl GridLine {
    fn from_segment(segment: &LineSegment) -> Self {
        let (start, end) = segment.span();
        Self {
            orientation: segment.orientation,
            position: segment.position(),
            thickness: segment.width,
            extents: vec![Span::new(start, end)],
            weight: segment.length().max(f64::MIN_POSITIVE),
        }
    }

    fn absorb(&mut self, other: GridLine) {
        let total = self.weight + other.weight;
        self.position = (self.position * self.weight + other.position * other.weight) / total;
        self.weight = total;
        self.thickness = self.thickness.max(other.thickness);
        self.extents.extend(other.extents);
    }

    /// Sort extents and join those closer than `tolerance`.
    fn normalize_extents(&mut self, tolerance: f64) {
        self.extents
            .sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
        let mut joined: Vec<Span> = Vec::with_capacity(self.extents.len());
        for span in self.extents.drain(..) {
            match joined.last_mut() {
                Some(last) if span.start <= last.end + tolerance => {
                    last.end = last.end.max(span.end);
                }
                _ => joined.push(span),
            }
        }
        self.extents = joined;
    }

    /// Coverage of the edge from `a` to `b` along this line.
    ///
    /// The edge's ends are shrunk by `tolerance` (at most a quarter of its
    /// length) so that borders stopping just short of a crossing still count.
    pub fn coverage(&self, a: f64, b: f64, tolerance: f64) -> Coverage {
        let tol = tolerance.min((b - a).abs() / 4.0);
        let (lo, hi) = (a.min(b) + tol, a.max(b) - tol);
        if self.extents.iter().any(|s| s.start <= lo && s.end >= hi) {
            Coverage::Full
        } else if self.extents.iter().any(|s| s.end > lo && s.start < hi) {
            Coverage::Partial
        } else {
            Coverage::Absent
        }
    }
}

/// A rectangular lattice of grid lines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub bbox: BBox,
    /// Horizontal lines ordered top to bottom.
    pub horizontals: Vec<GridLine>,
    /// Vertical lines ordered left to right.
    pub verticals: Vec<GridLine>,
}

impl Table {
    /// Number of lattice rows.
    pub fn row_count(&self) -> usize {
        self.horizontals.len().saturating_sub(1)
    }

    /// Number of lattice columns.
    pub fn col_count(&self) -> usize {
        self.verticals.len().saturating_sub(1)
    }

    /// Box of the lattice block starting at (`row`, `col`) and spanning
    /// `row_span` x `col_span` lattice cells.
    pub fn block_bbox(&self, row: usize, col: usize, row_span: usize, col_span: usize) -> BBox {
        BBox::new(
            self.verticals[col].position,
            self.horizontals[row].position,
            self.verticals[col + col_span].position,
            self.horizontals[row + row_span].position,
        )
    }
}

/// Build every table on a page from its border segments.
///
/// Tables come back ordered top to bottom, then left to right.
pub fn build_tables(segments: &[LineSegment], settings: &Settings) -> Vec<Table> {
    let border_width = settings.border_width();
    let mut tables: Vec<Table> = connected_components(segments, border_width)
        .into_iter()
        .filter_map(|component| table_from_component(&component, border_width))
        .collect();
    tables.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    debug!(tables = tables.len(), "built table lattices");
    tables
}

/// Group segments whose boxes touch within `border_width`.
fn connected_components(segments: &[LineSegment], border_width: f64) -> Vec<Vec<LineSegment>> {
    let n = segments.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let boxes: Vec<BBox> = segments.iter().map(|s| s.bbox().expand(border_width / 2.0)).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if boxes[i].touches(&boxes[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<LineSegment>)> = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.push(*segment),
            None => groups.push((root, vec![*segment])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

fn table_from_component(component: &[LineSegment], border_width: f64) -> Option<Table> {
    let extent = component
        .iter()
        .map(LineSegment::bbox)
        .reduce(|a, b| a.union(&b))?;
    if extent.width() < border_width || extent.height() < border_width {
        trace!(?extent, "ignoring component smaller than border width");
        return None;
    }

    let horizontals = cluster_lines(component, Orientation::Horizontal, border_width);
    let verticals = cluster_lines(component, Orientation::Vertical, border_width);
    if horizontals.len() < 2 || verticals.len() < 2 {
        trace!(
            ?extent,
            horizontals = horizontals.len(),
            verticals = verticals.len(),
            "component does not form a lattice"
        );
        return None;
    }

    let bbox = BBox::new(
        verticals[0].position,
        horizontals[0].position,
        verticals[verticals.len() - 1].position,
        horizontals[horizontals.len() - 1].position,
    );
    Some(Table {
        bbox,
        horizontals,
        verticals,
    })
}

/// Cluster the segments of one orientation into grid lines.
///
/// Lines are visited in coordinate order; each one closer than `border_width`
/// to the current cluster is merged into it at the length-weighted average
/// position.
pub fn cluster_lines(
    segments: &[LineSegment],
    orientation: Orientation,
    border_width: f64,
) -> Vec<GridLine> {
    let mut lines: Vec<GridLine> = segments
        .iter()
        .filter(|s| s.orientation == orientation)
        .map(GridLine::from_segment)
        .collect();
    lines.sort_by(|a, b| a.position.total_cmp(&b.position));

    // Absorbing only moves a cluster towards the lines after it, so a single
    // pass leaves every neighbouring pair at least `border_width` apart.
    let mut merged: Vec<GridLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.last_mut() {
            Some(last) if line.position - last.position < border_width => last.absorb(line),
            _ => merged.push(line),
        }
    }

    for line in &mut merged {
        line.normalize_extents(border_width);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    /// Full grid with the given row and column boundaries.
    fn grid(ys: &[f64], xs: &[f64]) -> Vec<LineSegment> {
        let (x0, x1) = (xs[0], xs[xs.len() - 1]);
        let (y0, y1) = (ys[0], ys[ys.len() - 1]);
        let mut segs: Vec<LineSegment> = ys
            .iter()
            .map(|&y| LineSegment::horizontal(y, x0, x1, 0.5))
            .collect();
        segs.extend(xs.iter().map(|&x| LineSegment::vertical(x, y0, y1, 0.5)));
        segs
    }

    #[test]
    fn span_normalizes_order() {
        assert_eq!(Span::new(5.0, 1.0), Span { start: 1.0, end: 5.0 });
    }

    #[test]
    fn close_collinear_segments_merge_into_one_line() {
        let segs = vec![
            LineSegment::horizontal(100.0, 0.0, 50.0, 0.5),
            LineSegment::horizontal(100.6, 50.0, 100.0, 1.5),
        ];
        let lines = cluster_lines(&segs, Orientation::Horizontal, 1.0);
        assert_eq!(lines.len(), 1);
        assert_approx(lines[0].position, 100.3);
        assert_eq!(lines[0].thickness, 1.5);
        assert_eq!(lines[0].extents, vec![Span::new(0.0, 100.0)]);
    }

    #[test]
    fn merge_position_is_length_weighted() {
        let segs = vec![
            LineSegment::vertical(10.0, 0.0, 90.0, 0.5),
            LineSegment::vertical(10.5, 0.0, 10.0, 0.5),
        ];
        let lines = cluster_lines(&segs, Orientation::Vertical, 1.0);
        assert_eq!(lines.len(), 1);
        assert_approx(lines[0].position, 10.05);
    }

    #[test]
    fn distant_lines_stay_separate() {
        let segs = vec![
            LineSegment::horizontal(10.0, 0.0, 50.0, 0.5),
            LineSegment::horizontal(11.0, 0.0, 50.0, 0.5),
        ];
        let lines = cluster_lines(&segs, Orientation::Horizontal, 1.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn merge_compares_against_the_moved_cluster() {
        // 11.6 is within 1.0 of 10.8 but not of the merged line at 10.4.
        let segs = vec![
            LineSegment::horizontal(10.0, 0.0, 50.0, 0.5),
            LineSegment::horizontal(10.8, 0.0, 50.0, 0.5),
            LineSegment::horizontal(11.6, 0.0, 50.0, 0.5),
        ];
        let lines = cluster_lines(&segs, Orientation::Horizontal, 1.0);
        assert_eq!(lines.len(), 2);
        assert_approx(lines[0].position, 10.4);
        assert_approx(lines[1].position, 11.6);
    }

    #[test]
    fn clustered_lines_respect_minimum_separation() {
        let ys = [0.0, 0.4, 1.1, 1.9, 2.6, 5.0, 5.9, 9.0];
        let segs: Vec<LineSegment> = ys
            .iter()
            .map(|&y| LineSegment::horizontal(y, 0.0, 10.0, 0.1))
            .collect();
        let lines = cluster_lines(&segs, Orientation::Horizontal, 1.0);
        for pair in lines.windows(2) {
            assert!(pair[1].position - pair[0].position >= 1.0);
        }
    }

    #[test]
    fn extents_join_within_tolerance_only() {
        let segs = vec![
            LineSegment::horizontal(5.0, 0.0, 10.0, 0.5),
            LineSegment::horizontal(5.0, 10.5, 20.0, 0.5),
            LineSegment::horizontal(5.0, 30.0, 40.0, 0.5),
        ];
        let lines = cluster_lines(&segs, Orientation::Horizontal, 1.0);
        assert_eq!(
            lines[0].extents,
            vec![Span::new(0.0, 20.0), Span::new(30.0, 40.0)]
        );
    }

    #[test]
    fn coverage_classification() {
        let segs = vec![
            LineSegment::horizontal(5.0, 0.0, 40.0, 0.5),
            LineSegment::horizontal(5.0, 60.0, 70.0, 0.5),
        ];
        let line = &cluster_lines(&segs, Orientation::Horizontal, 1.0)[0];
        assert_eq!(line.coverage(0.0, 40.0, 1.0), Coverage::Full);
        assert_eq!(line.coverage(0.5, 39.5, 1.0), Coverage::Full);
        assert_eq!(line.coverage(40.0, 80.0, 1.0), Coverage::Partial);
        assert_eq!(line.coverage(42.0, 58.0, 1.0), Coverage::Absent);
    }

    #[test]
    fn simple_grid_builds_one_table() {
        let segs = grid(&[10.0, 30.0, 50.0, 70.0], &[10.0, 60.0, 110.0]);
        let tables = build_tables(&segs, &Settings::default());
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.col_count(), 2);
        assert_eq!(t.bbox, BBox::new(10.0, 10.0, 110.0, 70.0));
        assert_eq!(t.block_bbox(1, 0, 2, 2), BBox::new(10.0, 30.0, 110.0, 70.0));
    }

    #[test]
    fn no_segments_no_tables() {
        assert!(build_tables(&[], &Settings::default()).is_empty());
    }

    #[test]
    fn lone_lines_do_not_form_tables() {
        let segs = vec![
            LineSegment::horizontal(10.0, 0.0, 100.0, 0.5),
            LineSegment::horizontal(40.0, 0.0, 100.0, 0.5),
        ];
        assert!(build_tables(&segs, &Settings::default()).is_empty());
    }

    #[test]
    fn disconnected_lattices_are_separate_tables_in_reading_order() {
        let mut segs = grid(&[300.0, 320.0, 340.0], &[10.0, 60.0]);
        segs.extend(grid(&[10.0, 30.0], &[10.0, 60.0, 110.0]));
        let tables = build_tables(&segs, &Settings::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].bbox.top, 10.0);
        assert_eq!(tables[0].col_count(), 2);
        assert_eq!(tables[1].bbox.top, 300.0);
        assert_eq!(tables[1].row_count(), 2);
    }

    #[test]
    fn side_by_side_tables_sorted_left_to_right() {
        let mut segs = grid(&[10.0, 30.0], &[200.0, 250.0]);
        segs.extend(grid(&[10.0, 30.0], &[10.0, 60.0]));
        let tables = build_tables(&segs, &Settings::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].bbox.x0, 10.0);
        assert_eq!(tables[1].bbox.x0, 200.0);
    }

    #[test]
    fn double_drawn_borders_collapse() {
        let mut segs = grid(&[10.0, 30.0, 50.0], &[10.0, 60.0, 110.0]);
        segs.extend(grid(&[10.4, 30.4, 50.4], &[10.4, 60.4, 110.4]));
        let tables = build_tables(&segs, &Settings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 2);
        assert_eq!(tables[0].col_count(), 2);
    }
}
