//! Cell resolution and text assignment.
//!
//! A [`Table`]'s lattice is resolved into [`Cell`]s by merging neighbouring
//! lattice cells wherever the border between them is not fully drawn. Text
//! runs are then assigned to the cell they overlap most and joined in
//! reading order.

use tracing::debug;

use crate::error::{ExtractWarning, WarningCode};
use crate::geometry::BBox;
use crate::grid::{Coverage, GridLine, Table};
use crate::page::TextRun;
use crate::settings::Settings;

/// A resolved, possibly merged, table cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Lattice row of the top-left corner.
    pub row: usize,
    /// Lattice column of the top-left corner.
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub bbox: BBox,
    pub text: String,
}

/// A table lattice together with its resolved cells.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedTable {
    pub table: Table,
    /// Cells ordered by top-left row, then column.
    pub cells: Vec<Cell>,
}

impl ResolvedTable {
    /// CSV fields, one row per lattice row and one field per lattice column.
    ///
    /// A merged cell's text sits at its top-left position; the other
    /// positions it covers are empty.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec![String::new(); self.table.col_count()]; self.table.row_count()];
        for cell in &self.cells {
            rows[cell.row][cell.col].clone_from(&cell.text);
        }
        rows
    }
}

/// Resolve the lattice of `table` into cells with empty text.
///
/// Partially drawn edges are treated as absent and reported as
/// [`WarningCode::GridAmbiguity`].
pub fn resolve_cells(
    table: &Table,
    settings: &Settings,
    page: usize,
    warnings: &mut Vec<ExtractWarning>,
) -> ResolvedTable {
    let (rows, cols) = (table.row_count(), table.col_count());
    let tolerance = settings.border_width();
    let mut uf = UnionFind::new(rows * cols);
    let index = |r: usize, c: usize| r * cols + c;

    // Horizontal borders between row r-1 and row r.
    for r in 1..rows {
        let line = &table.horizontals[r];
        for c in 0..cols {
            let (a, b) = (table.verticals[c].position, table.verticals[c + 1].position);
            if !edge_present(line, (a, b), tolerance, page, warnings) {
                uf.union(index(r - 1, c), index(r, c));
            }
        }
    }
    // Vertical borders between column c-1 and column c.
    for c in 1..cols {
        let line = &table.verticals[c];
        for r in 0..rows {
            let (a, b) = (table.horizontals[r].position, table.horizontals[r + 1].position);
            if !edge_present(line, (a, b), tolerance, page, warnings) {
                uf.union(index(r, c - 1), index(r, c));
            }
        }
    }

    // Merged regions must be rectangles; absorb everything inside a
    // component's bounding block until that holds.
    loop {
        let blocks = component_blocks(&mut uf, rows, cols);
        let mut changed = false;
        for block in blocks.iter().flatten() {
            for r in block.r0..=block.r1 {
                for c in block.c0..=block.c1 {
                    changed |= uf.union(index(block.r0, block.c0), index(r, c));
                }
            }
        }
        if !changed {
            break;
        }
    }

    let mut cells: Vec<Cell> = component_blocks(&mut uf, rows, cols)
        .into_iter()
        .flatten()
        .map(|b| {
            let (row_span, col_span) = (b.r1 - b.r0 + 1, b.c1 - b.c0 + 1);
            Cell {
                row: b.r0,
                col: b.c0,
                row_span,
                col_span,
                bbox: table.block_bbox(b.r0, b.c0, row_span, col_span),
                text: String::new(),
            }
        })
        .collect();
    cells.sort_by_key(|cell| (cell.row, cell.col));

    ResolvedTable {
        table: table.clone(),
        cells,
    }
}

fn edge_present(
    line: &GridLine,
    (a, b): (f64, f64),
    tolerance: f64,
    page: usize,
    warnings: &mut Vec<ExtractWarning>,
) -> bool {
    match line.coverage(a, b, tolerance) {
        Coverage::Full => true,
        Coverage::Absent => false,
        Coverage::Partial => {
            let (orientation, position) = (line.orientation, line.position);
            debug!(
                ?orientation,
                position,
                from = a,
                to = b,
                "partially drawn border treated as absent"
            );
            warnings.push(ExtractWarning::on_page(
                WarningCode::GridAmbiguity,
                format!(
                    "{orientation:?} border at {position:.2} only partially covers \
                     {a:.2}..{b:.2}; cells merged"
                ),
                page,
            ));
            false
        }
    }
}

/// Inclusive lattice index rectangle.
#[derive(Debug, Clone, Copy)]
struct Block {
    r0: usize,
    c0: usize,
    r1: usize,
    c1: usize,
}

/// Bounding block of each union-find component, indexed by root.
fn component_blocks(uf: &mut UnionFind, rows: usize, cols: usize) -> Vec<Option<Block>> {
    let mut blocks: Vec<Option<Block>> = vec![None; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            let root = uf.find(r * cols + c);
            let block = blocks[root].get_or_insert(Block { r0: r, c0: c, r1: r, c1: c });
            block.r0 = block.r0.min(r);
            block.c0 = block.c0.min(c);
            block.r1 = block.r1.max(r);
            block.c1 = block.c1.max(c);
        }
    }
    blocks
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Returns whether two separate sets were joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (root, child) = (ra.min(rb), ra.max(rb));
        self.parent[child] = root;
        true
    }
}

/// Assign each text run to the cell it overlaps most, across every table on
/// the page, then fill in cell text.
///
/// Ties keep the first cell in table then reading order. A run with no
/// overlap area (a zero-width run, say) goes to the first cell containing
/// its center. Runs outside every table are dropped and reported as
/// [`WarningCode::TextDropped`].
pub fn assign_text(
    tables: &mut [ResolvedTable],
    runs: &[TextRun],
    settings: &Settings,
    page: usize,
    warnings: &mut Vec<ExtractWarning>,
) {
    let mut buckets: Vec<Vec<Vec<&TextRun>>> = tables
        .iter()
        .map(|t| vec![Vec::new(); t.cells.len()])
        .collect();

    for run in runs.iter().filter(|r| !r.text.trim().is_empty()) {
        match best_cell(tables, &run.bbox) {
            Some((t, c)) => buckets[t][c].push(run),
            None => {
                debug!(text = %run.text, bbox = ?run.bbox, "text run outside every table dropped");
                warnings.push(ExtractWarning::on_page(
                    WarningCode::TextDropped,
                    format!("text {:?} lies outside every table", run.text),
                    page,
                ));
            }
        }
    }

    for (table, table_buckets) in tables.iter_mut().zip(buckets) {
        for (cell, mut cell_runs) in table.cells.iter_mut().zip(table_buckets) {
            cell.text = join_runs(&mut cell_runs, settings.line_merge_ratio());
        }
    }
}

fn best_cell(tables: &[ResolvedTable], bbox: &BBox) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (t, table) in tables.iter().enumerate() {
        for (c, cell) in table.cells.iter().enumerate() {
            let area = cell.bbox.intersection_area(bbox);
            if area > best.map_or(0.0, |(_, a)| a) {
                best = Some(((t, c), area));
            }
        }
    }
    if let Some((found, _)) = best {
        return Some(found);
    }
    let center = bbox.center();
    tables.iter().enumerate().find_map(|(t, table)| {
        table
            .cells
            .iter()
            .position(|cell| cell.bbox.contains(center))
            .map(|c| (t, c))
    })
}

/// Join runs top to bottom, left to right within a line.
///
/// A run starts a new line when its top lies more than `ratio` times the
/// current line's height below the line's top.
fn join_runs(runs: &mut [&TextRun], ratio: f64) -> String {
    runs.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<Vec<&TextRun>> = Vec::new();
    let (mut line_top, mut line_bottom) = (0.0_f64, 0.0_f64);
    for run in runs.iter() {
        let same_line = match lines.last() {
            Some(_) => run.bbox.top - line_top <= ratio * (line_bottom - line_top),
            None => false,
        };
        if same_line {
            line_bottom = line_bottom.max(run.bbox.bottom);
            if let Some(line) = lines.last_mut() {
                line.push(run);
            }
        } else {
            line_top = run.bbox.top;
            line_bottom = run.bbox.bottom;
            lines.push(vec![run]);
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            line.iter()
                .map(|r| r.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_tables;
    use crate::lines::LineSegment;

    fn grid_segments(ys: &[f64], xs: &[f64]) -> Vec<LineSegment> {
        let (x0, x1) = (xs[0], xs[xs.len() - 1]);
        let (y0, y1) = (ys[0], ys[ys.len() - 1]);
        let mut segs: Vec<LineSegment> = ys
            .iter()
            .map(|&y| LineSegment::horizontal(y, x0, x1, 0.5))
            .collect();
        segs.extend(xs.iter().map(|&x| LineSegment::vertical(x, y0, y1, 0.5)));
        segs
    }

    fn resolve(segs: &[LineSegment]) -> (Vec<ResolvedTable>, Vec<ExtractWarning>) {
        let settings = Settings::default();
        let mut warnings = Vec::new();
        let tables = build_tables(segs, &settings)
            .iter()
            .map(|t| resolve_cells(t, &settings, 1, &mut warnings))
            .collect();
        (tables, warnings)
    }

    fn run(text: &str, x0: f64, top: f64) -> TextRun {
        TextRun::new(text, BBox::new(x0, top, x0 + 6.0 * text.len() as f64, top + 10.0))
    }

    fn spans(table: &ResolvedTable) -> Vec<(usize, usize, usize, usize)> {
        table
            .cells
            .iter()
            .map(|c| (c.row, c.col, c.row_span, c.col_span))
            .collect()
    }

    #[test]
    fn full_grid_has_one_cell_per_lattice_cell() {
        let (tables, warnings) = resolve(&grid_segments(&[0.0, 20.0, 40.0], &[0.0, 50.0, 100.0]));
        assert_eq!(
            spans(&tables[0]),
            vec![(0, 0, 1, 1), (0, 1, 1, 1), (1, 0, 1, 1), (1, 1, 1, 1)]
        );
        assert!(warnings.is_empty());
        assert_eq!(tables[0].cells[3].bbox, BBox::new(50.0, 20.0, 100.0, 40.0));
    }

    #[test]
    fn missing_interior_vertical_merges_header() {
        let mut segs = grid_segments(&[0.0, 20.0, 40.0], &[0.0, 100.0]);
        segs.push(LineSegment::vertical(50.0, 20.0, 40.0, 0.5));
        let (tables, warnings) = resolve(&segs);
        assert_eq!(spans(&tables[0]), vec![(0, 0, 1, 2), (1, 0, 1, 1), (1, 1, 1, 1)]);
        assert!(warnings.is_empty());
        assert_eq!(tables[0].cells[0].bbox, BBox::new(0.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn missing_interior_horizontal_merges_rows() {
        let mut segs = grid_segments(&[0.0, 40.0], &[0.0, 50.0, 100.0]);
        segs.push(LineSegment::horizontal(20.0, 50.0, 100.0, 0.5));
        let (tables, _) = resolve(&segs);
        assert_eq!(spans(&tables[0]), vec![(0, 0, 2, 1), (0, 1, 1, 1), (1, 1, 1, 1)]);
    }

    #[test]
    fn non_rectangular_merge_expands_to_block() {
        // 3x3 lattice where the center cell joins its right and lower
        // neighbours, forming an L that must grow into a 2x2 block.
        let xs = [0.0, 10.0, 20.0, 30.0];
        let ys = [0.0, 10.0, 20.0, 30.0];
        let segs = vec![
            LineSegment::horizontal(0.0, 0.0, 30.0, 0.5),
            LineSegment::horizontal(30.0, 0.0, 30.0, 0.5),
            LineSegment::vertical(0.0, 0.0, 30.0, 0.5),
            LineSegment::vertical(30.0, 0.0, 30.0, 0.5),
            // row boundary y=10 complete
            LineSegment::horizontal(ys[1], 0.0, 30.0, 0.5),
            // row boundary y=20 only under column 0 and column 2
            LineSegment::horizontal(ys[2], 0.0, 10.0, 0.5),
            LineSegment::horizontal(ys[2], 20.0, 30.0, 0.5),
            // column boundary x=10 complete
            LineSegment::vertical(xs[1], 0.0, 30.0, 0.5),
            // column boundary x=20 only in rows 0 and 2
            LineSegment::vertical(xs[2], 0.0, 10.0, 0.5),
            LineSegment::vertical(xs[2], 20.0, 30.0, 0.5),
        ];
        let (tables, _) = resolve(&segs);
        let t = &tables[0];
        assert_eq!(t.cells.iter().map(|c| c.row_span * c.col_span).sum::<usize>(), 9);
        assert!(spans(t).contains(&(1, 1, 2, 2)));
    }

    #[test]
    fn partial_border_is_ambiguous_and_merges() {
        let mut segs = grid_segments(&[0.0, 20.0, 40.0], &[0.0, 100.0]);
        segs.push(LineSegment::vertical(50.0, 0.0, 10.0, 0.5));
        segs.push(LineSegment::vertical(50.0, 20.0, 40.0, 0.5));
        let (tables, warnings) = resolve(&segs);
        assert_eq!(spans(&tables[0]), vec![(0, 0, 1, 2), (1, 0, 1, 1), (1, 1, 1, 1)]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::GridAmbiguity);
        assert_eq!(warnings[0].page, Some(1));
    }

    #[test]
    fn cells_tile_the_lattice() {
        let mut segs = grid_segments(&[0.0, 20.0, 40.0, 60.0], &[0.0, 100.0]);
        segs.push(LineSegment::vertical(30.0, 20.0, 60.0, 0.5));
        segs.push(LineSegment::vertical(70.0, 0.0, 40.0, 0.5));
        let (tables, _) = resolve(&segs);
        let t = &tables[0];
        let mut covered = vec![vec![0; t.table.col_count()]; t.table.row_count()];
        for cell in &t.cells {
            for r in cell.row..cell.row + cell.row_span {
                for c in cell.col..cell.col + cell.col_span {
                    covered[r][c] += 1;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&n| n == 1));
    }

    #[test]
    fn text_goes_to_cells_in_reading_order() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 20.0, 40.0, 60.0], &[0.0, 50.0, 100.0]));
        let runs = vec![
            run("F", 60.0, 45.0),
            run("A", 5.0, 5.0),
            run("B", 55.0, 5.0),
            run("C", 5.0, 25.0),
            run("D", 55.0, 25.0),
            run("E", 5.0, 45.0),
        ];
        let mut warnings = Vec::new();
        assign_text(&mut tables, &runs, &Settings::default(), 1, &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(
            tables[0].rows(),
            vec![vec!["A", "B"], vec!["C", "D"], vec!["E", "F"]]
        );
    }

    #[test]
    fn merged_header_text_sits_top_left() {
        let mut segs = grid_segments(&[0.0, 20.0, 40.0], &[0.0, 100.0]);
        segs.push(LineSegment::vertical(50.0, 20.0, 40.0, 0.5));
        let (mut tables, _) = resolve(&segs);
        let runs = vec![run("Header", 30.0, 5.0), run("X", 5.0, 25.0), run("Y", 55.0, 25.0)];
        assign_text(&mut tables, &runs, &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].rows(), vec![vec!["Header", ""], vec!["X", "Y"]]);
    }

    #[test]
    fn run_straddling_cells_goes_to_largest_overlap() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 20.0], &[0.0, 50.0, 100.0]));
        let straddling = TextRun::new("wide", BBox::new(40.0, 5.0, 80.0, 15.0));
        assign_text(&mut tables, &[straddling], &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].rows(), vec![vec!["", "wide"]]);
    }

    #[test]
    fn equal_overlap_keeps_first_cell() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 20.0], &[0.0, 50.0, 100.0]));
        let centered = TextRun::new("mid", BBox::new(40.0, 5.0, 60.0, 15.0));
        assign_text(&mut tables, &[centered], &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].rows(), vec![vec!["mid", ""]]);
    }

    #[test]
    fn zero_area_run_uses_center() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 20.0], &[0.0, 50.0, 100.0]));
        let flat = TextRun::new("x", BBox::new(70.0, 10.0, 70.0, 10.0));
        assign_text(&mut tables, &[flat], &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].rows(), vec![vec!["", "x"]]);
    }

    #[test]
    fn run_outside_tables_is_dropped_with_warning() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 20.0], &[0.0, 50.0, 100.0]));
        let mut warnings = Vec::new();
        let runs = vec![run("Title", 0.0, 200.0), run("   ", 5.0, 5.0)];
        assign_text(&mut tables, &runs, &Settings::default(), 4, &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::TextDropped);
        assert_eq!(warnings[0].page, Some(4));
        assert_eq!(tables[0].rows(), vec![vec!["", ""]]);
    }

    #[test]
    fn runs_on_one_line_join_with_space_and_lines_with_newline() {
        let (mut tables, _) = resolve(&grid_segments(&[0.0, 60.0], &[0.0, 200.0]));
        let runs = vec![
            run("world", 50.0, 5.5),
            run(" hello ", 5.0, 5.0),
            run("second", 5.0, 20.0),
            run("line", 60.0, 20.0),
        ];
        assign_text(&mut tables, &runs, &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].cells[0].text, "hello world\nsecond line");
    }

    #[test]
    fn text_in_second_table() {
        let mut segs = grid_segments(&[0.0, 20.0], &[0.0, 50.0]);
        segs.extend(grid_segments(&[100.0, 120.0], &[0.0, 50.0]));
        let (mut tables, _) = resolve(&segs);
        assign_text(&mut tables, &[run("two", 5.0, 105.0)], &Settings::default(), 1, &mut Vec::new());
        assert_eq!(tables[0].rows(), vec![vec![""]]);
        assert_eq!(tables[1].rows(), vec![vec!["two"]]);
    }
}
