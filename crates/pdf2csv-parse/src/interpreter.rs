//! Content stream interpreter.
//!
//! Walks the decoded operations of a page (and of any Form XObjects it
//! draws) and records what table extraction needs: painted subpaths as
//! [`Primitive`]s and shown strings as [`TextRun`]s, both already mapped to
//! top-left page space. Colors, clipping, images and glyph outlines are
//! ignored.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};
use pdf2csv_core::{BBox, PaintOp, Point, Primitive, TextRun};
use tracing::{debug, trace, warn};

use crate::error::BackendError;
use crate::fonts::LoadedFont;
use crate::interpreter_state::{InterpreterState, Matrix};
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve_ref};
use crate::page_geometry::PageGeometry;
use crate::text_state::TextState;

/// Maximum nesting depth for Form XObjects.
pub const MAX_FORM_DEPTH: usize = 8;

/// Glyph box below the baseline, as a fraction of the font size.
const DESCENT: f64 = -0.2;
/// Glyph box above the baseline, as a fraction of the font size.
const ASCENT: f64 = 0.8;

/// A `TJ` gap wider than this fraction of an em reads as a word break and
/// splits the shown text into separate runs.
const TJ_SPACE_THRESHOLD: f64 = 0.25;

const POINT_EPSILON: f64 = 1e-6;

/// Everything recorded from one page's content.
#[derive(Debug, Default)]
pub struct PageContent {
    pub primitives: Vec<Primitive>,
    pub runs: Vec<TextRun>,
}

/// Interpret a page content stream.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] if the page's own content cannot be
/// decoded. Broken Form XObjects are skipped with a warning instead.
pub fn interpret_page(
    doc: &lopdf::Document,
    content: &[u8],
    resources: &Dictionary,
    geometry: PageGeometry,
) -> Result<PageContent, BackendError> {
    let content = Content::decode(content)
        .map_err(|e| BackendError::Interpreter(format!("failed to decode content stream: {e}")))?;
    let mut interpreter = Interpreter::new(doc, geometry);
    interpreter.run(&content.operations, resources, 0);
    Ok(interpreter.out)
}

#[derive(Debug, Default)]
struct Subpath {
    points: Vec<Point>,
    closed: bool,
}

struct Interpreter<'d> {
    doc: &'d lopdf::Document,
    geometry: PageGeometry,
    gstate: InterpreterState,
    tstate: TextState,
    fonts: HashMap<ObjectId, Rc<LoadedFont>>,
    font_resource: String,
    subpaths: Vec<Subpath>,
    out: PageContent,
}

impl<'d> Interpreter<'d> {
    fn new(doc: &'d lopdf::Document, geometry: PageGeometry) -> Self {
        Self {
            doc,
            geometry,
            gstate: InterpreterState::default(),
            tstate: TextState::new(),
            fonts: HashMap::new(),
            font_resource: String::new(),
            subpaths: Vec::new(),
            out: PageContent::default(),
        }
    }

    fn run(&mut self, operations: &[Operation], resources: &Dictionary, depth: usize) {
        for op in operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                // Graphics state
                "q" => self.gstate.save_state(self.tstate.params.clone()),
                "Q" => {
                    if let Some(params) = self.gstate.restore_state() {
                        self.tstate.params = params;
                    }
                }
                "cm" => {
                    if let Some([a, b, c, d, e, f]) = numbers(operands) {
                        self.gstate.concat_matrix(Matrix::new(a, b, c, d, e, f));
                    }
                }
                "w" => {
                    if let Some([w]) = numbers(operands) {
                        self.gstate.set_line_width(w);
                    }
                }

                // Path construction
                "m" => {
                    if let Some([x, y]) = numbers(operands) {
                        self.move_to(x, y);
                    }
                }
                "l" => {
                    if let Some([x, y]) = numbers(operands) {
                        self.line_to(x, y);
                    }
                }
                "c" => {
                    if let Some([_, _, _, _, x, y]) = numbers(operands) {
                        self.line_to(x, y);
                    }
                }
                "v" | "y" => {
                    if let Some([_, _, x, y]) = numbers(operands) {
                        self.line_to(x, y);
                    }
                }
                "re" => {
                    if let Some([x, y, w, h]) = numbers(operands) {
                        self.move_to(x, y);
                        self.line_to(x + w, y);
                        self.line_to(x + w, y + h);
                        self.line_to(x, y + h);
                        self.close_path();
                    }
                }
                "h" => self.close_path(),

                // Path painting
                "S" => self.paint(Some(PaintOp::Stroke), false),
                "s" => self.paint(Some(PaintOp::Stroke), true),
                "f" | "F" | "f*" => self.paint(Some(PaintOp::Fill), false),
                "B" | "B*" => self.paint(Some(PaintOp::FillAndStroke), false),
                "b" | "b*" => self.paint(Some(PaintOp::FillAndStroke), true),
                "n" => self.paint(None, false),

                // Text objects and state
                "BT" => self.tstate.begin_text(),
                "ET" => self.tstate.end_text(),
                "Tf" => self.set_font(operands, resources),
                "Tc" => {
                    if let Some([v]) = numbers(operands) {
                        self.tstate.params.char_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some([v]) = numbers(operands) {
                        self.tstate.params.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some([v]) = numbers(operands) {
                        self.tstate.params.h_scaling = v;
                    }
                }
                "TL" => {
                    if let Some([v]) = numbers(operands) {
                        self.tstate.params.leading = v;
                    }
                }
                "Ts" => {
                    if let Some([v]) = numbers(operands) {
                        self.tstate.params.rise = v;
                    }
                }
                "Tm" => {
                    if let Some([a, b, c, d, e, f]) = numbers(operands) {
                        self.tstate.set_text_matrix(Matrix::new(a, b, c, d, e, f));
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers(operands) {
                        self.tstate.move_text_position(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers(operands) {
                        self.tstate.move_text_position_and_set_leading(tx, ty);
                    }
                }
                "T*" => self.tstate.move_to_next_line(),

                // Text showing
                "Tj" => {
                    if let Some(text @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(text));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(items);
                    }
                }
                "'" => {
                    self.tstate.move_to_next_line();
                    if let Some(text @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(text));
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (number(operands, 0), number(operands, 1)) {
                        self.tstate.params.word_spacing = aw;
                        self.tstate.params.char_spacing = ac;
                    }
                    self.tstate.move_to_next_line();
                    if let Some(text @ Object::String(..)) = operands.get(2) {
                        self.show(std::slice::from_ref(text));
                    }
                }

                // XObjects
                "Do" => {
                    if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                        self.draw_xobject(name, resources, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn to_page(&self, x: f64, y: f64) -> Point {
        let (ux, uy) = self.gstate.ctm().apply(x, y);
        self.geometry.to_page(ux, uy)
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let point = self.to_page(x, y);
        // A bare `m` followed by another `m` leaves nothing to paint.
        if self.subpaths.last().is_some_and(|s| s.points.len() == 1) {
            self.subpaths.pop();
        }
        self.subpaths.push(Subpath {
            points: vec![point],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let point = self.to_page(x, y);
        match self.subpaths.last_mut() {
            Some(current) if !current.closed => current.points.push(point),
            // Drawing after `h` starts a new subpath at the previous start.
            Some(current) => {
                let start = current.points[0];
                self.subpaths.push(Subpath {
                    points: vec![start, point],
                    closed: false,
                });
            }
            None => trace!("line without current point ignored"),
        }
    }

    fn close_path(&mut self) {
        if let Some(current) = self.subpaths.last_mut() {
            current.closed = true;
        }
    }

    fn paint(&mut self, paint: Option<PaintOp>, close: bool) {
        let subpaths = std::mem::take(&mut self.subpaths);
        let Some(paint) = paint else {
            return;
        };
        let line_width = self.gstate.device_line_width();
        for Subpath { mut points, closed } in subpaths {
            let mut closed = closed || close;
            if points.len() > 2 && same_point(points[0], points[points.len() - 1]) {
                points.pop();
                closed = true;
            }
            if points.len() < 2 {
                continue;
            }
            let primitive = match as_rect(&points) {
                Some(bbox) if closed || paint != PaintOp::Stroke => Primitive::Rect {
                    bbox,
                    paint,
                    line_width,
                },
                _ => Primitive::Path {
                    points,
                    closed,
                    paint,
                    line_width,
                },
            };
            self.out.primitives.push(primitive);
        }
    }

    fn set_font(&mut self, operands: &[Object], resources: &Dictionary) {
        let (Some(Ok(name)), Some(size)) = (operands.first().map(Object::as_name), number(operands, 1))
        else {
            return;
        };
        let name = String::from_utf8_lossy(name).into_owned();
        self.tstate.params.font_size = size;
        self.tstate.params.font = Some(self.load_font(&name, resources));
        self.font_resource = name;
    }

    fn load_font(&mut self, name: &str, resources: &Dictionary) -> Rc<LoadedFont> {
        let entry = resources
            .get(b"Font")
            .ok()
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| fonts.get(name.as_bytes()).ok());
        match entry {
            Some(Object::Reference(id)) => {
                if let Some(font) = self.fonts.get(id) {
                    return Rc::clone(font);
                }
                let font = match self.doc.get_dictionary(*id) {
                    Ok(dict) => LoadedFont::load(self.doc, dict),
                    Err(e) => {
                        debug!(font = name, error = %e, "font object unreadable, using defaults");
                        LoadedFont::fallback(name)
                    }
                };
                let font = Rc::new(font);
                self.fonts.insert(*id, Rc::clone(&font));
                font
            }
            Some(Object::Dictionary(dict)) => Rc::new(LoadedFont::load(self.doc, dict)),
            _ => {
                debug!(font = name, "font not found in resources, using defaults");
                Rc::new(LoadedFont::fallback(name))
            }
        }
    }

    /// Show strings and `TJ` adjustments.
    ///
    /// A `TJ` gap wide enough to read as a word break closes the current run
    /// and the next string starts a new one after the gap, so a row laid out
    /// as one kerned array still lands in separate cells.
    fn show(&mut self, items: &[Object]) {
        let params = &self.tstate.params;
        let font = params
            .font
            .clone()
            .unwrap_or_else(|| Rc::new(LoadedFont::fallback(&self.font_resource)));
        let size = params.font_size;
        let rise = params.rise;
        let h_scale = self.tstate.h_scale();
        let (char_spacing, word_spacing) = (params.char_spacing, params.word_spacing);

        let start = self.tstate.text_matrix().concat(self.gstate.ctm());
        let mut pieces: Vec<(String, f64, f64)> = Vec::new();
        let mut text = String::new();
        let mut piece_start = 0.0;
        let mut advance = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    for code in font.codes(bytes) {
                        let mut tx = font.width(code) / 1000.0 * size + char_spacing;
                        if !font.is_two_byte() && code == 32 {
                            tx += word_spacing;
                        }
                        advance += tx * h_scale;
                        text.push_str(&font.decode(code));
                    }
                }
                other => {
                    let Ok(adjust) = object_to_f64(other) else {
                        continue;
                    };
                    let shift = -adjust / 1000.0 * size * h_scale;
                    if shift > TJ_SPACE_THRESHOLD * size {
                        pieces.push((std::mem::take(&mut text), piece_start, advance));
                        piece_start = advance + shift;
                    }
                    advance += shift;
                }
            }
        }
        pieces.push((text, piece_start, advance));
        self.tstate.advance(advance);

        let font_name = if font.name().is_empty() {
            self.font_resource.clone()
        } else {
            font.name().to_string()
        };
        for (text, x0, x1) in pieces {
            if text.trim().is_empty() {
                continue;
            }
            let corners = [
                (x0, rise + DESCENT * size),
                (x1, rise + DESCENT * size),
                (x1, rise + ASCENT * size),
                (x0, rise + ASCENT * size),
            ]
            .map(|(x, y)| {
                let (ux, uy) = start.apply(x, y);
                self.geometry.to_page(ux, uy)
            });
            let bbox = corners[1..].iter().fold(
                BBox::from_corners(corners[0], corners[0]),
                |acc, p| acc.union(&BBox::from_corners(*p, *p)),
            );
            let (bx, by) = start.apply(x0, rise);
            self.out.runs.push(TextRun {
                text,
                bbox,
                baseline: self.geometry.to_page(bx, by).y,
                font_size: size * start.vertical_scale(),
                font_name: font_name.clone(),
            });
        }
    }

    fn draw_xobject(&mut self, name: &[u8], resources: &Dictionary, depth: usize) {
        let name = String::from_utf8_lossy(name);
        let stream = resources
            .get(b"XObject")
            .ok()
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|xobjects| xobjects.get(name.as_bytes()).ok())
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| o.as_stream().ok());
        let Some(stream) = stream else {
            debug!(xobject = %name, "XObject not found in resources");
            return;
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == b"Form");
        if !is_form {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            warn!(xobject = %name, depth, "Form XObject nesting too deep, skipping");
            return;
        }
        let operations = match decode_stream(stream)
            .and_then(|bytes| Content::decode(&bytes).map_err(|e| BackendError::Interpreter(e.to_string())))
        {
            Ok(content) => content.operations,
            Err(e) => {
                warn!(xobject = %name, error = %e, "failed to decode Form XObject");
                return;
            }
        };
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .map(|o| resolve_ref(self.doc, o))
            .and_then(|o| o.as_dict().ok())
            .unwrap_or(resources);

        self.gstate.save_state(self.tstate.params.clone());
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| numbers::<6>(arr));
        if let Some([a, b, c, d, e, f]) = matrix {
            self.gstate.concat_matrix(Matrix::new(a, b, c, d, e, f));
        }
        // Paths do not carry across the XObject boundary.
        let outer_path = std::mem::take(&mut self.subpaths);
        self.run(&operations, form_resources, depth + 1);
        self.subpaths = outer_path;
        if let Some(params) = self.gstate.restore_state() {
            self.tstate.params = params;
        }
    }
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| object_to_f64(o).ok())
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = object_to_f64(operand).ok()?;
    }
    Some(out)
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < POINT_EPSILON && (a.y - b.y).abs() < POINT_EPSILON
}

/// The bounding box of a 4-point polygon whose sides alternate between
/// horizontal and vertical.
fn as_rect(points: &[Point]) -> Option<BBox> {
    let [p0, p1, p2, p3] = points else {
        return None;
    };
    let corners = [*p0, *p1, *p2, *p3];
    let mut horizontal = [false; 4];
    for i in 0..4 {
        let (a, b) = (corners[i], corners[(i + 1) % 4]);
        let flat_y = (a.y - b.y).abs() < POINT_EPSILON;
        let flat_x = (a.x - b.x).abs() < POINT_EPSILON;
        if flat_x == flat_y {
            return None;
        }
        horizontal[i] = flat_y;
    }
    if horizontal[0] == horizontal[1] || horizontal[1] == horizontal[2] {
        return None;
    }
    Some(BBox::from_corners(*p0, *p2))
}
