//! Graphics state stack for the content stream interpreter.
//!
//! Tracks the current transformation matrix and line width, saved and
//! restored by `q`/`Q` and modified by `cm`/`w`. Text state parameters
//! that belong to the graphics state ride along in each saved entry.

use crate::text_state::TextParams;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Geometric mean scale factor, used to map line widths to device space.
    pub fn scale(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    /// Length of the transformed unit y vector.
    pub fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
struct SavedState {
    ctm: Matrix,
    line_width: f64,
    text: TextParams,
}

/// Current graphics state plus the `q`/`Q` stack.
#[derive(Debug, Clone)]
pub struct InterpreterState {
    ctm: Matrix,
    line_width: f64,
    stack: Vec<SavedState>,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self::new(Matrix::IDENTITY)
    }
}

impl InterpreterState {
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            line_width: 1.0,
            stack: Vec::new(),
        }
    }

    pub fn ctm(&self) -> &Matrix {
        &self.ctm
    }

    /// Line width in user space, as set by `w`.
    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// Line width after the CTM, in page units.
    pub fn device_line_width(&self) -> f64 {
        self.line_width * self.ctm.scale()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`: push the current state, including the text parameters.
    pub fn save_state(&mut self, text: TextParams) {
        self.stack.push(SavedState {
            ctm: self.ctm,
            line_width: self.line_width,
            text,
        });
    }

    /// `Q`: pop the last saved state. `None` on an unbalanced `Q`.
    pub fn restore_state(&mut self) -> Option<TextParams> {
        let saved = self.stack.pop()?;
        self.ctm = saved.ctm;
        self.line_width = saved.line_width;
        Some(saved.text)
    }

    /// `cm`: CTM' = M × CTM.
    pub fn concat_matrix(&mut self, m: Matrix) {
        self.ctm = m.concat(&self.ctm);
    }

    /// `w`
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }
}
