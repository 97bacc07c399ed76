//! Text state machine for the content stream interpreter.
//!
//! Covers text objects (`BT`/`ET`), font selection (`Tf`), the spacing and
//! scaling parameters (`Tc Tw Tz TL Ts`) and the text and line matrices
//! driven by `Tm`, `Td`, `TD` and `T*`.

use std::rc::Rc;

use crate::fonts::LoadedFont;
use crate::interpreter_state::Matrix;

/// Text parameters that are part of the graphics state (saved by `q`).
#[derive(Debug, Clone)]
pub struct TextParams {
    pub font: Option<Rc<LoadedFont>>,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling in percent (`Tz`).
    pub h_scaling: f64,
    pub leading: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub params: TextParams,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text_object: bool,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    pub fn text_matrix(&self) -> &Matrix {
        &self.text_matrix
    }

    /// `BT`
    pub fn begin_text(&mut self) {
        self.in_text_object = true;
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text_object = false;
    }

    /// `Tm`
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: like `Td`, also sets the leading to `-ty`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Advance along the baseline by `tx` text space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translate(tx, 0.0).concat(&self.text_matrix);
    }

    /// Horizontal scaling as a factor.
    pub fn h_scale(&self) -> f64 {
        self.params.h_scaling / 100.0
    }
}
