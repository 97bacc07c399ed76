//! Page coordinate normalization.
//!
//! Maps PDF user space (bottom-left origin, after the CTM) to the top-left
//! origin page space of [`pdf2csv_core::BBox`], honouring the visible box
//! (CropBox, else MediaBox) and the page's `/Rotate` value.

use pdf2csv_core::{BBox, Point};

/// Transform from PDF user space to top-left page space.
///
/// ```
/// use pdf2csv_core::{BBox, Point};
/// use pdf2csv_parse::page_geometry::PageGeometry;
///
/// let geo = PageGeometry::new(BBox::new(0.0, 0.0, 612.0, 792.0), 0);
/// assert_eq!(geo.to_page(72.0, 720.0), Point::new(72.0, 72.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible box in raw PDF coordinates (`top` holds the lower y).
    visible: BBox,
    rotation: i32,
}

impl PageGeometry {
    /// `visible` uses raw PDF array order: `x0`, `top` = y-min, `x1`,
    /// `bottom` = y-max. `rotation` is normalized to 0, 90, 180 or 270.
    pub fn new(visible: BBox, rotation: i32) -> Self {
        let rotation = match rotation.rem_euclid(360) {
            r @ (90 | 180 | 270) => r,
            _ => 0,
        };
        Self { visible, rotation }
    }

    /// Displayed page width.
    pub fn width(&self) -> f64 {
        if self.rotation % 180 == 0 {
            self.visible.width()
        } else {
            self.visible.height()
        }
    }

    /// Displayed page height.
    pub fn height(&self) -> f64 {
        if self.rotation % 180 == 0 {
            self.visible.height()
        } else {
            self.visible.width()
        }
    }

    /// The page box in page space.
    pub fn page_bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width(), self.height())
    }

    /// Map a user-space point to page space.
    pub fn to_page(&self, x: f64, y: f64) -> Point {
        // Offsets from the visible box's lower-left corner.
        let dx = x - self.visible.x0;
        let dy = y - self.visible.top;
        let (w, h) = (self.visible.width(), self.visible.height());
        // Rotation turns the page clockwise when displayed.
        match self.rotation {
            90 => Point::new(dy, dx),
            180 => Point::new(w - dx, dy),
            270 => Point::new(h - dy, w - dx),
            _ => Point::new(dx, h - dy),
        }
    }
}
