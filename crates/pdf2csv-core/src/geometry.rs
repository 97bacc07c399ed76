/// A point in page space (top-left origin, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis a border line runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Bounding box with top-left origin coordinate system.
///
/// - `x0`: left edge
/// - `top`: top edge (distance from top of page)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from top of page)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Build a normalized box from two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            top: a.y.min(b.y),
            x1: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> BBox {
        BBox {
            x0: self.x0 - amount,
            top: self.top - amount,
            x1: self.x1 + amount,
            bottom: self.bottom + amount,
        }
    }

    /// Whether the two boxes overlap or touch (closed intervals).
    pub fn touches(&self, other: &BBox) -> bool {
        self.x0 <= other.x1
            && other.x0 <= self.x1
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Area of the overlap between two boxes, zero when disjoint.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.bottom.min(other.bottom) - self.top.max(other.top);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Whether `p` lies inside the box, edges included.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.top && p.y <= self.bottom
    }

    /// The `[start, end]` extent of the box along `axis`.
    pub fn span(&self, axis: Orientation) -> (f64, f64) {
        match axis {
            Orientation::Horizontal => (self.x0, self.x1),
            Orientation::Vertical => (self.top, self.bottom),
        }
    }
}
