//! Geometry APIs
//!
//! DOMRect in document coordinates.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Edge-inclusive intersection test (touching rects intersect)
    pub fn intersects(&self, other: &DOMRect) -> bool {
        !(self.right() < other.x ||
          self.x > other.right() ||
          self.bottom() < other.y ||
          self.y > other.bottom())
    }

    /// Get intersection rect (zero-sized when only edges touch)
    pub fn intersection(&self, other: &DOMRect) -> Option<DOMRect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(DOMRect {
            x,
            y,
            width: self.right().min(other.right()) - x,
            height: self.bottom().min(other.bottom()) - y,
        })
    }

    /// Grow each edge outward by the given amounts
    pub fn outset(&self, top: f64, right: f64, bottom: f64, left: f64) -> DOMRect {
        DOMRect {
            x: self.x - left,
            y: self.y - top,
            width: (self.width + left + right).max(0.0),
            height: (self.height + top + bottom).max(0.0),
        }
    }
}
