//! Page-relative geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned box on one page.
///
/// Coordinates are PDF points with the origin at the top-left corner of the
/// page: `y0` is the top edge and `y1` the bottom edge. Pages are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    #[serde(skip)]
    pub page: usize,
}

impl BoundingBox {
    /// Create a box, swapping coordinates so that `x1 >= x0` and `y1 >= y0`.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32, page: usize) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
            page,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Rectangle intersection test. Boxes on different pages never overlap;
    /// touching edges count as overlapping.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        if self.page != other.page {
            return false;
        }

        !(self.x1 < other.x0 || self.x0 > other.x1 || self.y1 < other.y0 || self.y0 > other.y1)
    }

    /// Area shared by both boxes (0 across pages).
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        if self.page != other.page {
            return 0.0;
        }

        let x_overlap = (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0);
        let y_overlap = (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0);
        x_overlap * y_overlap
    }

    /// Fraction of this box's own area covered by `other`.
    ///
    /// Returns 0 for degenerate (zero-area) boxes.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Smallest box containing both boxes, on this box's page.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            page: self.page,
        }
    }

    /// Whether a point lies inside the box (edges inclusive).
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}
