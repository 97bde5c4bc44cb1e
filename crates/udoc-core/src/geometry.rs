//! Axis-aligned bounding-box geometry.
//!
//! Coordinates are in top-left-origin pixel space, `(x1, y1)` the upper-left
//! corner and `(x2, y2)` the lower-right. Upstream detectors do not always
//! honor `x1 < x2` / `y1 < y2`, so every accessor tolerates reversed
//! coordinate order.

use serde::{Deserialize, Serialize};

/// A detected rectangular region on a page.
///
/// Serialized as the 4-element `[x1, y1, x2, y2]` array used by the layout
/// JSON wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    /// Left x-coordinate
    pub x1: f32,
    /// Top y-coordinate
    pub y1: f32,
    /// Right x-coordinate
    pub x2: f32,
    /// Bottom y-coordinate
    pub y2: f32,
}

impl From<[f32; 4]> for BoundingBox {
    #[inline]
    fn from(c: [f32; 4]) -> Self {
        Self {
            x1: c[0],
            y1: c[1],
            x2: c[2],
            y2: c[3],
        }
    }
}

impl From<BoundingBox> for [f32; 4] {
    #[inline]
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BoundingBox {
    #[inline]
    #[must_use]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Returns the box with coordinates reordered so that `x1 <= x2` and
    /// `y1 <= y2`.
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// `(width, height)` of the box; non-negative for any coordinate order.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        ((self.x2 - self.x1).abs(), (self.y2 - self.y1).abs())
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    /// True when the horizontal intervals of the two boxes overlap or touch.
    #[inline]
    #[must_use]
    pub fn overlaps_horizontally(&self, other: &Self) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.x1 <= b.x2 && a.x2 >= b.x1
    }

    /// True when the vertical intervals of the two boxes overlap or touch.
    #[inline]
    #[must_use]
    pub fn overlaps_vertically(&self, other: &Self) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.y1 <= b.y2 && a.y2 >= b.y1
    }

    /// Minimum Euclidean distance between two rectangles.
    ///
    /// This is a true rectangle-to-rectangle distance, not center-to-center:
    /// boxes that overlap or touch on both axes are at distance 0; otherwise
    /// the result is the Euclidean norm of the per-axis gaps between nearest
    /// edges.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let a = self.normalized();
        let b = other.normalized();

        let x_gap = if a.x1 <= b.x2 && a.x2 >= b.x1 {
            0.0
        } else if b.x1 > a.x2 {
            b.x1 - a.x2
        } else {
            a.x1 - b.x2
        };

        let y_gap = if a.y1 <= b.y2 && a.y2 >= b.y1 {
            0.0
        } else if b.y1 > a.y2 {
            b.y1 - a.y2
        } else {
            a.y1 - b.y2
        };

        if x_gap == 0.0 && y_gap == 0.0 {
            0.0
        } else {
            x_gap.hypot(y_gap)
        }
    }
}
