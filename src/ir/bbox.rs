//! Axis-aligned boxes in absolute pixel coordinates.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in XYXY format (x1, y1, x2, y2).
///
/// The constructor does NOT enforce `x1 <= x2` or `y1 <= y2`. Boxes recovered
/// after augmentation may legitimately be degenerate and it is the caller's
/// job to drop them (see [`BBoxXYXY::is_degenerate`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxXYXY {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBoxXYXY {
    #[inline]
    pub fn from_xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Converts from XYWH format (x, y, width, height) where (x, y) is the top-left corner.
    ///
    /// This is the format used by COCO annotations.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Converts to XYWH format (x, y, width, height).
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.x1, self.y1, self.width(), self.height())
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true when the box has zero or negative extent on either axis.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Multiplies every coordinate by `scale`, matching a uniform image resize.
    #[inline]
    pub fn scaled(&self, scale: f64) -> Self {
        Self::from_xyxy(
            self.x1 * scale,
            self.y1 * scale,
            self.x2 * scale,
            self.y2 * scale,
        )
    }

    /// Returns the `[x1, y1, x2, y2]` coordinates.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}
