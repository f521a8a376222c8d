use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Axis-aligned box in frame pixels, `(x1, y1)` top-left, `(x2, y2)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Integer corners, truncated toward zero. `None` when the box is not
    /// finite, inverted, or outside the i32 pixel range.
    pub fn pixel_corners(&self) -> Option<(Point, Point)> {
        let to_px = |v: f32| -> Option<i32> {
            if !v.is_finite() || v < i32::MIN as f32 || v > i32::MAX as f32 {
                return None;
            }
            Some(v.trunc() as i32)
        };
        let (x1, y1, x2, y2) = (to_px(self.x1)?, to_px(self.y1)?, to_px(self.x2)?, to_px(self.y2)?);
        if x2 < x1 || y2 < y1 {
            return None;
        }
        Some((Point::new(x1, y1), Point::new(x2, y2)))
    }

    /// Center of the integer box, floor-divided.
    pub fn center(&self) -> Option<Point> {
        let (a, b) = self.pixel_corners()?;
        let cx = (a.x as i64 + b.x as i64).div_euclid(2);
        let cy = (a.y as i64 + b.y as i64).div_euclid(2);
        Some(Point::new(cx as i32, cy as i32))
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// One detector hit for one frame.
///
/// `class_id` is optional because upstream payloads are not always complete;
/// a detection without a class never counts as a vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    #[serde(default)]
    pub class_id: Option<u32>,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32, class_id: u32) -> Self {
        Self {
            bbox,
            confidence,
            class_id: Some(class_id),
        }
    }

    /// Detection whose integer box center lands on `(cx, cy)`.
    pub fn centered_at(cx: i32, cy: i32, half: i32, confidence: f32, class_id: u32) -> Self {
        Self::new(
            BoundingBox::new(
                (cx - half) as f32,
                (cy - half) as f32,
                (cx + half) as f32,
                (cy + half) as f32,
            ),
            confidence,
            class_id,
        )
    }
}
