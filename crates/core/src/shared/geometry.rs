use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned box in frame pixels, described by its center and full size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub center: Point2D,
    pub size: Vector2D,
}

impl BoundingBox2D {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center: Point2D {
                x: center_x,
                y: center_y,
            },
            size: Vector2D {
                x: width,
                y: height,
            },
        }
    }
}

/// Integer crop rectangle `[x1, x2) x [y1, y2)`, clamped to frame bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    /// Derives the crop for a body box inside a `width` x `height` frame.
    ///
    /// Each edge is truncated toward zero and then clamped into the frame.
    /// Boxes straddling or lying outside the frame shrink, possibly to a
    /// degenerate rectangle; they are never rejected.
    pub fn from_bbox(bbox: &BoundingBox2D, width: u32, height: u32) -> Self {
        let half_w = bbox.size.x / 2.0;
        let half_h = bbox.size.y / 2.0;
        Self {
            x1: clamp_edge(bbox.center.x - half_w, width),
            y1: clamp_edge(bbox.center.y - half_h, height),
            x2: clamp_edge(bbox.center.x + half_w, width),
            y2: clamp_edge(bbox.center.y + half_h, height),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

fn clamp_edge(value: f64, limit: u32) -> u32 {
    // `as` saturates and maps NaN to 0.
    (value.trunc() as i64).clamp(0, limit as i64) as u32
}
