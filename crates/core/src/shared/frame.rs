use ndarray::{s, Array3, ArrayView3, ShapeError};

use crate::shared::detection::DetectionBatch;
use crate::shared::geometry::PixelRect;

/// An RGB image held as `(rows, cols, 3)` bytes, tagged with its position
/// in the input stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
    index: usize,
}

impl Frame {
    /// Wraps packed row-major RGB bytes. Fails when `data` does not hold
    /// exactly `width * height * 3` bytes.
    pub fn from_rgb(
        data: Vec<u8>,
        width: u32,
        height: u32,
        index: usize,
    ) -> Result<Self, ShapeError> {
        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), data)?;
        Ok(Self { pixels, index })
    }

    /// Black frame, used when only the frame size is known.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        Self {
            pixels: Array3::zeros((height as usize, width as usize, 3)),
            index,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Pixels inside `rect`. The rectangle is re-clamped to this frame, so
    /// a degenerate or out-of-range rect gives an empty view.
    pub fn crop(&self, rect: &PixelRect) -> ArrayView3<'_, u8> {
        let (rows, cols, _) = self.pixels.dim();
        let x2 = (rect.x2 as usize).min(cols);
        let y2 = (rect.y2 as usize).min(rows);
        let x1 = (rect.x1 as usize).min(x2);
        let y1 = (rect.y1 as usize).min(y2);
        self.pixels.slice(s![y1..y2, x1..x2, ..])
    }
}

/// An image and the detection batch stamped at approximately the same time.
#[derive(Clone, Debug)]
pub struct FramePair {
    pub frame: Frame,
    pub batch: DetectionBatch,
}
