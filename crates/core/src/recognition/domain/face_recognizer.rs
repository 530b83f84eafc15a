use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::shared::detection::TrackId;

/// A cropped body region handed to the recognizer, with its provenance.
pub struct FaceCrop<'a> {
    pub frame_index: usize,
    pub track_id: &'a TrackId,
    /// Pixels shaped `(rows, cols, channels)`; may be empty.
    pub pixels: ArrayView3<'a, u8>,
}

/// Recognizer output for one crop.
///
/// `face_boxes` are `[x1, y1, x2, y2]` in crop-local pixels. `identity`
/// is `(name, score)` and is only meaningful when a box was returned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(default)]
    pub face_boxes: Vec<[f64; 4]>,
    #[serde(default)]
    pub identity: Option<(String, f64)>,
}

impl Recognition {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn face(face_box: [f64; 4], name: impl Into<String>, score: f64) -> Self {
        Self {
            face_boxes: vec![face_box],
            identity: Some((name.into(), score)),
        }
    }
}

/// Domain interface for the external face recognition engine.
///
/// Implementations may hold inference sessions, hence `&mut self`.
pub trait FaceRecognizer: Send {
    fn infer(&mut self, crop: &FaceCrop<'_>) -> Result<Recognition, Box<dyn std::error::Error>>;
}
