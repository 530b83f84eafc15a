use std::collections::HashMap;

use crate::recognition::domain::face_recognizer::{FaceCrop, FaceRecognizer, Recognition};
use crate::shared::constants::{is_sentinel, UNKNOWN_NAME};
use crate::shared::detection::TrackId;

/// Recorded recognitions keyed by `(frame index, track id)`.
pub type RecognitionScript = HashMap<(usize, TrackId), Recognition>;

/// Replays recognitions captured from a live session.
///
/// Applies the same limits a live recognizer is built with: at most
/// `max_obj` face boxes per crop, and matches weaker than `thresh`
/// downgraded to "unknown". Unscripted crops and empty crops yield no face.
pub struct ScriptedFaceRecognizer {
    script: RecognitionScript,
    thresh: f64,
    max_obj: usize,
}

impl ScriptedFaceRecognizer {
    pub fn new(script: RecognitionScript, thresh: f64, max_obj: usize) -> Self {
        Self {
            script,
            thresh,
            max_obj,
        }
    }
}

impl FaceRecognizer for ScriptedFaceRecognizer {
    fn infer(&mut self, crop: &FaceCrop<'_>) -> Result<Recognition, Box<dyn std::error::Error>> {
        if crop.pixels.is_empty() {
            return Ok(Recognition::none());
        }
        let key = (crop.frame_index, crop.track_id.clone());
        let Some(recorded) = self.script.get(&key) else {
            return Ok(Recognition::none());
        };

        let mut recognition = recorded.clone();
        recognition.face_boxes.truncate(self.max_obj);
        if recognition.face_boxes.is_empty() {
            return Ok(Recognition::none());
        }
        if let Some((name, score)) = recognition.identity.as_mut() {
            if !is_sentinel(name) && *score < self.thresh {
                *name = UNKNOWN_NAME.to_string();
            }
        }
        Ok(recognition)
    }
}
