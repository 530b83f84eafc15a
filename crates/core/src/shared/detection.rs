use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::geometry::BoundingBox2D;

/// Identifier an upstream tracker assigns to one object across frames.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u32> for TrackId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Face annotation attached to a detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceBox {
    pub bbox: BoundingBox2D,
    pub name: String,
    pub score: f64,
    pub is_detected: bool,
}

/// One tracked object in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: TrackId,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub score: f64,
    pub bbox: BoundingBox2D,
    #[serde(default)]
    pub face: FaceBox,
}

impl Detection {
    pub fn new(id: impl Into<TrackId>, bbox: BoundingBox2D) -> Self {
        Self {
            id: id.into(),
            class_name: String::new(),
            score: 0.0,
            bbox,
            face: FaceBox::default(),
        }
    }
}

/// All detections reported for a single frame, in tracker order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    #[serde(default)]
    pub stamp: f64,
    #[serde(default)]
    pub frame_id: String,
    pub detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn new(stamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            stamp,
            frame_id: String::new(),
            detections,
        }
    }
}
