use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::face_recognizer::Recognition;
use crate::recognition::infrastructure::scripted_face_recognizer::{
    RecognitionScript, ScriptedFaceRecognizer,
};
use crate::shared::detection::{Detection, DetectionBatch, TrackId};
use crate::shared::frame::{Frame, FramePair};
use crate::shared::node_config::NodeConfig;
use crate::transport::domain::frame_pair_source::FramePairSource;

/// Largest accepted frame edge, in pixels.
pub const MAX_FRAME_SIDE: u32 = 16_384;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode frame image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame image {path} is {actual_width}x{actual_height}, record says {width}x{height}")]
    SizeMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("frame {index} is {width}x{height}, larger than {max} pixels on a side", max = MAX_FRAME_SIDE)]
    Dimensions { index: usize, width: u32, height: u32 },
    #[error("frame image {path} has an unusable pixel layout: {source}")]
    Shape {
        path: PathBuf,
        #[source]
        source: ndarray::ShapeError,
    },
}

/// One synchronised pair as captured from a live session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    #[serde(default)]
    pub stamp: f64,
    #[serde(default)]
    pub frame_id: String,
    pub width: u32,
    pub height: u32,
    /// Frame image, relative to the log's directory. Absent means a black
    /// frame of the recorded size.
    #[serde(default)]
    pub image: Option<PathBuf>,
    pub detections: Vec<Detection>,
    /// What the recognizer answered for each track's crop in this frame.
    #[serde(default)]
    pub recognitions: HashMap<TrackId, Recognition>,
}

/// A recorded session: one JSON record per line, blank lines ignored.
#[derive(Clone, Debug, Default)]
pub struct ReplayLog {
    base_dir: PathBuf,
    records: Vec<ReplayRecord>,
}

impl ReplayLog {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path).map_err(|e| ReplayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&text, base_dir)
    }

    pub fn parse(text: &str, base_dir: PathBuf) -> Result<Self, ReplayError> {
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| ReplayError::Parse {
                    line: n + 1,
                    source: e,
                })
            })
            .collect::<Result<Vec<ReplayRecord>, _>>()?;
        Ok(Self { base_dir, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReplayRecord] {
        &self.records
    }

    /// Splits the log into the pair source and a recognizer answering from
    /// the recorded recognitions under `config`'s `thresh` and `max_obj`.
    /// Frame indices follow record order.
    pub fn into_parts(self, config: &NodeConfig) -> (ReplayFrameSource, ScriptedFaceRecognizer) {
        let mut script = RecognitionScript::new();
        let mut records = Vec::with_capacity(self.records.len());
        for (index, mut record) in self.records.into_iter().enumerate() {
            for (track_id, recognition) in record.recognitions.drain() {
                script.insert((index, track_id), recognition);
            }
            records.push(record);
        }
        (
            ReplayFrameSource {
                base_dir: self.base_dir,
                records,
            },
            ScriptedFaceRecognizer::new(script, config.thresh, config.max_obj),
        )
    }
}

/// Yields the recorded pairs in order, decoding frame images lazily.
pub struct ReplayFrameSource {
    base_dir: PathBuf,
    records: Vec<ReplayRecord>,
}

impl ReplayFrameSource {
    fn load_pair(&self, index: usize, record: ReplayRecord) -> Result<FramePair, ReplayError> {
        if record.width > MAX_FRAME_SIDE || record.height > MAX_FRAME_SIDE {
            return Err(ReplayError::Dimensions {
                index,
                width: record.width,
                height: record.height,
            });
        }
        let frame = match &record.image {
            Some(relative) => load_frame(
                &self.base_dir.join(relative),
                record.width,
                record.height,
                index,
            )?,
            None => Frame::blank(record.width, record.height, index),
        };
        let batch = DetectionBatch {
            stamp: record.stamp,
            frame_id: record.frame_id,
            detections: record.detections,
        };
        Ok(FramePair { frame, batch })
    }
}

impl FramePairSource for ReplayFrameSource {
    fn pairs(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FramePair, Box<dyn std::error::Error>>> + '_> {
        let records = std::mem::take(&mut self.records);
        Box::new(records.into_iter().enumerate().map(move |(index, record)| {
            self.load_pair(index, record)
                .map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })
        }))
    }

    fn close(&mut self) {
        self.records.clear();
    }
}

fn load_frame(path: &Path, width: u32, height: u32, index: usize) -> Result<Frame, ReplayError> {
    let rgb = image::open(path)
        .map_err(|e| ReplayError::Image {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8();
    let (actual_width, actual_height) = rgb.dimensions();
    if (actual_width, actual_height) != (width, height) {
        return Err(ReplayError::SizeMismatch {
            path: path.to_path_buf(),
            width,
            height,
            actual_width,
            actual_height,
        });
    }
    Frame::from_rgb(rgb.into_raw(), width, height, index).map_err(|e| ReplayError::Shape {
        path: path.to_path_buf(),
        source: e,
    })
}
