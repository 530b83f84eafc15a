use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_DATASET, DEFAULT_DEVICE, DEFAULT_MAX_OBJ, DEFAULT_MODEL, DEFAULT_OPTION,
    DEFAULT_QUEUE_SIZE, DEFAULT_THRESH, DEFAULT_VIDEO,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid device '{0}': expected 'cpu', 'cuda' or 'cuda:N'")]
    InvalidDevice(String),
    #[error("invalid image reliability '{0}': expected 'best_effort' or 'reliable'")]
    InvalidReliability(String),
    #[error("{0}")]
    Invalid(String),
}

/// Compute device handed to the recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    Cpu,
    Cuda(u32),
}

impl FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|n| n.parse().ok())
                .map(Device::Cuda)
                .ok_or_else(|| ConfigError::InvalidDevice(s.to_string())),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(n) => write!(f, "cuda:{n}"),
        }
    }
}

/// Delivery policy for incoming image/detection pairs.
///
/// `BestEffort` keeps only the newest pending pair when processing falls
/// behind; `Reliable` makes intake wait for the processing loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    BestEffort,
    Reliable,
}

impl FromStr for Reliability {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Reliability::BestEffort),
            "reliable" => Ok(Reliability::Reliable),
            _ => Err(ConfigError::InvalidReliability(s.to_string())),
        }
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reliability::BestEffort => write!(f, "best_effort"),
            Reliability::Reliable => write!(f, "reliable"),
        }
    }
}

/// Node parameters. Missing fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Recognition backbone weights identifier.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_device")]
    pub device: Device,
    /// Recognizer-specific mode switch, passed through untouched.
    #[serde(default = "default_option")]
    pub option: i64,
    /// Match-confidence threshold (0.0-1.0); weaker matches report "unknown".
    #[serde(default = "default_thresh")]
    pub thresh: f64,
    /// Maximum detections per frame sent to the recognizer.
    #[serde(default = "default_max_obj")]
    pub max_obj: usize,
    /// Gallery of enrolled faces.
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    #[serde(default = "default_video")]
    pub video: String,
    #[serde(default = "default_image_reliability")]
    pub image_reliability: Reliability,
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_device() -> Device {
    DEFAULT_DEVICE
}

fn default_option() -> i64 {
    DEFAULT_OPTION
}

fn default_thresh() -> f64 {
    DEFAULT_THRESH
}

fn default_max_obj() -> usize {
    DEFAULT_MAX_OBJ
}

fn default_dataset() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET)
}

fn default_video() -> String {
    DEFAULT_VIDEO.to_string()
}

fn default_image_reliability() -> Reliability {
    Reliability::BestEffort
}

fn default_queue_size() -> usize {
    DEFAULT_QUEUE_SIZE
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            device: default_device(),
            option: default_option(),
            thresh: default_thresh(),
            max_obj: default_max_obj(),
            dataset: default_dataset(),
            video: default_video(),
            image_reliability: default_image_reliability(),
            queue_size: default_queue_size(),
        }
    }
}

impl NodeConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file without validating it, for callers that
    /// still apply overrides before calling [`NodeConfig::validate`].
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: NodeConfig = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.thresh) {
            return Err(ConfigError::Invalid(format!(
                "thresh must be between 0.0 and 1.0, got {}",
                self.thresh
            )));
        }
        if self.max_obj == 0 {
            return Err(ConfigError::Invalid("max_obj must be at least 1".into()));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::Invalid("queue_size must be at least 1".into()));
        }
        Ok(())
    }
}
