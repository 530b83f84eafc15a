use crate::shared::node_config::Device;

/// Reported when a face was located but not matched with confidence.
pub const UNKNOWN_NAME: &str = "unknown";
/// Reported when no face was located in the detection's region.
pub const NO_FACE_NAME: &str = "no face";

pub const DEFAULT_MODEL: &str = "ir_50";
pub const DEFAULT_DEVICE: Device = Device::Cuda(0);
pub const DEFAULT_OPTION: i64 = 1;
pub const DEFAULT_THRESH: f64 = 0.2;
pub const DEFAULT_MAX_OBJ: usize = 6;
pub const DEFAULT_DATASET: &str = "face_dataset/test";
pub const DEFAULT_VIDEO: &str = "0";

/// Pending synchronised pairs held before intake blocks or drops.
pub const DEFAULT_QUEUE_SIZE: usize = 10;

/// True for the reserved names that carry no identity evidence.
pub fn is_sentinel(name: &str) -> bool {
    name == UNKNOWN_NAME || name == NO_FACE_NAME
}
