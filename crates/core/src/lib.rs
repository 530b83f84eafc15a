//! Stable per-track face identities for tracked video detections.
//!
//! Each synchronised (image, detection batch) pair is cropped per
//! detection and run through a face recognizer (`recognition`); the noisy
//! per-frame names are then stabilised per track id (`identity`) before
//! the batch is published (`transport`). `pipeline` wires the stages.

pub mod identity;
pub mod pipeline;
pub mod recognition;
pub mod shared;
pub mod transport;
