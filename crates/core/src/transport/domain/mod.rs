pub mod detection_publisher;
pub mod frame_pair_source;
