pub mod constants;
pub mod detection;
pub mod frame;
pub mod geometry;
pub mod node_config;
