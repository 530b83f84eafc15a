pub mod frame_processor;
pub mod infrastructure;
pub mod label_faces_use_case;
pub mod pipeline_executor;
pub mod pipeline_logger;
