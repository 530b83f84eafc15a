pub mod json_lines_publisher;
pub mod replay_log;
