use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::node_config::Reliability;
use crate::transport::domain::frame_pair_source::FramePairSource;

/// Configuration for a pipeline execution run.
pub struct PipelineConfig {
    /// Pending pairs held between intake and processing.
    pub queue_size: usize,
    pub reliability: Reliability,
    /// Pairs the source is expected to yield, 0 if unknown. Progress only.
    pub expected_pairs: usize,
    /// Called after each processed pair; returning `false` stops the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub dropped: usize,
}

/// Abstracts how pairs travel from the source into the frame processor.
///
/// Implementations must hand pairs to the processor one at a time, in
/// source order; only intake may overlap with processing.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn FramePairSource>,
        processor: &mut FrameProcessor,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<RunReport, Box<dyn std::error::Error>>;
}
