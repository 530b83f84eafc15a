use std::time::Instant;

use crate::identity::domain::identity_stabilizer::IdentityStabilizer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::region_extractor::RegionExtractor;
use crate::shared::frame::FramePair;
use crate::transport::domain::detection_publisher::DetectionPublisher;

/// Runs one synchronised pair through the node, start to finish:
/// recognise regions, stabilise names, publish, then forget absent tracks.
pub struct FrameProcessor {
    extractor: RegionExtractor,
    stabilizer: IdentityStabilizer,
    publisher: Box<dyn DetectionPublisher>,
}

impl FrameProcessor {
    pub fn new(
        extractor: RegionExtractor,
        stabilizer: IdentityStabilizer,
        publisher: Box<dyn DetectionPublisher>,
    ) -> Self {
        Self {
            extractor,
            stabilizer,
            publisher,
        }
    }

    pub fn stabilizer(&self) -> &IdentityStabilizer {
        &self.stabilizer
    }

    /// Only a publish failure is surfaced; recognition problems have
    /// already been folded into sentinel names.
    pub fn process(
        &mut self,
        pair: FramePair,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let FramePair { frame, mut batch } = pair;

        let start = Instant::now();
        self.extractor.extract(&frame, &mut batch.detections);
        logger.timing("recognize", elapsed_ms(start));

        let start = Instant::now();
        let confirmation = self.stabilizer.confirm(&mut batch.detections);
        logger.timing("stabilize", elapsed_ms(start));
        for (track_id, name) in &confirmation.confirmed {
            logger.confirmed(track_id, name);
        }
        log::debug!(
            "Frame {}: names {:?}",
            frame.index(),
            self.stabilizer.cache().entries()
        );

        let start = Instant::now();
        self.publisher.publish(&batch)?;
        logger.timing("publish", elapsed_ms(start));

        let pruned = self.stabilizer.prune(&confirmation.seen);
        logger.pruned(&pruned);
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
