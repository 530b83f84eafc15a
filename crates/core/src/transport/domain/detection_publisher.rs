use crate::shared::detection::DetectionBatch;

/// Emits relabelled detection batches, one call per processed frame.
pub trait DetectionPublisher: Send {
    fn publish(&mut self, batch: &DetectionBatch) -> Result<(), Box<dyn std::error::Error>>;
}
