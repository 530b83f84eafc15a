use crate::shared::frame::FramePair;

/// Delivers synchronised (image, detection batch) pairs.
///
/// Pairing images with batches of approximately the same timestamp, and
/// ordering/deduplicating them, is the source's job; consumers process
/// pairs in the order they are yielded.
pub trait FramePairSource: Send {
    fn pairs(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FramePair, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
