use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::identity::domain::identity_stabilizer::IdentityStabilizer;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::region_extractor::RegionExtractor;
use crate::shared::node_config::NodeConfig;
use crate::transport::domain::detection_publisher::DetectionPublisher;
use crate::transport::domain::frame_pair_source::FramePairSource;

use super::frame_processor::FrameProcessor;
use super::pipeline_executor::{PipelineConfig, PipelineExecutor, RunReport};
use super::pipeline_logger::PipelineLogger;

/// Orchestrates the face labelling node.
///
/// Wires the recognizer, a fresh identity stabilizer and the publisher
/// into a `FrameProcessor` and hands it to a `PipelineExecutor`. This is a
/// single-use struct: `execute` consumes the owned components, so calling
/// it twice will fail.
pub struct LabelFacesUseCase {
    source: Option<Box<dyn FramePairSource>>,
    recognizer: Option<Box<dyn FaceRecognizer>>,
    publisher: Option<Box<dyn DetectionPublisher>>,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
    config: NodeConfig,
    expected_pairs: usize,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl LabelFacesUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FramePairSource>,
        recognizer: Box<dyn FaceRecognizer>,
        publisher: Box<dyn DetectionPublisher>,
        executor: Box<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
        config: NodeConfig,
        expected_pairs: Option<usize>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            recognizer: Some(recognizer),
            publisher: Some(publisher),
            executor,
            logger,
            config,
            expected_pairs: expected_pairs.unwrap_or(0),
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(&mut self) -> Result<RunReport, Box<dyn std::error::Error>> {
        let source = self.source.take().ok_or("Pipeline already executed")?;
        let recognizer = self.recognizer.take().ok_or("Pipeline already executed")?;
        let publisher = self.publisher.take().ok_or("Pipeline already executed")?;

        self.logger.info(&format!(
            "Start face recognition: model={} device={} option={} thresh={} max_obj={} dataset={} video={}",
            self.config.model,
            self.config.device,
            self.config.option,
            self.config.thresh,
            self.config.max_obj,
            self.config.dataset.display(),
            self.config.video,
        ));

        let mut processor = FrameProcessor::new(
            RegionExtractor::new(recognizer),
            IdentityStabilizer::new(),
            publisher,
        );
        let pipeline_config = PipelineConfig {
            queue_size: self.config.queue_size,
            reliability: self.config.image_reliability,
            expected_pairs: self.expected_pairs,
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        let report = self.executor.execute(
            source,
            &mut processor,
            self.logger.as_mut(),
            pipeline_config,
        )?;
        self.logger.summary();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::face_recognizer::{FaceCrop, Recognition};
    use crate::shared::detection::{Detection, DetectionBatch, TrackId};
    use crate::shared::frame::{Frame, FramePair};
    use crate::shared::geometry::BoundingBox2D;
    use crate::shared::node_config::Reliability;
    use std::sync::Mutex;

    struct StubSource {
        pairs: Vec<FramePair>,
    }

    impl FramePairSource for StubSource {
        fn pairs(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<FramePair, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.pairs.drain(..).map(Ok))
        }

        fn close(&mut self) {}
    }

    struct AlwaysAlice;

    impl FaceRecognizer for AlwaysAlice {
        fn infer(
            &mut self,
            _crop: &FaceCrop<'_>,
        ) -> Result<Recognition, Box<dyn std::error::Error>> {
            Ok(Recognition::face([0.0, 0.0, 4.0, 4.0], "Alice", 0.9))
        }
    }

    struct CollectingPublisher {
        published: Arc<Mutex<Vec<DetectionBatch>>>,
    }

    impl DetectionPublisher for CollectingPublisher {
        fn publish(&mut self, batch: &DetectionBatch) -> Result<(), Box<dyn std::error::Error>> {
            self.published.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    /// Records which events reached the logger.
    #[derive(Default)]
    struct EventLogger {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for EventLogger {
        fn progress(&mut self, processed: usize, total: usize) {
            self.events.lock().unwrap().push(format!("progress {processed}/{total}"));
        }
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn confirmed(&mut self, track_id: &TrackId, name: &str) {
            self.events.lock().unwrap().push(format!("confirmed {track_id} {name}"));
        }
        fn pruned(&mut self, track_ids: &[TrackId]) {
            for id in track_ids {
                self.events.lock().unwrap().push(format!("pruned {id}"));
            }
        }
        fn dropped(&mut self, _count: usize) {}
        fn info(&mut self, _message: &str) {}
    }

    fn pair(index: usize, tracks: &[u32]) -> FramePair {
        let detections = tracks
            .iter()
            .map(|&t| Detection::new(t, BoundingBox2D::new(30.0 * (t + 1) as f64, 50.0, 20.0, 40.0)))
            .collect();
        FramePair {
            frame: Frame::blank(320, 240, index),
            batch: DetectionBatch::new(index as f64, detections),
        }
    }

    fn reliable(max_obj: usize) -> NodeConfig {
        NodeConfig {
            max_obj,
            image_reliability: Reliability::Reliable,
            ..NodeConfig::default()
        }
    }

    fn use_case(
        pairs: Vec<FramePair>,
        config: NodeConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> (LabelFacesUseCase, Arc<Mutex<Vec<DetectionBatch>>>) {
        let published = Arc::new(Mutex::new(Vec::new()));
        let expected = pairs.len();
        let uc = LabelFacesUseCase::new(
            Box::new(StubSource { pairs }),
            Box::new(AlwaysAlice),
            Box::new(CollectingPublisher {
                published: published.clone(),
            }),
            Box::new(ThreadedPipelineExecutor::new()),
            logger,
            config,
            Some(expected),
            None,
            None,
        );
        (uc, published)
    }

    #[test]
    fn test_execute_labels_every_pair() {
        let (mut uc, published) = use_case(
            vec![pair(0, &[1, 2]), pair(1, &[2])],
            reliable(6),
            Box::new(NullPipelineLogger),
        );

        let report = uc.execute().unwrap();

        assert_eq!(report.processed, 2);
        let published = published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert!(published
            .iter()
            .flat_map(|b| &b.detections)
            .all(|d| d.face.name == "Alice" && d.face.is_detected));
    }

    #[test]
    fn test_every_detection_is_labelled_beyond_max_obj() {
        let (mut uc, published) = use_case(
            vec![pair(0, &[1, 2, 3])],
            reliable(2),
            Box::new(NullPipelineLogger),
        );

        uc.execute().unwrap();

        let published = published.lock().unwrap();
        let names: Vec<&str> = published[0]
            .detections
            .iter()
            .map(|d| d.face.name.as_str())
            .collect();
        assert_eq!(names, ["Alice", "Alice", "Alice"]);
    }

    #[test]
    fn test_logger_sees_identity_events_in_order() {
        let logger = EventLogger::default();
        let events = logger.events.clone();
        let (mut uc, _) = use_case(
            vec![pair(0, &[1]), pair(1, &[2])],
            reliable(6),
            Box::new(logger),
        );

        uc.execute().unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "confirmed 1 Alice",
                "progress 1/2",
                "confirmed 2 Alice",
                "pruned 1",
                "progress 2/2",
            ]
        );
    }

    #[test]
    fn test_execute_twice_fails() {
        let (mut uc, _) = use_case(vec![], reliable(6), Box::new(NullPipelineLogger));
        uc.execute().unwrap();
        let err = uc.execute().unwrap_err();
        assert!(err.to_string().contains("Pipeline already executed"));
    }
}
