use crate::recognition::domain::face_recognizer::{FaceCrop, FaceRecognizer, Recognition};
use crate::shared::constants::{NO_FACE_NAME, UNKNOWN_NAME};
use crate::shared::detection::{Detection, TrackId};
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox2D, PixelRect};

/// Crops each detection's body region, runs the recognizer on it and
/// writes the result into the detection's face sub-record.
///
/// Every detection with a non-empty crop reaches the recognizer. A
/// degenerate crop or a recognizer failure is normalised to the "no face"
/// sentinel; nothing is surfaced to the caller.
pub struct RegionExtractor {
    recognizer: Box<dyn FaceRecognizer>,
}

impl RegionExtractor {
    pub fn new(recognizer: Box<dyn FaceRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn extract(&mut self, frame: &Frame, detections: &mut [Detection]) {
        for detection in detections.iter_mut() {
            let rect = PixelRect::from_bbox(&detection.bbox, frame.width(), frame.height());
            let recognition = if rect.is_degenerate() {
                Recognition::none()
            } else {
                self.recognize(frame, &detection.id, &rect)
            };
            annotate(detection, &rect, recognition);
        }
    }

    fn recognize(&mut self, frame: &Frame, track_id: &TrackId, rect: &PixelRect) -> Recognition {
        let crop = FaceCrop {
            frame_index: frame.index(),
            track_id,
            pixels: frame.crop(rect),
        };
        match self.recognizer.infer(&crop) {
            Ok(recognition) => recognition,
            Err(e) => {
                log::warn!(
                    "Frame {}: recognizer failed for track {track_id}: {e}",
                    frame.index()
                );
                Recognition::none()
            }
        }
    }
}

/// One body region holds at most one face: only the first box is used.
fn annotate(detection: &mut Detection, rect: &PixelRect, recognition: Recognition) {
    let face = &mut detection.face;
    match recognition.face_boxes.first() {
        Some(&[bx1, by1, bx2, by2]) => {
            face.bbox = BoundingBox2D::new(
                rect.x1 as f64 + ((bx1 + bx2) / 2.0).floor(),
                rect.y1 as f64 + ((by1 + by2) / 2.0).floor(),
                bx2 - bx1,
                by2 - by1,
            );
            let (name, score) = recognition
                .identity
                .unwrap_or_else(|| (UNKNOWN_NAME.to_string(), 0.0));
            face.name = name;
            face.score = score;
            face.is_detected = true;
        }
        None => {
            face.name = NO_FACE_NAME.to_string();
            face.score = 0.0;
            face.is_detected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// (frame_index, track_id, crop shape) for every call.
    type Calls = Arc<Mutex<Vec<(usize, String, Vec<usize>)>>>;

    struct StubRecognizer {
        responses: VecDeque<Result<Recognition, String>>,
        calls: Calls,
    }

    impl StubRecognizer {
        fn new(responses: Vec<Result<Recognition, String>>) -> (Self, Calls) {
            let calls: Calls = Arc::new(Mutex::new(Vec::new()));
            let stub = Self {
                responses: responses.into(),
                calls: calls.clone(),
            };
            (stub, calls)
        }
    }

    impl FaceRecognizer for StubRecognizer {
        fn infer(
            &mut self,
            crop: &FaceCrop<'_>,
        ) -> Result<Recognition, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push((
                crop.frame_index,
                crop.track_id.to_string(),
                crop.pixels.shape().to_vec(),
            ));
            match self.responses.pop_front() {
                Some(Ok(r)) => Ok(r),
                Some(Err(e)) => Err(e.into()),
                None => Ok(Recognition::none()),
            }
        }
    }

    fn extractor(responses: Vec<Result<Recognition, String>>) -> (RegionExtractor, Calls) {
        let (stub, calls) = StubRecognizer::new(responses);
        (RegionExtractor::new(Box::new(stub)), calls)
    }

    fn frame() -> Frame {
        Frame::blank(640, 480, 3)
    }

    fn detection(id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Detection {
        Detection::new(id, BoundingBox2D::new(cx, cy, w, h))
    }

    #[test]
    fn test_face_geometry_is_written_in_frame_coordinates() {
        // Body rect: x 80..120, y 50..110
        let (mut ex, _) = extractor(
            vec![Ok(Recognition::face([10.0, 20.0, 30.0, 44.0], "Alice", 0.9))],
        );
        let mut detections = vec![detection(7, 100.0, 80.0, 40.0, 60.0)];

        ex.extract(&frame(), &mut detections);

        let face = &detections[0].face;
        assert_relative_eq!(face.bbox.center.x, 100.0);
        assert_relative_eq!(face.bbox.center.y, 82.0);
        assert_relative_eq!(face.bbox.size.x, 20.0);
        assert_relative_eq!(face.bbox.size.y, 24.0);
        assert_eq!(face.name, "Alice");
        assert_relative_eq!(face.score, 0.9);
        assert!(face.is_detected);
    }

    #[test]
    fn test_face_center_floors_half_pixels() {
        let (mut ex, _) = extractor(
            vec![Ok(Recognition::face([1.0, 2.0, 4.0, 5.0], "Bob", 0.5))],
        );
        let mut detections = vec![detection(1, 100.0, 100.0, 40.0, 40.0)];

        ex.extract(&frame(), &mut detections);

        // rect origin (80, 80); (1+4)/2 = 2.5 -> 2, (2+5)/2 = 3.5 -> 3
        assert_relative_eq!(detections[0].face.bbox.center.x, 82.0);
        assert_relative_eq!(detections[0].face.bbox.center.y, 83.0);
    }

    #[test]
    fn test_only_first_face_is_used() {
        let recognition = Recognition {
            face_boxes: vec![[0.0, 0.0, 10.0, 10.0], [20.0, 20.0, 40.0, 40.0]],
            identity: Some(("Alice".into(), 0.8)),
        };
        let (mut ex, _) = extractor(vec![Ok(recognition)]);
        let mut detections = vec![detection(1, 100.0, 100.0, 80.0, 80.0)];

        ex.extract(&frame(), &mut detections);

        assert_relative_eq!(detections[0].face.bbox.size.x, 10.0);
        assert_relative_eq!(detections[0].face.bbox.center.x, 65.0);
    }

    #[test]
    fn test_unknown_name_is_copied_verbatim() {
        let (mut ex, _) = extractor(
            vec![Ok(Recognition::face([0.0, 0.0, 8.0, 8.0], "unknown", 0.1))],
        );
        let mut detections = vec![detection(1, 100.0, 100.0, 40.0, 40.0)];

        ex.extract(&frame(), &mut detections);

        assert_eq!(detections[0].face.name, "unknown");
        assert_relative_eq!(detections[0].face.score, 0.1);
        assert!(detections[0].face.is_detected);
    }

    #[test]
    fn test_box_without_identity_reports_unknown() {
        let recognition = Recognition {
            face_boxes: vec![[0.0, 0.0, 8.0, 8.0]],
            identity: None,
        };
        let (mut ex, _) = extractor(vec![Ok(recognition)]);
        let mut detections = vec![detection(1, 100.0, 100.0, 40.0, 40.0)];

        ex.extract(&frame(), &mut detections);

        assert_eq!(detections[0].face.name, UNKNOWN_NAME);
        assert!(detections[0].face.is_detected);
    }

    #[test]
    fn test_no_face_marks_sentinel_and_keeps_geometry() {
        let (mut ex, _) = extractor(vec![Ok(Recognition::none())]);
        let mut d = detection(1, 100.0, 100.0, 40.0, 40.0);
        d.face.bbox = BoundingBox2D::new(5.0, 5.0, 2.0, 2.0);
        d.face.score = 0.7;
        d.face.is_detected = true;
        let mut detections = vec![d];

        ex.extract(&frame(), &mut detections);

        let face = &detections[0].face;
        assert_eq!(face.name, NO_FACE_NAME);
        assert!(!face.is_detected);
        assert_relative_eq!(face.score, 0.0);
        assert_eq!(face.bbox, BoundingBox2D::new(5.0, 5.0, 2.0, 2.0));
    }

    #[test]
    fn test_degenerate_region_skips_recognizer() {
        let (mut ex, calls) = extractor(
            vec![Ok(Recognition::face([0.0, 0.0, 8.0, 8.0], "Alice", 0.9))],
        );
        let mut detections = vec![detection(1, 5000.0, 5000.0, 40.0, 40.0)];

        ex.extract(&frame(), &mut detections);

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(detections[0].face.name, NO_FACE_NAME);
        assert!(!detections[0].face.is_detected);
    }

    #[test]
    fn test_recognizer_error_becomes_no_face() {
        let (mut ex, calls) = extractor(
            vec![
                Err("session crashed".into()),
                Ok(Recognition::face([0.0, 0.0, 8.0, 8.0], "Bob", 0.6)),
            ],
        );
        let mut detections = vec![
            detection(1, 100.0, 100.0, 40.0, 40.0),
            detection(2, 300.0, 100.0, 40.0, 40.0),
        ];

        ex.extract(&frame(), &mut detections);

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(detections[0].face.name, NO_FACE_NAME);
        assert_eq!(detections[1].face.name, "Bob");
    }

    #[test]
    fn test_every_detection_in_a_crowded_frame_is_recognized() {
        let faces = (0..8)
            .map(|i| Ok(Recognition::face([0.0, 0.0, 8.0, 8.0], format!("p{i}"), 0.9)))
            .collect();
        let (mut ex, calls) = extractor(faces);
        let mut detections: Vec<Detection> = (0..8)
            .map(|i| detection(i, 40.0 + 70.0 * i as f64, 100.0, 40.0, 40.0))
            .collect();

        ex.extract(&frame(), &mut detections);

        assert_eq!(calls.lock().unwrap().len(), 8);
        for (i, d) in detections.iter().enumerate() {
            assert_eq!(d.face.name, format!("p{i}"));
            assert!(d.face.is_detected);
        }
    }

    #[test]
    fn test_crop_carries_provenance_and_clamped_shape() {
        let (mut ex, calls) = extractor(vec![]);
        // Straddles the left edge: x -10..30 -> 0..30, y 80..120
        let mut detections = vec![detection(9, 10.0, 100.0, 40.0, 40.0)];

        ex.extract(&frame(), &mut detections);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (3, "9".to_string(), vec![40, 30, 3]));
    }

    #[test]
    fn test_batch_shape_and_body_fields_are_preserved() {
        let (mut ex, _) = extractor(
            vec![
                Ok(Recognition::face([0.0, 0.0, 8.0, 8.0], "Alice", 0.9)),
                Ok(Recognition::none()),
            ],
        );
        let mut first = detection(4, 100.0, 100.0, 40.0, 40.0);
        first.class_name = "person".into();
        first.score = 0.77;
        let original = vec![first, detection(2, 300.0, 100.0, 40.0, 40.0)];
        let mut detections = original.clone();

        ex.extract(&frame(), &mut detections);

        assert_eq!(detections.len(), original.len());
        for (after, before) in detections.iter().zip(&original) {
            assert_eq!(after.id, before.id);
            assert_eq!(after.class_name, before.class_name);
            assert_relative_eq!(after.score, before.score);
            assert_eq!(after.bbox, before.bbox);
        }
    }
}
