use std::io::Write;

use crate::shared::detection::DetectionBatch;
use crate::transport::domain::detection_publisher::DetectionPublisher;

/// Writes each batch as one JSON line, flushing after every batch so
/// downstream readers see frames as soon as they are processed.
pub struct JsonLinesPublisher<W: Write + Send> {
    writer: W,
    published: usize,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            published: 0,
        }
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DetectionPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, batch: &DetectionBatch) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.writer, batch)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.published += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::detection::Detection;
    use crate::shared::geometry::BoundingBox2D;

    fn batch(stamp: f64, ids: &[u32]) -> DetectionBatch {
        let detections = ids
            .iter()
            .map(|&id| {
                let mut d = Detection::new(id, BoundingBox2D::new(10.0, 10.0, 4.0, 4.0));
                d.face.name = format!("person{id}");
                d
            })
            .collect();
        DetectionBatch::new(stamp, detections)
    }

    #[test]
    fn test_writes_one_line_per_batch() {
        let mut publisher = JsonLinesPublisher::new(Vec::new());
        publisher.publish(&batch(0.0, &[1, 2])).unwrap();
        publisher.publish(&batch(0.1, &[])).unwrap();
        assert_eq!(publisher.published(), 2);

        let text = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: DetectionBatch = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, batch(0.0, &[1, 2]));
        let second: DetectionBatch = serde_json::from_str(lines[1]).unwrap();
        assert!(second.detections.is_empty());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut publisher = JsonLinesPublisher::new(FailingWriter);
        assert!(publisher.publish(&batch(0.0, &[1])).is_err());
        assert_eq!(publisher.published(), 0);
    }
}
