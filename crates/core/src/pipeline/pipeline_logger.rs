use std::collections::BTreeMap;
use std::time::Instant;

use crate::shared::detection::TrackId;

/// Observer for labelling-pipeline events.
///
/// Keeps the frame loop free of any particular output mechanism; the CLI
/// reports through the `log` crate, tests use the null logger.
pub trait PipelineLogger: Send {
    /// `total` is 0 when the number of pairs is not known up front.
    fn progress(&mut self, processed: usize, total: usize);

    /// How long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A track's cache entry became a real name.
    fn confirmed(&mut self, track_id: &TrackId, name: &str);

    /// Tracks forgotten because they were missing from the latest batch.
    fn pruned(&mut self, track_ids: &[TrackId]);

    /// Pending pairs discarded under best-effort intake.
    fn dropped(&mut self, count: usize);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _processed: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn confirmed(&mut self, _track_id: &TrackId, _name: &str) {}
    fn pruned(&mut self, _track_ids: &[TrackId]) {}
    fn dropped(&mut self, _count: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// Running totals for one named stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTiming {
    pub count: usize,
    pub total_ms: f64,
    pub worst_ms: f64,
}

impl StageTiming {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.worst_ms = self.worst_ms.max(duration_ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Identity and intake events seen over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionCounts {
    pub frames: usize,
    pub confirmed: usize,
    pub forgotten: usize,
    pub dropped: usize,
}

/// Reports through `log`. Progress lines are throttled to one every
/// `every_frames` frames; stage timings and identity events are folded
/// into totals for the closing summary.
pub struct LogPipelineLogger {
    every_frames: usize,
    stages: BTreeMap<String, StageTiming>,
    counts: SessionCounts,
    started: Instant,
}

impl LogPipelineLogger {
    pub fn new(every_frames: usize) -> Self {
        Self {
            every_frames: every_frames.max(1),
            stages: BTreeMap::new(),
            counts: SessionCounts::default(),
            started: Instant::now(),
        }
    }

    pub fn counts(&self) -> SessionCounts {
        self.counts
    }

    pub fn stage(&self, name: &str) -> Option<StageTiming> {
        self.stages.get(name).copied()
    }

    /// `None` until at least one frame or timing was reported.
    pub fn summary_string(&self) -> Option<String> {
        if self.counts.frames == 0 && self.stages.is_empty() {
            return None;
        }

        let secs = self.started.elapsed().as_secs_f64();
        let mut out = format!(
            "Labelled {} frames in {secs:.1}s\n",
            self.counts.frames
        );
        for (name, t) in &self.stages {
            out.push_str(&format!(
                "  {name:<10} mean {:>7.2}ms  worst {:>7.2}ms  over {} calls\n",
                t.mean_ms(),
                t.worst_ms,
                t.count
            ));
        }
        out.push_str(&format!(
            "  confirmed {}  forgotten {}  dropped {}",
            self.counts.confirmed, self.counts.forgotten, self.counts.dropped
        ));
        if self.counts.frames > 0 && secs > 0.0 {
            out.push_str(&format!(
                "\n  {:.1} frames/s",
                self.counts.frames as f64 / secs
            ));
        }
        Some(out)
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, processed: usize, total: usize) {
        self.counts.frames = processed;
        let due = processed % self.every_frames == 0 || processed == total;
        match (due, total) {
            (false, _) => {}
            (true, 0) => log::info!("Labelled {processed} frames"),
            (true, _) => log::info!(
                "Labelled {processed}/{total} frames ({:.0}%)",
                processed as f64 * 100.0 / total as f64
            ),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        match self.stages.get_mut(stage) {
            Some(t) => t.record(duration_ms),
            None => {
                let mut t = StageTiming::default();
                t.record(duration_ms);
                self.stages.insert(stage.to_owned(), t);
            }
        }
    }

    fn confirmed(&mut self, track_id: &TrackId, name: &str) {
        self.counts.confirmed += 1;
        log::info!("Track {track_id} identified as {name}");
    }

    fn pruned(&mut self, track_ids: &[TrackId]) {
        if track_ids.is_empty() {
            return;
        }
        self.counts.forgotten += track_ids.len();
        let ids: Vec<&str> = track_ids.iter().map(TrackId::as_str).collect();
        log::debug!("Forgot tracks: {}", ids.join(", "));
    }

    fn dropped(&mut self, count: usize) {
        self.counts.dropped += count;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
