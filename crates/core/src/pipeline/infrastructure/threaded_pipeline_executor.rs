use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor, RunReport};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::FramePair;
use crate::shared::node_config::Reliability;
use crate::transport::domain::frame_pair_source::FramePairSource;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type PairResult = Result<FramePair, SendError>;

/// Executes the node with a dedicated intake thread.
///
/// Layout: `source → [bounded queue] → main (recognise/stabilise/publish)`
///
/// Intake (decoding) overlaps with processing, but pairs are processed
/// strictly one after another on the calling thread.
pub struct ThreadedPipelineExecutor;

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        source: Box<dyn FramePairSource>,
        processor: &mut FrameProcessor,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<RunReport, Box<dyn std::error::Error>> {
        let (pair_tx, pair_rx) = crossbeam_channel::bounded::<PairResult>(config.queue_size.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));

        // Best effort needs its own receiver to evict the oldest pending pair.
        let evict_rx = match config.reliability {
            Reliability::BestEffort => Some(pair_rx.clone()),
            Reliability::Reliable => None,
        };
        let intake_handle = spawn_intake(
            source,
            pair_tx,
            evict_rx,
            config.cancelled.clone(),
            dropped.clone(),
        );

        let result = run_main_loop(pair_rx, processor, logger, &config, &dropped);
        if result.is_err() {
            config.cancelled.store(true, Ordering::Relaxed);
        }

        let joined = join_intake(intake_handle);
        let total_dropped = dropped.load(Ordering::Relaxed);
        let processed = result?;
        joined?;

        Ok(RunReport {
            processed,
            dropped: total_dropped,
        })
    }
}

fn spawn_intake(
    mut source: Box<dyn FramePairSource>,
    pair_tx: Sender<PairResult>,
    evict_rx: Option<Receiver<PairResult>>,
    cancelled: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
) -> std::thread::JoinHandle<Box<dyn FramePairSource>> {
    std::thread::spawn(move || {
        for pair_result in source.pairs() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = pair_result.map_err(|e| -> SendError { e.to_string().into() });
            let delivered = match &evict_rx {
                Some(rx) => send_latest(&pair_tx, rx, mapped, &dropped),
                None => pair_tx.send(mapped).is_ok(),
            };
            if !delivered {
                break;
            }
        }
        source.close();
        source
    })
}

/// Queues `item`, discarding the oldest pending pairs to make room.
fn send_latest(
    tx: &Sender<PairResult>,
    evict_rx: &Receiver<PairResult>,
    mut item: PairResult,
    dropped: &AtomicUsize,
) -> bool {
    loop {
        match tx.try_send(item) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(back)) => {
                item = back;
                if evict_rx.try_recv().is_ok() {
                    dropped.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Intake queue full, dropped oldest pending pair");
                }
            }
        }
    }
}

fn run_main_loop(
    pair_rx: Receiver<PairResult>,
    processor: &mut FrameProcessor,
    logger: &mut dyn PipelineLogger,
    config: &PipelineConfig,
    dropped: &AtomicUsize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut processed: usize = 0;
    let mut reported_drops: usize = 0;

    for pair_result in pair_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }

        let pair = pair_result.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() })?;
        processor.process(pair, logger)?;
        processed += 1;

        let drops = dropped.load(Ordering::Relaxed);
        if drops > reported_drops {
            logger.dropped(drops - reported_drops);
            reported_drops = drops;
        }
        logger.progress(processed, config.expected_pairs);

        if let Some(ref callback) = config.on_progress {
            if !callback(processed, config.expected_pairs) {
                return Err("Cancelled".into());
            }
        }
    }

    Ok(processed)
}

fn join_intake(
    handle: std::thread::JoinHandle<Box<dyn FramePairSource>>,
) -> Result<(), Box<dyn std::error::Error>> {
    handle
        .join()
        .map(|_| ())
        .map_err(|_| "Intake thread panicked".into())
}
