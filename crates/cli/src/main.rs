use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facetag_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use facetag_core::pipeline::label_faces_use_case::LabelFacesUseCase;
use facetag_core::pipeline::pipeline_logger::LogPipelineLogger;
use facetag_core::shared::node_config::{Device, NodeConfig, Reliability};
use facetag_core::transport::domain::detection_publisher::DetectionPublisher;
use facetag_core::transport::infrastructure::json_lines_publisher::JsonLinesPublisher;
use facetag_core::transport::infrastructure::replay_log::ReplayLog;

/// Replays a recorded detection session through the face identity node.
#[derive(Parser)]
#[command(name = "facetag")]
struct Cli {
    /// Recorded session (JSON lines, one synchronised pair per line).
    input: PathBuf,

    /// Output file for relabelled batches (stdout if omitted).
    output: Option<PathBuf>,

    /// JSON file with node parameters; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recognition model weights identifier.
    #[arg(long)]
    model: Option<String>,

    /// Compute device: cpu, cuda or cuda:N.
    #[arg(long)]
    device: Option<Device>,

    /// Recognizer-specific option value.
    #[arg(long)]
    option: Option<i64>,

    /// Match-confidence threshold (0.0-1.0).
    #[arg(long)]
    thresh: Option<f64>,

    /// Maximum detections per frame sent to the recognizer.
    #[arg(long)]
    max_obj: Option<usize>,

    /// Enrolled face dataset directory.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Video source identifier.
    #[arg(long)]
    video: Option<String>,

    /// Intake policy: best_effort or reliable.
    #[arg(long)]
    image_reliability: Option<Reliability>,

    /// Pending pairs held between intake and processing.
    #[arg(long)]
    queue_size: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    log::info!("========================");
    log::info!("Start face recognition!");
    log::info!("========================");

    let replay = ReplayLog::load(&cli.input)?;
    let expected = replay.len();
    log::info!("Loaded {expected} recorded pairs from {}", cli.input.display());

    let (source, recognizer) = replay.into_parts(&config);
    let publisher = open_publisher(cli.output.as_deref())?;

    let mut use_case = LabelFacesUseCase::new(
        Box::new(source),
        Box::new(recognizer),
        publisher,
        Box::new(ThreadedPipelineExecutor::new()),
        Box::new(LogPipelineLogger::default()),
        config,
        Some(expected),
        None,
        None,
    );
    let report = use_case.execute()?;

    log::info!(
        "Published {} batches ({} dropped)",
        report.processed,
        report.dropped
    );
    if let Some(output) = &cli.output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<NodeConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::read(path)?,
        None => NodeConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(device) = cli.device {
        config.device = device;
    }
    if let Some(option) = cli.option {
        config.option = option;
    }
    if let Some(thresh) = cli.thresh {
        config.thresh = thresh;
    }
    if let Some(max_obj) = cli.max_obj {
        config.max_obj = max_obj;
    }
    if let Some(dataset) = &cli.dataset {
        config.dataset = dataset.clone();
    }
    if let Some(video) = &cli.video {
        config.video = video.clone();
    }
    if let Some(reliability) = cli.image_reliability {
        config.image_reliability = reliability;
    }
    if let Some(queue_size) = cli.queue_size {
        config.queue_size = queue_size;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(config) = &cli.config {
        if !config.exists() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    if cli.output.as_deref() == Some(cli.input.as_path()) {
        return Err("Output file must differ from the input file".into());
    }
    Ok(())
}

fn open_publisher(
    output: Option<&Path>,
) -> Result<Box<dyn DetectionPublisher>, Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Cannot create output {}: {e}", path.display()))?;
            Ok(Box::new(JsonLinesPublisher::new(BufWriter::new(file))))
        }
        None => Ok(Box::new(JsonLinesPublisher::new(io::stdout()))),
    }
}
