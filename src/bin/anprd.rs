//! anprd - plate recognition pipeline daemon
//!
//! This daemon:
//! 1. Connects to a single configured camera stream
//! 2. Detects plate regions on each frame
//! 3. Runs OCR on every Nth frame and normalizes the text
//! 4. Assigns stable track identities by IoU association
//! 5. Suppresses repeat sightings within the dedup TTL window
//! 6. Publishes one event per unique sighting with bounded retries

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anpr_pipeline::{
    config::PipelineConfig,
    dedup::Deduplicator,
    detect::StubPlateDetector,
    ingest::SyntheticCamera,
    normalize::TextNormalizer,
    ocr::StubOcrReader,
    pipeline::{PipelineOptions, PipelineOrchestrator},
    publish::{ConsoleSink, EventSink, MqttSink, MqttSinkConfig, ReliablePublisher, RetryPolicy},
    track::{GreedyIouTracker, IdentityTracker},
    view::LogView,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "ANPR_CONFIG")]
    config: Option<PathBuf>,
    /// Event sink: console or mqtt.
    #[arg(long, default_value = "console")]
    sink: String,
    /// Camera stream URL override.
    #[arg(long, env = "ANPR_CAMERA_URL")]
    camera_url: Option<String>,
    /// Stop after this many frames (unbounded by default).
    #[arg(long)]
    max_frames: Option<u64>,
    /// Simulated OCR text for the stub reader.
    #[arg(long, default_value = "ABC123")]
    stub_plate: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load()?,
    };
    if let Some(url) = &args.camera_url {
        cfg.camera.url = url.clone();
    }

    let camera = SyntheticCamera::new(&cfg.camera.camera_id, &cfg.camera.url, 640, 480);
    let detector = StubPlateDetector::new();
    let ocr = StubOcrReader::new(&args.stub_plate);
    let normalizer = TextNormalizer::new(cfg.plate_min_length);
    let tracker = IdentityTracker::new(Box::new(GreedyIouTracker::default()));
    let dedup = Deduplicator::new(cfg.dedup_ttl);

    let sink: Box<dyn EventSink> = match args.sink.as_str() {
        "console" => Box::new(ConsoleSink::new()),
        "mqtt" => Box::new(MqttSink::connect(MqttSinkConfig {
            broker_addr: cfg.publish.broker_addr.clone(),
            topic: cfg.publish.topic.clone(),
            client_id: cfg.publish.client_id.clone(),
        })?),
        other => {
            return Err(anyhow::anyhow!(
                "unknown sink {:?} (expected console or mqtt)",
                other
            ))
        }
    };
    let publisher = ReliablePublisher::new(
        sink,
        RetryPolicy {
            attempts: cfg.publish.attempts,
            base_delay: cfg.publish.base_delay,
            delivery_timeout: cfg.publish.delivery_timeout,
        },
    );

    let view = if cfg.debug_show {
        Some(Box::new(LogView) as Box<dyn anpr_pipeline::view::DebugView>)
    } else {
        None
    };

    let options = PipelineOptions {
        max_frames: args.max_frames,
        ..PipelineOptions::from_config(&cfg)
    };

    let mut pipeline = PipelineOrchestrator::new(
        Box::new(camera),
        Box::new(detector),
        Box::new(ocr),
        normalizer,
        tracker,
        dedup,
        publisher,
        view,
        options,
    );

    let stop = pipeline.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("stop requested");
        stop.store(true, Ordering::SeqCst);
    })?;

    log::info!(
        "anprd starting: camera={} url={} sink={}",
        cfg.camera.camera_id,
        cfg.camera.url,
        args.sink
    );
    pipeline.run()?;
    log::info!(
        "anprd done: frames={} events={}",
        pipeline.frames_processed(),
        pipeline.events_published()
    );
    Ok(())
}
