//! The per-camera pipeline orchestrator.
//!
//! One orchestrator owns one camera stream and the full processing chain
//! behind it:
//!
//!   read -> detect -> OCR (every Nth frame) -> normalize -> track ->
//!   deduplicate -> publish -> pace
//!
//! Lifecycle is linear: INIT -> CONNECTED -> RUNNING -> STOPPING -> STOPPED.
//! An orchestrator is single-use; a stopped instance cannot be restarted.
//! Error severities:
//!
//! - connect failure: fatal, the run ends before the loop starts
//! - read failure / no frame: transient, retried after a short delay
//! - detect or OCR failure: the affected frame/observation is dropped
//! - tracker precondition failure: fatal, corrupted frame metadata
//! - publish exhaustion: the event is lost and logged, the loop continues

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::dedup::Deduplicator;
use crate::detect::PlateDetector;
use crate::event::DetectionEvent;
use crate::frame::{Frame, NormalizedPlate, Observation};
use crate::ingest::CameraStream;
use crate::normalize::TextNormalizer;
use crate::ocr::OcrReader;
use crate::publish::ReliablePublisher;
use crate::track::IdentityTracker;
use crate::view::{DebugView, ViewSignal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Connected,
    Running,
    Stopping,
    Stopped,
}

/// Loop tuning knobs, split out of [`PipelineConfig`] so tests can drive the
/// orchestrator without a full configuration.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// OCR runs on frames where `frame_idx % ocr_interval == 0`. Clamped to
    /// at least 1 by the orchestrator.
    pub ocr_interval: u64,
    /// Observations below this OCR confidence are dropped.
    pub ocr_min_confidence: f32,
    /// Per-cycle time budget; `None` disables pacing.
    pub target_frame_interval: Option<Duration>,
    /// Delay before retrying after a failed or empty read.
    pub read_retry_delay: Duration,
    /// How often expired dedup entries are swept.
    pub dedup_sweep_interval: Duration,
    /// Stop after this many completed cycles. For tests and bounded runs.
    pub max_frames: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            ocr_interval: 5,
            ocr_min_confidence: 0.4,
            target_frame_interval: Some(Duration::from_millis(100)),
            read_retry_delay: Duration::from_millis(500),
            dedup_sweep_interval: Duration::from_secs(10),
            max_frames: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            ocr_interval: config.ocr.interval,
            ocr_min_confidence: config.ocr.min_confidence,
            target_frame_interval: config.target_frame_interval(),
            ..Self::default()
        }
    }
}

/// Owns one camera and the full chain behind it. Built once, run once.
pub struct PipelineOrchestrator {
    camera: Box<dyn CameraStream>,
    detector: Box<dyn PlateDetector>,
    ocr: Box<dyn OcrReader>,
    normalizer: TextNormalizer,
    tracker: IdentityTracker,
    dedup: Deduplicator,
    publisher: ReliablePublisher,
    view: Option<Box<dyn DebugView>>,
    options: PipelineOptions,

    state: PipelineState,
    stop: Arc<AtomicBool>,
    frame_idx: u64,
    events_published: u64,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        camera: Box<dyn CameraStream>,
        detector: Box<dyn PlateDetector>,
        ocr: Box<dyn OcrReader>,
        normalizer: TextNormalizer,
        tracker: IdentityTracker,
        dedup: Deduplicator,
        publisher: ReliablePublisher,
        view: Option<Box<dyn DebugView>>,
        options: PipelineOptions,
    ) -> Self {
        let options = PipelineOptions {
            ocr_interval: options.ocr_interval.max(1),
            ..options
        };
        Self {
            camera,
            detector,
            ocr,
            normalizer,
            tracker,
            dedup,
            publisher,
            view,
            options,
            state: PipelineState::Init,
            stop: Arc::new(AtomicBool::new(false)),
            frame_idx: 0,
            events_published: 0,
        }
    }

    /// Handle for requesting a stop from another thread (signal handlers).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_idx
    }

    pub fn events_published(&self) -> u64 {
        self.events_published
    }

    /// Runs the pipeline to completion (stop request, frame budget, or fatal
    /// error). Shutdown always executes, even on the fatal paths: the camera
    /// is disconnected, the view closed and the publisher flushed before the
    /// state reaches STOPPED.
    pub fn run(&mut self) -> Result<()> {
        if self.state != PipelineState::Init {
            return Err(anyhow!(
                "pipeline cannot be restarted (state: {:?})",
                self.state
            ));
        }

        self.camera.connect()?;
        self.state = PipelineState::Connected;
        log::info!(
            "pipeline connected: camera={} detector={}",
            self.camera.camera_id(),
            self.detector.name()
        );

        self.state = PipelineState::Running;
        let result = self.run_loop();

        self.state = PipelineState::Stopping;
        self.camera.disconnect();
        if let Some(view) = self.view.as_mut() {
            view.close();
        }
        if let Err(e) = self.publisher.flush() {
            log::warn!("publisher flush on shutdown failed: {}", e);
        }
        self.state = PipelineState::Stopped;
        log::info!(
            "pipeline stopped: camera={} frames={} events={}",
            self.camera.camera_id(),
            self.frame_idx,
            self.events_published
        );

        result
    }

    fn run_loop(&mut self) -> Result<()> {
        let mut last_sweep = Instant::now();

        while !self.stop.load(Ordering::SeqCst) {
            if let Some(max) = self.options.max_frames {
                if self.frame_idx >= max {
                    break;
                }
            }
            let cycle_start = Instant::now();

            // 1. Read. Failures and empty reads are transient; the frame
            // counter only advances for frames that were actually processed.
            let frame = match self.camera.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::debug!("no frame available from {}", self.camera.camera_id());
                    std::thread::sleep(self.options.read_retry_delay);
                    continue;
                }
                Err(e) => {
                    log::warn!("frame read failed: {}", e);
                    std::thread::sleep(self.options.read_retry_delay);
                    continue;
                }
            };

            let plates = self.process_frame(&frame)?;

            // 7. Periodic dedup sweep, piggybacked on the cycle.
            let now = Instant::now();
            if now.duration_since(last_sweep) >= self.options.dedup_sweep_interval {
                self.dedup.evict_expired(now);
                last_sweep = now;
            }

            // 8. Publish one event per cycle, only when something survived.
            if !plates.is_empty() {
                match DetectionEvent::new(
                    self.camera.camera_id(),
                    &frame.source,
                    plates.clone(),
                    frame.captured_at,
                ) {
                    Ok(event) => match self.publisher.publish(&event) {
                        Ok(()) => {
                            self.events_published += 1;
                            log::info!(
                                "published event {} ({} plate(s))",
                                event.event_id,
                                event.plates().len()
                            );
                        }
                        Err(e) => {
                            log::error!("event lost: {}", e);
                        }
                    },
                    Err(e) => {
                        log::error!("event construction failed: {}", e);
                    }
                }
            }

            if let Some(view) = self.view.as_mut() {
                match view.show(&frame, &plates) {
                    Ok(ViewSignal::Quit) => {
                        log::info!("quit requested from debug view");
                        self.stop.store(true, Ordering::SeqCst);
                    }
                    Ok(ViewSignal::Continue) => {}
                    Err(e) => {
                        log::warn!("debug view failed, disabling it: {}", e);
                        self.view = None;
                    }
                }
            }

            self.frame_idx += 1;

            // 9. Pace to the target frame rate.
            if let Some(target) = self.options.target_frame_interval {
                let elapsed = cycle_start.elapsed();
                if elapsed < target {
                    std::thread::sleep(target - elapsed);
                }
            }
        }

        Ok(())
    }

    /// Steps 2-6 of the cycle: detect, OCR, normalize, track, deduplicate.
    /// Returns the plates that should be published for this frame.
    fn process_frame(&mut self, frame: &Frame) -> Result<Vec<NormalizedPlate>> {
        // 2. Detect. A failure drops the frame's detections, not the run.
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("detection failed on frame {}: {}", self.frame_idx, e);
                Vec::new()
            }
        };
        if detections.is_empty() {
            return Ok(Vec::new());
        }

        // 3. OCR, gated to every Nth frame to bound its cost.
        if self.frame_idx % self.options.ocr_interval != 0 {
            return Ok(Vec::new());
        }
        let mut observations: Vec<Observation> = Vec::with_capacity(detections.len());
        for detection in detections {
            match self.ocr.read_text(frame, &detection.bbox) {
                Ok(reading) => observations.push(Observation {
                    detection,
                    text: reading.text,
                    confidence: reading.confidence,
                }),
                Err(e) => {
                    log::warn!("ocr failed on frame {}: {}", self.frame_idx, e);
                }
            }
        }

        // 4. Normalize; drop unusable text and low-confidence readings.
        let plates: Vec<NormalizedPlate> = observations
            .into_iter()
            .filter(|obs| obs.confidence >= self.options.ocr_min_confidence)
            .filter_map(|obs| {
                let text = self.normalizer.normalize(&obs.text);
                if text.is_empty() {
                    None
                } else {
                    Some(NormalizedPlate::new(obs.detection.bbox, obs.confidence, text))
                }
            })
            .collect();
        if plates.is_empty() {
            return Ok(Vec::new());
        }

        // 5. Track. A precondition failure here is fatal - frame metadata is
        // corrupted and every later frame would be wrong too.
        let plates = self.tracker.assign(plates, frame.height, frame.width)?;

        // 6. Deduplicate against the TTL window.
        let now = Instant::now();
        let camera_id = self.camera.camera_id().to_string();
        let unique: Vec<NormalizedPlate> = plates
            .into_iter()
            .filter(|plate| !self.dedup.is_duplicate(&camera_id, plate.identity, &plate.text, now))
            .collect();

        Ok(unique)
    }
}
