//! Real-time vehicle plate recognition pipeline.
//!
//! Reads frames from a camera stream, detects plate regions, reads and
//! canonicalizes plate text, assigns stable track identities, suppresses
//! repeat sightings within a TTL window, and publishes one event per unique
//! sighting to a broker with bounded retries and delivery confirmation.
//!
//! Module structure:
//! - `config`: file + environment configuration with validation
//! - `frame`: value types flowing through the per-frame cycle
//! - `ingest`: the `CameraStream` boundary and the synthetic demo camera
//! - `detect`: the `PlateDetector` boundary and a stub detector
//! - `ocr`: the `OcrReader` boundary and a stub reader
//! - `normalize`: plate text canonicalization
//! - `track`: identity assignment via IoU association over a motion tracker
//! - `dedup`: TTL-windowed suppression of repeat sightings
//! - `event`: the published event and its JSON wire contract
//! - `publish`: event sinks and the retrying publisher
//! - `view`: optional debug visualization boundary
//! - `pipeline`: the orchestrator tying the chain together

pub mod config;
pub mod dedup;
pub mod detect;
pub mod event;
pub mod frame;
pub mod ingest;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod publish;
pub mod track;
pub mod view;

pub use config::PipelineConfig;
pub use dedup::Deduplicator;
pub use event::{DetectionEvent, WirePayload};
pub use frame::{BoundingBox, Detection, Frame, NormalizedPlate, Observation};
pub use normalize::TextNormalizer;
pub use pipeline::{PipelineOptions, PipelineOrchestrator, PipelineState};
pub use publish::{EventSink, ReliablePublisher, RetryPolicy};
pub use track::{IdentityTracker, MotionTracker};
