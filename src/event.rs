//! Published event types.
//!
//! A `DetectionEvent` is built once per cycle, only when at least one unique
//! plate survived deduplication, and is immutable after construction. The
//! wire payload is the JSON contract downstream systems depend on.

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::frame::NormalizedPlate;

/// One unique, deduplicated sighting, ready for publication.
#[derive(Clone, Debug)]
pub struct DetectionEvent {
    /// Stable id derived from the primary plate:
    /// `{camera}:{identity|na}:{text}:{captured_epoch}`. Brokers with
    /// consumer-side deduplication can key on it.
    pub event_id: String,
    /// Random per-frame id; also the publish key for partitioning.
    pub frame_id: String,
    pub camera_id: String,
    /// Stream source (URL or stable stream id) the frame came from.
    pub source: String,
    /// Private so construction always goes through [`new`](Self::new),
    /// which enforces non-emptiness.
    plates: Vec<NormalizedPlate>,
    pub captured_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// Builds an event for the given plates.
    ///
    /// Fails if `plates` is empty - an event without plates must never
    /// exist, callers are expected to skip the cycle instead.
    pub fn new(
        camera_id: &str,
        source: &str,
        plates: Vec<NormalizedPlate>,
        captured_at: SystemTime,
    ) -> Result<Self> {
        let primary = plates
            .first()
            .ok_or_else(|| anyhow!("detection event requires at least one plate"))?;

        let captured_at: DateTime<Utc> = captured_at.into();
        let identity = primary
            .identity
            .map(|id| id.to_string())
            .unwrap_or_else(|| "na".to_string());
        let event_id = format!(
            "{}:{}:{}:{}",
            camera_id,
            identity,
            primary.text,
            captured_at.timestamp()
        );

        Ok(Self {
            event_id,
            frame_id: new_frame_id(),
            camera_id: camera_id.to_string(),
            source: source.to_string(),
            plates,
            captured_at,
            processed_at: Utc::now(),
        })
    }

    /// Partitioning key handed to the sink.
    pub fn publish_key(&self) -> &str {
        &self.frame_id
    }

    /// The plates in this event. Guaranteed non-empty.
    pub fn plates(&self) -> &[NormalizedPlate] {
        &self.plates
    }

    /// The JSON contract emitted once per unique sighting.
    pub fn wire_payload(&self) -> WirePayload {
        // Constructor guarantees a non-empty plate list.
        let primary = &self.plates[0];
        WirePayload {
            plate: primary.text.clone(),
            camera_id: self.camera_id.clone(),
            parking_id: None,
            timestamp: self
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            frame_id: self.frame_id.clone(),
            image_url: None,
        }
    }
}

/// Downstream wire schema. `parkingId` is filled by a downstream system and
/// always null here; `imageUrl` is reserved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WirePayload {
    pub plate: String,
    pub camera_id: String,
    pub parking_id: Option<String>,
    pub timestamp: String,
    pub frame_id: String,
    pub image_url: Option<String>,
}

fn new_frame_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
