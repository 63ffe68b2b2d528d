//! Value types that flow through the per-frame cycle.
//!
//! - `Frame`: one captured image plus capture metadata. Owned by the
//!   orchestrator for the duration of a single cycle.
//! - `Detection`: a candidate plate box from the detector. Ephemeral.
//! - `Observation`: a detection plus raw OCR output. Ephemeral.
//! - `NormalizedPlate`: the downstream value - canonical text, box,
//!   confidence, optional track identity. Immutable once built; assigning an
//!   identity produces a new value instead of mutating a shared one.

use std::time::SystemTime;

/// Axis-aligned bounding box in pixel coordinates, `(x, y, width, height)`
/// with the origin at the top-left corner of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Two-corner form `(x_min, y_min, x_max, y_max)`, the representation
    /// motion trackers and the IoU math work in.
    pub fn corners(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// One frame read from a camera stream.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Raw pixel data (RGB, row-major). Opaque to this crate; only the
    /// external detector and OCR capabilities interpret it.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture time, as reported by the source.
    pub captured_at: SystemTime,
    /// Source identifier (camera URL or stable stream id).
    pub source: String,
}

/// A candidate plate box reported by the external detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A detection with the raw OCR text read from its region.
#[derive(Clone, Debug)]
pub struct Observation {
    pub detection: Detection,
    /// Raw OCR text, not yet normalized.
    pub text: String,
    /// OCR confidence for the text, 0.0-1.0.
    pub confidence: f32,
}

/// A plate that survived normalization, optionally carrying a track identity.
///
/// The text is canonical: uppercase alphanumeric only, at or above the
/// configured minimum length. Identity assignment goes through
/// [`with_identity`](NormalizedPlate::with_identity), which returns a new
/// value - plates are never mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedPlate {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub text: String,
    /// Track id assigned by the identity tracker; `None` when the plate could
    /// not be associated with any tracked box.
    pub identity: Option<u64>,
}

impl NormalizedPlate {
    pub fn new(bbox: BoundingBox, confidence: f32, text: String) -> Self {
        Self {
            bbox,
            confidence,
            text,
            identity: None,
        }
    }

    /// Returns a copy of this plate with the given identity.
    pub fn with_identity(&self, identity: Option<u64>) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_converts_xywh() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.corners(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn area_clamps_negative_extents() {
        let bbox = BoundingBox::new(0.0, 0.0, -5.0, 10.0);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn with_identity_does_not_mutate_original() {
        let plate =
            NormalizedPlate::new(BoundingBox::new(0.0, 0.0, 10.0, 5.0), 0.9, "AB123".into());
        let tracked = plate.with_identity(Some(7));
        assert_eq!(plate.identity, None);
        assert_eq!(tracked.identity, Some(7));
        assert_eq!(tracked.text, plate.text);
    }
}
