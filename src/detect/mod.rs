//! Plate detection capability.
//!
//! The detection model is a black box behind `PlateDetector`: given a frame,
//! return candidate boxes with confidences. Model loading, preprocessing and
//! inference live entirely in the implementation.

use anyhow::Result;

use crate::frame::{BoundingBox, Detection, Frame};

/// External plate detection capability.
pub trait PlateDetector {
    /// Implementation identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Detect candidate plate boxes on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Stub detector for demo runs and tests.
///
/// Reports one stationary plate-sized box in the lower center of the frame,
/// roughly where a plate sits on a vehicle approaching a barrier camera.
pub struct StubPlateDetector {
    confidence: f32,
}

impl StubPlateDetector {
    pub fn new() -> Self {
        Self { confidence: 0.88 }
    }
}

impl Default for StubPlateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlateDetector for StubPlateDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let w = frame.width as f32;
        let h = frame.height as f32;
        let box_w = w / 4.0;
        let box_h = h / 12.0;
        Ok(vec![Detection {
            bbox: BoundingBox::new((w - box_w) / 2.0, h * 0.7, box_w, box_h),
            confidence: self.confidence,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn stub_detector_reports_a_box_inside_the_frame() {
        let frame = Frame {
            data: vec![0; 640 * 480 * 3],
            width: 640,
            height: 480,
            captured_at: SystemTime::now(),
            source: "stub://test".into(),
        };
        let mut detector = StubPlateDetector::new();
        let detections = detector.detect(&frame).unwrap();

        assert_eq!(detections.len(), 1);
        let corners = detections[0].bbox.corners();
        assert!(corners[0] >= 0.0 && corners[2] <= 640.0);
        assert!(corners[1] >= 0.0 && corners[3] <= 480.0);
        assert!(detections[0].confidence > 0.0);
    }
}
