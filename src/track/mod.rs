//! Identity assignment for per-frame detections.
//!
//! Motion continuity is delegated to an external [`MotionTracker`]
//! capability; this module resolves the tracker's output back onto the
//! caller's plates by geometry. Association is a greedy per-row IoU argmax,
//! not a global optimal assignment - boxes are small and sparse per frame,
//! so the approximation is acceptable and kept deliberately simple.

mod greedy;
mod iou;

pub use greedy::{GreedyIouTracker, GreedyTrackerConfig};
pub use iou::{iou, iou_matrix};

use anyhow::{anyhow, Result};

use crate::frame::NormalizedPlate;

/// Minimum IoU between a plate box and a tracked box for the track's
/// identity to be adopted.
pub const ASSOCIATION_IOU_THRESHOLD: f32 = 0.1;

/// One detection handed to the motion tracker: two-corner box + confidence.
#[derive(Clone, Copy, Debug)]
pub struct TrackerInput {
    pub corners: [f32; 4],
    pub confidence: f32,
}

/// A box the motion tracker is currently following.
#[derive(Clone, Copy, Debug)]
pub struct TrackedBox {
    pub corners: [f32; 4],
    pub track_id: u64,
}

/// External motion-tracking capability.
///
/// Implementations own their track lifecycle (spawning, aging, dropping);
/// only the returned set of tracked boxes matters to this crate.
pub trait MotionTracker {
    fn update(
        &mut self,
        detections: &[TrackerInput],
        frame_height: u32,
        frame_width: u32,
    ) -> Result<Vec<TrackedBox>>;
}

/// Associates current-frame plates with persistent identities.
///
/// Owned exclusively by one orchestrator; never shared across cameras.
pub struct IdentityTracker {
    tracker: Box<dyn MotionTracker>,
}

impl IdentityTracker {
    pub fn new(tracker: Box<dyn MotionTracker>) -> Self {
        Self { tracker }
    }

    /// Annotates `plates` with stable identities.
    ///
    /// Frame dimensions must be supplied per call; zero dimensions are a
    /// programming error and fail immediately. An empty input returns empty
    /// without invoking the motion tracker. A tracker that reports no boxes
    /// is not an error - every plate comes back with identity `None`.
    pub fn assign(
        &mut self,
        plates: Vec<NormalizedPlate>,
        frame_height: u32,
        frame_width: u32,
    ) -> Result<Vec<NormalizedPlate>> {
        if plates.is_empty() {
            return Ok(plates);
        }
        if frame_height == 0 || frame_width == 0 {
            return Err(anyhow!(
                "identity tracker invoked without frame dimensions (height={}, width={})",
                frame_height,
                frame_width
            ));
        }

        let detections: Vec<TrackerInput> = plates
            .iter()
            .map(|p| TrackerInput {
                corners: p.bbox.corners(),
                confidence: p.confidence,
            })
            .collect();

        let tracks = self.tracker.update(&detections, frame_height, frame_width)?;
        if tracks.is_empty() {
            return Ok(plates.iter().map(|p| p.with_identity(None)).collect());
        }

        let plate_boxes: Vec<[f32; 4]> = plates.iter().map(|p| p.bbox.corners()).collect();
        let track_boxes: Vec<[f32; 4]> = tracks.iter().map(|t| t.corners).collect();
        let ious = iou_matrix(&plate_boxes, &track_boxes);

        let assigned = plates
            .iter()
            .zip(ious.iter())
            .map(|(plate, row)| {
                // Greedy argmax; ties go to the first track in order.
                let (best_idx, best_iou) = row.iter().enumerate().fold(
                    (0usize, f32::MIN),
                    |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) },
                );
                if best_iou > ASSOCIATION_IOU_THRESHOLD {
                    plate.with_identity(Some(tracks[best_idx].track_id))
                } else {
                    plate.with_identity(None)
                }
            })
            .collect();

        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BoundingBox;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Returns a fixed set of tracked boxes and counts invocations.
    struct ScriptedTracker {
        tracks: Vec<TrackedBox>,
        calls: Arc<AtomicU32>,
    }

    impl MotionTracker for ScriptedTracker {
        fn update(
            &mut self,
            _detections: &[TrackerInput],
            _frame_height: u32,
            _frame_width: u32,
        ) -> Result<Vec<TrackedBox>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tracks.clone())
        }
    }

    fn plate(x: f32, y: f32, w: f32, h: f32, text: &str) -> NormalizedPlate {
        NormalizedPlate::new(BoundingBox::new(x, y, w, h), 0.9, text.to_string())
    }

    fn tracker_with(tracks: Vec<TrackedBox>) -> (IdentityTracker, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let tracker = IdentityTracker::new(Box::new(ScriptedTracker {
            tracks,
            calls: calls.clone(),
        }));
        (tracker, calls)
    }

    #[test]
    fn empty_input_does_not_invoke_tracker() {
        let (mut tracker, calls) = tracker_with(vec![]);
        let out = tracker.assign(vec![], 480, 640).unwrap();
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_frame_dimensions_are_a_precondition_error() {
        let (mut tracker, calls) = tracker_with(vec![]);
        let plates = vec![plate(0.0, 0.0, 10.0, 10.0, "AB123")];
        assert!(tracker.assign(plates.clone(), 0, 640).is_err());
        assert!(tracker.assign(plates, 480, 0).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_tracks_means_no_identity() {
        let (mut tracker, _) = tracker_with(vec![]);
        let out = tracker
            .assign(vec![plate(0.0, 0.0, 10.0, 10.0, "AB123")], 480, 640)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identity, None);
    }

    #[test]
    fn overlapping_track_assigns_its_identity() {
        let (mut tracker, _) = tracker_with(vec![TrackedBox {
            corners: [0.0, 0.0, 10.0, 10.0],
            track_id: 42,
        }]);
        let out = tracker
            .assign(vec![plate(1.0, 1.0, 9.0, 9.0, "AB123")], 480, 640)
            .unwrap();
        assert_eq!(out[0].identity, Some(42));
    }

    #[test]
    fn low_iou_yields_no_identity() {
        // Max IoU against all tracks is ~0.05, below the 0.1 threshold.
        let (mut tracker, _) = tracker_with(vec![TrackedBox {
            corners: [0.0, 0.0, 10.0, 1.0],
            track_id: 9,
        }]);
        let out = tracker
            .assign(vec![plate(0.0, 0.0, 10.0, 10.0, "AB123")], 480, 640)
            .unwrap();
        assert_eq!(out[0].identity, None);
    }

    #[test]
    fn each_plate_picks_its_best_track() {
        let (mut tracker, _) = tracker_with(vec![
            TrackedBox {
                corners: [0.0, 0.0, 10.0, 10.0],
                track_id: 1,
            },
            TrackedBox {
                corners: [100.0, 100.0, 110.0, 110.0],
                track_id: 2,
            },
        ]);
        let out = tracker
            .assign(
                vec![
                    plate(100.0, 100.0, 10.0, 10.0, "XY987"),
                    plate(0.0, 0.0, 10.0, 10.0, "AB123"),
                ],
                480,
                640,
            )
            .unwrap();
        assert_eq!(out[0].identity, Some(2));
        assert_eq!(out[1].identity, Some(1));
    }
}
