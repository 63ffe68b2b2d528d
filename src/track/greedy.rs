//! Built-in greedy IoU motion tracker.
//!
//! A deliberately small [`MotionTracker`](super::MotionTracker): no Kalman
//! prediction, no tentative/confirmed lifecycle - just greedy IoU matching
//! of current detections against live tracks, spawning new ids for
//! confident unmatched detections and dropping tracks that go unseen too
//! long. Sufficient for plates, which are small and sparse per frame;
//! deployments with crowded scenes should plug in a full tracker behind the
//! same trait.

use anyhow::Result;

use super::iou::iou;
use super::{MotionTracker, TrackedBox, TrackerInput};

#[derive(Clone, Debug)]
pub struct GreedyTrackerConfig {
    /// Minimum IoU to match a detection to an existing track.
    pub match_threshold: f32,
    /// Minimum detection confidence to spawn a new track.
    pub spawn_confidence: f32,
    /// Frames a track survives without a matching detection.
    pub max_age: u64,
}

impl Default for GreedyTrackerConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.3,
            spawn_confidence: 0.25,
            max_age: 30,
        }
    }
}

struct TrackState {
    id: u64,
    corners: [f32; 4],
    last_seen: u64,
}

pub struct GreedyIouTracker {
    config: GreedyTrackerConfig,
    tracks: Vec<TrackState>,
    next_id: u64,
    frame: u64,
}

impl GreedyIouTracker {
    pub fn new(config: GreedyTrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_id: 1,
            frame: 0,
        }
    }
}

impl Default for GreedyIouTracker {
    fn default() -> Self {
        Self::new(GreedyTrackerConfig::default())
    }
}

impl MotionTracker for GreedyIouTracker {
    fn update(
        &mut self,
        detections: &[TrackerInput],
        _frame_height: u32,
        _frame_width: u32,
    ) -> Result<Vec<TrackedBox>> {
        self.frame += 1;

        // Greedy matching: each detection claims its best unclaimed track.
        let mut claimed = vec![false; self.tracks.len()];
        let mut seen_this_frame: Vec<usize> = Vec::new();

        for detection in detections {
            let mut best: Option<(usize, f32)> = None;
            for (idx, track) in self.tracks.iter().enumerate() {
                if claimed[idx] {
                    continue;
                }
                let overlap = iou(detection.corners, track.corners);
                if overlap >= self.config.match_threshold
                    && best.map(|(_, b)| overlap > b).unwrap_or(true)
                {
                    best = Some((idx, overlap));
                }
            }

            match best {
                Some((idx, _)) => {
                    claimed[idx] = true;
                    self.tracks[idx].corners = detection.corners;
                    self.tracks[idx].last_seen = self.frame;
                    seen_this_frame.push(idx);
                }
                None if detection.confidence >= self.config.spawn_confidence => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.tracks.push(TrackState {
                        id,
                        corners: detection.corners,
                        last_seen: self.frame,
                    });
                    claimed.push(true);
                    seen_this_frame.push(self.tracks.len() - 1);
                }
                None => {}
            }
        }

        let output: Vec<TrackedBox> = seen_this_frame
            .into_iter()
            .map(|idx| TrackedBox {
                corners: self.tracks[idx].corners,
                track_id: self.tracks[idx].id,
            })
            .collect();

        // Drop tracks unseen for longer than max_age frames.
        let frame = self.frame;
        let max_age = self.config.max_age;
        self.tracks
            .retain(|t| frame.saturating_sub(t.last_seen) <= max_age);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(corners: [f32; 4]) -> TrackerInput {
        TrackerInput {
            corners,
            confidence: 0.9,
        }
    }

    #[test]
    fn same_box_keeps_its_id_across_frames() {
        let mut tracker = GreedyIouTracker::default();
        let det = [detection([10.0, 10.0, 50.0, 30.0])];

        let first = tracker.update(&det, 480, 640).unwrap();
        let second = tracker.update(&det, 480, 640).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn distant_box_gets_a_new_id() {
        let mut tracker = GreedyIouTracker::default();
        let first = tracker
            .update(&[detection([10.0, 10.0, 50.0, 30.0])], 480, 640)
            .unwrap();
        let second = tracker
            .update(&[detection([400.0, 300.0, 440.0, 320.0])], 480, 640)
            .unwrap();
        assert_ne!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn low_confidence_detection_does_not_spawn() {
        let mut tracker = GreedyIouTracker::default();
        let out = tracker
            .update(
                &[TrackerInput {
                    corners: [10.0, 10.0, 50.0, 30.0],
                    confidence: 0.1,
                }],
                480,
                640,
            )
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn stale_tracks_are_dropped() {
        let mut tracker = GreedyIouTracker::new(GreedyTrackerConfig {
            max_age: 2,
            ..GreedyTrackerConfig::default()
        });
        let det = [detection([10.0, 10.0, 50.0, 30.0])];
        let first = tracker.update(&det, 480, 640).unwrap();

        for _ in 0..3 {
            tracker.update(&[], 480, 640).unwrap();
        }

        // Same geometry after the gap: the old track is gone, id restarts.
        let revived = tracker.update(&det, 480, 640).unwrap();
        assert_ne!(first[0].track_id, revived[0].track_id);
    }

    #[test]
    fn two_detections_claim_distinct_tracks() {
        let mut tracker = GreedyIouTracker::default();
        let dets = [
            detection([0.0, 0.0, 40.0, 20.0]),
            detection([200.0, 100.0, 240.0, 120.0]),
        ];
        tracker.update(&dets, 480, 640).unwrap();
        let out = tracker.update(&dets, 480, 640).unwrap();
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].track_id, out[1].track_id);
    }
}
