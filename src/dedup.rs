//! Time-windowed suppression of repeat sightings.
//!
//! A sighting is keyed by (camera, track identity, normalized text). Strictly
//! within the TTL window the same key is a duplicate and its last-seen
//! timestamp is refreshed; at or past the TTL the key may fire again. Untracked plates
//! (identity `None`) fall back to (camera, text) alone - two different
//! physical plates sharing text in the same window will be conservatively
//! suppressed, which is preferred over emitting duplicate events.
//!
//! "Duplicate" and "not duplicate" are the only outcomes; lookups cannot
//! fail. The instance is owned exclusively by one orchestrator, so no
//! internal synchronization is needed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum DedupKey {
    Tracked {
        camera: String,
        track_id: u64,
        text: String,
    },
    Untracked {
        camera: String,
        text: String,
    },
}

impl DedupKey {
    fn new(camera_id: &str, identity: Option<u64>, text: &str) -> Self {
        match identity {
            Some(track_id) => DedupKey::Tracked {
                camera: camera_id.to_string(),
                track_id,
                text: text.to_string(),
            },
            None => DedupKey::Untracked {
                camera: camera_id.to_string(),
                text: text.to_string(),
            },
        }
    }
}

pub struct Deduplicator {
    ttl: Duration,
    entries: HashMap<DedupKey, Instant>,
}

impl Deduplicator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Decides whether this sighting was already reported within the TTL.
    ///
    /// Returns false (and records `now`) when the key is absent or expired;
    /// returns true (and refreshes last-seen) when the key is still live.
    /// The window is strict: a sighting exactly `ttl` after the last one is
    /// not a duplicate.
    pub fn is_duplicate(
        &mut self,
        camera_id: &str,
        identity: Option<u64>,
        text: &str,
        now: Instant,
    ) -> bool {
        let key = DedupKey::new(camera_id, identity, text);
        let duplicate = match self.entries.get(&key) {
            Some(last_seen) => now.saturating_duration_since(*last_seen) < self.ttl,
            None => false,
        };
        // Both outcomes record `now`: first sightings start the window,
        // repeats extend it.
        self.entries.insert(key, now);
        duplicate
    }

    /// Removes expired entries to bound memory. Behaviorally invisible to
    /// callers - lookups already treat expired entries as absent.
    pub fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, last_seen| now.saturating_duration_since(*last_seen) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn suppresses_within_ttl_and_releases_after() {
        let mut dedup = Deduplicator::new(Duration::from_secs_f64(3.0));
        let base = Instant::now();

        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 0.0)));
        assert!(dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 1.0)));
        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 5.0)));
    }

    #[test]
    fn sighting_at_exactly_ttl_is_not_suppressed() {
        let mut dedup = Deduplicator::new(Duration::from_secs(3));
        let base = Instant::now();

        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", base));
        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", base + Duration::from_secs(3)));
    }

    #[test]
    fn repeat_sightings_extend_the_window() {
        let mut dedup = Deduplicator::new(Duration::from_secs_f64(3.0));
        let base = Instant::now();

        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 0.0)));
        // Refreshed at t=2, so t=4 is still within ttl of the last sighting.
        assert!(dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 2.0)));
        assert!(dedup.is_duplicate("cam1", Some(7), "ABC123", at(base, 4.0)));
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let mut dedup = Deduplicator::new(Duration::from_secs_f64(3.0));
        let base = Instant::now();

        assert!(!dedup.is_duplicate("cam1", Some(7), "ABC123", base));
        assert!(!dedup.is_duplicate("cam2", Some(7), "ABC123", base));
        assert!(!dedup.is_duplicate("cam1", Some(8), "ABC123", base));
        assert!(!dedup.is_duplicate("cam1", Some(7), "XYZ987", base));
    }

    #[test]
    fn untracked_plates_deduplicate_by_text_alone() {
        let mut dedup = Deduplicator::new(Duration::from_secs_f64(3.0));
        let base = Instant::now();

        assert!(!dedup.is_duplicate("cam1", None, "ABC123", base));
        // Still untracked, same text: suppressed even though it could be a
        // different physical plate.
        assert!(dedup.is_duplicate("cam1", None, "ABC123", at(base, 1.0)));
        // A tracked sighting uses a different key shape.
        assert!(!dedup.is_duplicate("cam1", Some(3), "ABC123", at(base, 1.0)));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let mut dedup = Deduplicator::new(Duration::from_secs_f64(3.0));
        let base = Instant::now();

        dedup.is_duplicate("cam1", Some(1), "AAA111", at(base, 0.0));
        dedup.is_duplicate("cam1", Some(2), "BBB222", at(base, 4.0));
        assert_eq!(dedup.len(), 2);

        dedup.evict_expired(at(base, 5.0));
        assert_eq!(dedup.len(), 1);

        // The surviving entry still suppresses.
        assert!(dedup.is_duplicate("cam1", Some(2), "BBB222", at(base, 6.0)));
    }
}
