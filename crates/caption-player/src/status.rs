use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use caption_types::CaptionStatus;

use crate::cache::PlaybackStateCache;

/// Snapshot type returned to hosts and logs.
pub type StatusSnapshot = CaptionStatus;

/// Counters updated by the frame thread as captions go out.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Frames ticked while the consumer was enabled.
    frames: AtomicU64,
    /// Captions handed to subscribers.
    delivered: AtomicU64,
    /// Queue depth right after the last delivery.
    queued_after_last: AtomicUsize,
}

impl DeliveryStats {
    /// Count one enabled tick. Returns the frame number, starting at 1.
    pub fn record_frame(&self) -> u64 {
        self.frames.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count one delivered caption and remember how deep the queue was afterwards.
    pub fn record_delivery(&self, queued_after: usize) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.queued_after_last.store(queued_after, Ordering::Relaxed);
    }

    /// Build a snapshot from these counters and the playback cache.
    ///
    /// `queued` is the live depth of the bound queue; the depth recorded at the last
    /// delivery is reported separately.
    pub fn snapshot(
        &self,
        active: bool,
        queued: Option<usize>,
        cache: &PlaybackStateCache,
    ) -> StatusSnapshot {
        CaptionStatus {
            active,
            bound: queued.is_some(),
            rate: cache.rate(),
            time_ms: millis(cache.time()),
            last_sample_ms: cache.last_sample_time().map(millis),
            queued: queued.unwrap_or(0),
            queued_at_last_delivery: self.queued_after_last.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn snapshot_reports_cache_and_counters() {
        let stats = DeliveryStats::default();
        let cache = PlaybackStateCache::new();
        cache.set_rate(1.0);
        cache.set_time(Duration::from_millis(2_500));
        cache.set_last_sample_time(Some(Duration::from_millis(2_000)));
        stats.record_delivery(3);
        stats.record_delivery(2);

        let snap = stats.snapshot(true, Some(5), &cache);
        assert!(snap.active);
        assert!(snap.bound);
        assert_eq!(snap.rate, 1.0);
        assert_eq!(snap.time_ms, 2_500);
        assert_eq!(snap.last_sample_ms, Some(2_000));
        assert_eq!(snap.queued, 5);
        assert_eq!(snap.delivered, 2);
        assert_eq!(snap.queued_at_last_delivery, 2);
    }

    #[test]
    fn snapshot_unbound_reports_empty_queue() {
        let stats = DeliveryStats::default();
        let cache = PlaybackStateCache::new();
        let snap = stats.snapshot(false, None, &cache);
        assert!(!snap.bound);
        assert_eq!(snap.queued, 0);
        assert_eq!(snap.last_sample_ms, None);
    }

    #[test]
    fn record_frame_counts_up_from_one() {
        let stats = DeliveryStats::default();
        assert_eq!(stats.record_frame(), 1);
        assert_eq!(stats.record_frame(), 2);
    }
}
