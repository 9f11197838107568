//! Lock-free playback snapshot shared by the frame thread and observers.
//!
//! Rate and time live in two independent atomics. Each load returns a value that was
//! stored whole, but a `(rate(), time())` pair read from another thread while the frame
//! thread is updating may straddle two frames. Callers that need a coherent pair must
//! read from the frame thread.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

const NO_SAMPLE: u64 = u64::MAX;

/// Cached playback rate/time plus the timestamp of the last delivered caption.
#[derive(Debug)]
pub struct PlaybackStateCache {
    /// `f32` rate stored as raw bits.
    rate_bits: AtomicU32,
    /// Playback position in nanoseconds.
    time_nanos: AtomicU64,
    /// Last delivered sample time in nanoseconds, or [`NO_SAMPLE`].
    last_sample_nanos: AtomicU64,
}

impl Default for PlaybackStateCache {
    fn default() -> Self {
        Self {
            rate_bits: AtomicU32::new(0.0_f32.to_bits()),
            time_nanos: AtomicU64::new(0),
            last_sample_nanos: AtomicU64::new(NO_SAMPLE),
        }
    }
}

impl PlaybackStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame thread only, once per frame.
    pub fn set_rate(&self, rate: f32) {
        self.rate_bits.store(rate.to_bits(), Ordering::Relaxed);
    }

    /// Signed playback rate; `0.0` means paused or stopped.
    pub fn rate(&self) -> f32 {
        f32::from_bits(self.rate_bits.load(Ordering::Relaxed))
    }

    /// Frame thread only, once per frame. Saturates at roughly 584 years.
    pub fn set_time(&self, time: Duration) {
        self.time_nanos.store(to_nanos(time), Ordering::Relaxed);
    }

    /// Cached playback position.
    pub fn time(&self) -> Duration {
        Duration::from_nanos(self.time_nanos.load(Ordering::Relaxed))
    }

    /// `true` when the cached rate is non-zero.
    pub fn is_playing(&self) -> bool {
        self.rate() != 0.0
    }

    /// Rate back to `0.0`, time back to zero.
    pub fn clear(&self) {
        self.set_rate(0.0);
        self.set_time(Duration::ZERO);
    }

    /// Record the last delivered sample time; `None` clears the marker.
    pub fn set_last_sample_time(&self, time: Option<Duration>) {
        let nanos = time.map_or(NO_SAMPLE, to_nanos);
        self.last_sample_nanos.store(nanos, Ordering::Relaxed);
    }

    /// Time of the most recently delivered sample, or `None` while playback is inactive.
    pub fn last_sample_time(&self) -> Option<Duration> {
        match self.last_sample_nanos.load(Ordering::Relaxed) {
            NO_SAMPLE => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }
}

/// Saturate just below the sentinel so that a huge timestamp never reads back as "none".
fn to_nanos(time: Duration) -> u64 {
    u64::try_from(time.as_nanos()).map_or(NO_SAMPLE - 1, |n| n.min(NO_SAMPLE - 1))
}
