//! Thread-safe FIFO for overlay samples.
//!
//! One [`SampleQueue`] is the channel between a single binding's two sides:
//! - decode thread → `enqueue`
//! - frame thread → `dequeue_one` (at most once per tick)
//!
//! Neither side ever waits on the other. The mutex is held only for the push or pop
//! itself, never across caller code.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::sample::SharedSample;

/// Unbounded single-producer/single-consumer queue of shared overlay samples.
///
/// ## Design
/// - Samples come out in exactly the order they went in; nothing is reordered,
///   duplicated or dropped by the queue itself.
/// - `len()` reads a counter mirrored from the deque, so diagnostics never take the lock.
/// - `reset()` swaps the deque out under the lock and drops the samples afterwards.
#[derive(Debug, Default)]
pub struct SampleQueue {
    inner: Mutex<VecDeque<SharedSample>>,
    len: AtomicUsize,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with room for `capacity` samples before it reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            len: AtomicUsize::new(0),
        }
    }

    /// Append a sample at the tail. Called from the producer thread.
    pub fn enqueue(&self, sample: SharedSample) {
        let mut g = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        g.push_back(sample);
        self.len.store(g.len(), Ordering::Relaxed);
    }

    /// Remove and return the head sample, or `None` if nothing is queued.
    pub fn dequeue_one(&self) -> Option<SharedSample> {
        let mut g = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        let sample = g.pop_front();
        self.len.store(g.len(), Ordering::Relaxed);
        sample
    }

    /// Current queued samples (best-effort snapshot).
    ///
    /// This value can change immediately after the call returns.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every queued sample. Returns how many were dropped.
    pub fn reset(&self) -> usize {
        let drained = {
            let mut g = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            self.len.store(0, Ordering::Relaxed);
            std::mem::take(&mut *g)
        };
        drained.len()
    }
}
