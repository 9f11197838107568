//! Producer-side boundary.
//!
//! The decode pipeline is external. It appears to the consumer as a [`CaptionSource`]
//! facade: something that accepts sample sinks and answers rate/time queries. Producers
//! that want the usual "deliver to every live sink" behaviour can embed [`CaptionSinks`].

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::queue::SampleQueue;
use crate::sample::SharedSample;

/// Facade of an upstream overlay sample producer.
///
/// Identity is the facade allocation: two handles are the same producer when they point
/// at the same `Arc`.
pub trait CaptionSource: Send + Sync {
    /// Hand a freshly created queue to the producer.
    ///
    /// The producer should `enqueue` every overlay sample it decodes into this queue for as
    /// long as the queue is alive.
    fn register_sink(&self, sink: Arc<SampleQueue>);

    /// Current playback rate; `0.0` when paused or stopped.
    fn rate(&self) -> f32;

    /// Current playback position.
    fn time(&self) -> Duration;
}

/// Weakly held set of sample sinks, for use inside a producer.
///
/// The consumer owns its queue; the registry never keeps one alive. A sink whose consumer
/// went away is pruned on the next `add` or `deliver`, so no explicit unregister exists.
#[derive(Debug, Default)]
pub struct CaptionSinks {
    sinks: Mutex<Vec<Weak<SampleQueue>>>,
}

impl CaptionSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start delivering to `sink`, pruning sinks whose consumer is gone.
    pub fn add(&self, sink: &Arc<SampleQueue>) {
        let mut g = self.sinks.lock().unwrap_or_else(|err| err.into_inner());
        g.retain(|s| s.strong_count() > 0);
        g.push(Arc::downgrade(sink));
    }

    /// Enqueue `sample` into every live sink. Returns the number of sinks reached.
    pub fn deliver(&self, sample: &SharedSample) -> usize {
        let mut g = self.sinks.lock().unwrap_or_else(|err| err.into_inner());
        let before = g.len();
        let mut delivered = 0usize;
        g.retain(|weak| match weak.upgrade() {
            Some(queue) => {
                queue.enqueue(sample.clone());
                delivered += 1;
                true
            }
            None => false,
        });
        let pruned = before - g.len();
        if pruned > 0 {
            tracing::debug!(pruned, live = g.len(), "caption sinks pruned");
        }
        delivered
    }

    /// Number of sinks whose consumer is still alive.
    pub fn live(&self) -> usize {
        let g = self.sinks.lock().unwrap_or_else(|err| err.into_inner());
        g.iter().filter(|s| s.strong_count() > 0).count()
    }

    /// Forget every sink.
    pub fn clear(&self) {
        let mut g = self.sinks.lock().unwrap_or_else(|err| err.into_inner());
        g.clear();
    }
}
