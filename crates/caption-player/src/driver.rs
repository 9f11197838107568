//! Per-frame caption orchestration.
//!
//! [`CaptionDriver::tick`] runs once per display frame on the frame thread:
//! 1. refresh the producer binding and snapshot its rate/time
//! 2. pull at most one sample from the bound queue if playback is moving
//! 3. broadcast the sample text as `NewCaptionText`
//!
//! Lifecycle calls (`activate`, `deactivate`, `set_producer`) may come from any thread.
//! Nothing here blocks, and absent producers or empty queues are ordinary states.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::binding::SourceBinding;
use crate::cache::PlaybackStateCache;
use crate::config::CaptionConfig;
use crate::events::{CaptionEvents, ListenerId};
use crate::sample::SharedSample;
use crate::source::CaptionSource;
use crate::status::{DeliveryStats, StatusSnapshot};

/// Frame-driven consumer that delivers caption text from one producer at a time.
pub struct CaptionDriver {
    config: CaptionConfig,
    /// Producer the host asked for; held weakly and resolved every frame.
    producer: Mutex<Option<Weak<dyn CaptionSource>>>,
    binding: SourceBinding,
    cache: PlaybackStateCache,
    events: CaptionEvents,
    stats: DeliveryStats,
    tick_enabled: AtomicBool,
}

impl std::fmt::Debug for CaptionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionDriver")
            .field("active", &self.is_active())
            .field("binding", &self.binding)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for CaptionDriver {
    fn default() -> Self {
        Self::new(CaptionConfig::default())
    }
}

impl CaptionDriver {
    /// Create an inactive driver. Call [`register`](Self::register) or
    /// [`activate`](Self::activate) before ticking.
    pub fn new(config: CaptionConfig) -> Self {
        let binding = SourceBinding::new(config.queue_capacity_hint);
        Self {
            config,
            producer: Mutex::new(None),
            binding,
            cache: PlaybackStateCache::new(),
            events: CaptionEvents::new(),
            stats: DeliveryStats::default(),
            tick_enabled: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Host lifecycle
    // ------------------------------------------------------------------

    /// Host attach hook; activates when `auto_activate` is set.
    pub fn register(&self) {
        if self.config.auto_activate {
            self.activate(false);
        }
    }

    /// Host detach hook; drops the binding but leaves the producer selection alone.
    pub fn unregister(&self) {
        self.binding.unbind();
        self.cache.set_last_sample_time(None);
    }

    /// Enable ticking. Without `reset`, an already active driver is left untouched.
    pub fn activate(&self, reset: bool) {
        if reset || !self.is_active() {
            self.binding.activate();
            self.tick_enabled.store(true, Ordering::Relaxed);
            tracing::info!(reset, "caption driver activated");
        }
    }

    /// Disable ticking and tear the binding down. Queued samples are discarded silently.
    ///
    /// Safe against a tick running on another thread: a bind already in flight sees the
    /// deactivation and drops its new queue.
    pub fn deactivate(&self) {
        if !self.binding.deactivate() {
            return;
        }
        self.tick_enabled.store(false, Ordering::Relaxed);
        self.cache.set_last_sample_time(None);
        tracing::info!("caption driver deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.binding.is_active()
    }

    pub fn is_tick_enabled(&self) -> bool {
        self.tick_enabled.load(Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Producer selection
    // ------------------------------------------------------------------

    /// Select the producer to pull captions from. The driver keeps only a weak reference.
    pub fn set_producer<P>(&self, producer: &Arc<P>)
    where
        P: CaptionSource + 'static,
    {
        let facade: Arc<dyn CaptionSource> = producer.clone();
        let weak = Arc::downgrade(&facade);
        *self.lock_producer() = Some(weak);
    }

    pub fn clear_producer(&self) {
        *self.lock_producer() = None;
    }

    /// The selected producer, or `None` if unset or already dropped.
    pub fn producer(&self) -> Option<Arc<dyn CaptionSource>> {
        self.lock_producer().as_ref().and_then(Weak::upgrade)
    }

    fn lock_producer(&self) -> std::sync::MutexGuard<'_, Option<Weak<dyn CaptionSource>>> {
        self.producer.lock().unwrap_or_else(|err| err.into_inner())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Subscribe to `NewCaptionText`.
    pub fn on_new_caption_text<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn remove_caption_listener(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Frame thread
    // ------------------------------------------------------------------

    /// Per-frame entry point. Returns the sample delivered this frame, if any.
    ///
    /// Must be called from one thread at a time, once per displayed frame.
    pub fn tick(&self) -> Option<SharedSample> {
        if !self.is_tick_enabled() {
            return None;
        }
        self.refresh_binding();
        let delivered = self.drain_one_sample();

        let frame = self.stats.record_frame();
        let interval = self.config.stats_log_interval_frames;
        if interval > 0 && frame % interval == 0 {
            let s = self.status();
            tracing::debug!(
                frame,
                bound = s.bound,
                rate = s.rate,
                time_ms = s.time_ms,
                queued = s.queued,
                delivered = s.delivered,
                "caption driver status"
            );
        }
        delivered
    }

    /// Resolve the producer, (re)bind or tear down as needed, and cache rate/time.
    pub fn refresh_binding(&self) {
        let Some(producer) = self.producer() else {
            self.cache.clear();
            if self.binding.unbind() {
                tracing::debug!("caption producer gone");
            }
            return;
        };

        if !self.is_active() {
            self.binding.unbind();
        } else if !self.binding.is_bound_to(&producer) {
            self.binding.bind(&producer);
        }

        self.cache.set_rate(producer.rate());
        self.cache.set_time(producer.time());
    }

    /// Deliver at most one queued sample.
    ///
    /// While unbound or paused nothing is consumed and the last-sample marker reads
    /// `None`. An empty queue during playback leaves the marker as it was.
    pub fn drain_one_sample(&self) -> Option<SharedSample> {
        let queue = self.binding.queue();
        let Some(queue) = queue.filter(|_| self.cache.is_playing()) else {
            self.cache.set_last_sample_time(None);
            return None;
        };

        let sample = queue.dequeue_one()?;
        self.cache.set_last_sample_time(Some(sample.time()));
        self.events.broadcast(sample.text());
        self.stats.record_delivery(queue.len());
        tracing::trace!(
            time_ms = sample.time().as_millis() as u64,
            queued = queue.len(),
            "caption delivered"
        );
        Some(sample)
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Lock-free rate/time snapshot, readable from any thread.
    pub fn playback(&self) -> &PlaybackStateCache {
        &self.cache
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    pub fn status(&self) -> StatusSnapshot {
        let queued = self.binding.queue().map(|q| q.len());
        self.stats.snapshot(self.is_active(), queued, &self.cache)
    }
}
