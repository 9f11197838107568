//! Producer ↔ queue binding.
//!
//! The binding is either unbound or `(producer, queue)`. Binding always creates a new
//! queue and registers it with the producer exactly once; queues are never reused across
//! bindings, so a previous source can never leak samples into the next one.
//!
//! The pair sits behind a mutex that is held only while the pair is read or swapped.
//! Sink registration and queue resets happen outside it. The consumer's active flag lives
//! under the same mutex: `deactivate` clears it and takes the pair in one step, and `bind`
//! re-checks it when swapping in, so a bind racing a deactivation discards its new queue
//! instead of leaving a live binding behind.

use std::sync::{Arc, Mutex, Weak};

use crate::queue::SampleQueue;
use crate::source::CaptionSource;

struct Binding {
    /// Non-owning: observing a producer must not keep it alive.
    producer: Weak<dyn CaptionSource>,
    queue: Arc<SampleQueue>,
}

#[derive(Default)]
struct Slot {
    active: bool,
    bound: Option<Binding>,
}

/// Current (producer, queue) pair for one consumer, plus whether it may bind at all.
pub struct SourceBinding {
    slot: Mutex<Slot>,
    queue_capacity_hint: usize,
}

impl std::fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.lock();
        f.debug_struct("SourceBinding")
            .field("active", &slot.active)
            .field("bound", &slot.bound.is_some())
            .field("queued", &slot.bound.as_ref().map_or(0, |b| b.queue.len()))
            .finish()
    }
}

impl SourceBinding {
    /// Create an inactive, unbound slot.
    pub fn new(queue_capacity_hint: usize) -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            queue_capacity_hint,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Allow binding. Returns `false` if already active.
    pub fn activate(&self) -> bool {
        let mut slot = self.lock();
        !std::mem::replace(&mut slot.active, true)
    }

    /// Forbid binding and tear down the current pair in the same critical section.
    ///
    /// Returns `false` if already inactive.
    pub fn deactivate(&self) -> bool {
        let (was_active, previous) = {
            let mut slot = self.lock();
            (std::mem::replace(&mut slot.active, false), slot.bound.take())
        };
        if let Some(old) = previous {
            let discarded = old.queue.reset();
            tracing::debug!(discarded, "caption consumer deactivated; binding dropped");
        }
        was_active
    }

    pub fn is_bound(&self) -> bool {
        self.lock().bound.is_some()
    }

    /// Whether the active binding belongs to `producer`.
    pub fn is_bound_to(&self, producer: &Arc<dyn CaptionSource>) -> bool {
        self.lock()
            .bound
            .as_ref()
            .is_some_and(|b| std::ptr::addr_eq(b.producer.as_ptr(), Arc::as_ptr(producer)))
    }

    /// Producer of the active binding, if it is still alive.
    pub fn bound_producer(&self) -> Option<Arc<dyn CaptionSource>> {
        self.lock().bound.as_ref().and_then(|b| b.producer.upgrade())
    }

    /// Stable handle to the bound queue; the binding may change right after this returns.
    pub fn queue(&self) -> Option<Arc<SampleQueue>> {
        self.lock().bound.as_ref().map(|b| b.queue.clone())
    }

    /// Bind to `producer` with a brand-new queue, replacing any previous binding.
    ///
    /// Returns `None`, and drops the new queue, if the slot is inactive by the time the
    /// pair would be swapped in.
    pub fn bind(&self, producer: &Arc<dyn CaptionSource>) -> Option<Arc<SampleQueue>> {
        let queue = Arc::new(SampleQueue::with_capacity(self.queue_capacity_hint));
        producer.register_sink(queue.clone());

        let previous = {
            let mut slot = self.lock();
            if !slot.active {
                drop(slot);
                let discarded = queue.reset();
                tracing::debug!(discarded, "caption consumer inactive; new queue discarded");
                return None;
            }
            slot.bound.replace(Binding {
                producer: Arc::downgrade(producer),
                queue: queue.clone(),
            })
        };
        match previous {
            Some(old) => {
                let discarded = old.queue.reset();
                tracing::debug!(discarded, "caption source changed; rebound to new queue");
            }
            None => tracing::debug!("caption source bound"),
        }
        Some(queue)
    }

    /// Drop the binding and discard its queued samples. Returns `false` if already unbound.
    pub fn unbind(&self) -> bool {
        let previous = self.lock().bound.take();
        match previous {
            Some(old) => {
                let discarded = old.queue.reset();
                tracing::debug!(discarded, "caption source unbound");
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::OverlaySample;
    use crate::source::CaptionSinks;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        sinks: CaptionSinks,
        registrations: AtomicUsize,
    }

    impl CaptionSource for Recorder {
        fn register_sink(&self, sink: Arc<SampleQueue>) {
            self.registrations.fetch_add(1, Ordering::Relaxed);
            self.sinks.add(&sink);
        }

        fn rate(&self) -> f32 {
            1.0
        }

        fn time(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn producer() -> (Arc<Recorder>, Arc<dyn CaptionSource>) {
        let concrete = Arc::new(Recorder::default());
        let facade: Arc<dyn CaptionSource> = concrete.clone();
        (concrete, facade)
    }

    fn push(recorder: &Recorder, text: &str) {
        recorder
            .sinks
            .deliver(&OverlaySample::new(Duration::ZERO, text).into_shared());
    }

    fn active(hint: usize) -> SourceBinding {
        let binding = SourceBinding::new(hint);
        binding.activate();
        binding
    }

    #[test]
    fn starts_inactive_and_unbound() {
        let binding = SourceBinding::new(4);
        assert!(!binding.is_active());
        assert!(!binding.is_bound());
        assert!(binding.queue().is_none());
        assert!(!binding.unbind());
        assert!(!binding.deactivate());
    }

    #[test]
    fn activate_reports_transition_once() {
        let binding = SourceBinding::new(4);
        assert!(binding.activate());
        assert!(!binding.activate());
        assert!(binding.deactivate());
        assert!(!binding.deactivate());
    }

    #[test]
    fn bind_registers_new_queue_once() {
        let (recorder, facade) = producer();
        let binding = active(4);

        let queue = binding.bind(&facade).unwrap();
        assert!(binding.is_bound_to(&facade));
        assert_eq!(recorder.registrations.load(Ordering::Relaxed), 1);

        push(&recorder, "a");
        assert_eq!(queue.len(), 1);
        assert!(Arc::ptr_eq(&binding.queue().unwrap(), &queue));
    }

    #[test]
    fn rebind_uses_fresh_queue_and_flushes_old() {
        let (first, first_facade) = producer();
        let (_second, second_facade) = producer();
        let binding = active(4);

        let old = binding.bind(&first_facade).unwrap();
        push(&first, "stale");
        let new = binding.bind(&second_facade).unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert!(old.is_empty());
        assert!(new.is_empty());
        assert!(binding.is_bound_to(&second_facade));
        assert!(!binding.is_bound_to(&first_facade));
    }

    #[test]
    fn unbind_releases_queue_so_producer_prunes_it() {
        let (recorder, facade) = producer();
        let binding = active(4);
        let queue = binding.bind(&facade).unwrap();
        push(&recorder, "pending");
        drop(queue);

        assert!(binding.unbind());
        assert!(!binding.is_bound());
        assert!(binding.is_active());
        assert_eq!(recorder.sinks.live(), 0);
    }

    #[test]
    fn deactivate_tears_down_and_blocks_later_binds() {
        let (recorder, facade) = producer();
        let binding = active(4);
        binding.bind(&facade);
        push(&recorder, "pending");

        assert!(binding.deactivate());
        assert!(!binding.is_bound());
        assert!(binding.bind(&facade).is_none());
        assert!(!binding.is_bound());
        assert_eq!(recorder.registrations.load(Ordering::Relaxed), 2);
        assert_eq!(recorder.sinks.live(), 0);
    }

    /// Deactivates its binding from inside `register_sink`, the window between the
    /// activation check and the swap.
    struct Deactivator {
        binding: Arc<SourceBinding>,
        sinks: CaptionSinks,
    }

    impl CaptionSource for Deactivator {
        fn register_sink(&self, sink: Arc<SampleQueue>) {
            self.sinks.add(&sink);
            self.binding.deactivate();
        }

        fn rate(&self) -> f32 {
            1.0
        }

        fn time(&self) -> Duration {
            Duration::ZERO
        }
    }

    #[test]
    fn deactivation_during_bind_discards_the_new_queue() {
        let binding = Arc::new(active(4));
        let source = Arc::new(Deactivator {
            binding: binding.clone(),
            sinks: CaptionSinks::new(),
        });
        let facade: Arc<dyn CaptionSource> = source.clone();

        assert!(binding.bind(&facade).is_none());
        assert!(!binding.is_active());
        assert!(!binding.is_bound());
        let reached = source
            .sinks
            .deliver(&OverlaySample::new(Duration::ZERO, "late").into_shared());
        assert_eq!(reached, 0);
    }

    #[test]
    fn binding_does_not_keep_producer_alive() {
        let (recorder, facade) = producer();
        let binding = active(4);
        binding.bind(&facade);
        drop(facade);
        drop(recorder);

        assert!(binding.is_bound());
        assert!(binding.bound_producer().is_none());
    }
}
