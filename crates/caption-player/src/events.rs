//! `NewCaptionText` notification.
//!
//! Multicast to every subscriber, synchronously, on the frame thread. Listeners are
//! called outside the registry lock, so a listener may subscribe or unsubscribe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`CaptionEvents::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct CaptionEvents {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for CaptionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionEvents")
            .field("listeners", &self.len())
            .finish()
    }
}

impl CaptionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it is called on the frame thread for every delivered caption.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut g = self.listeners.lock().unwrap_or_else(|err| err.into_inner());
        g.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut g = self.listeners.lock().unwrap_or_else(|err| err.into_inner());
        let before = g.len();
        g.retain(|(existing, _)| *existing != id);
        g.len() != before
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener with `text`. Returns how many were called.
    pub fn broadcast(&self, text: &str) -> usize {
        let snapshot: Vec<Listener> = {
            let g = self.listeners.lock().unwrap_or_else(|err| err.into_inner());
            g.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in &snapshot {
            listener(text);
        }
        snapshot.len()
    }
}
