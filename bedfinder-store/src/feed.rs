//! Ordered fan-out of availability changes to any number of subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bedfinder_core::AvailabilityMap;
use log::debug;
use tokio::sync::mpsc;

type Listener = mpsc::UnboundedSender<Arc<AvailabilityMap>>;

/// Observer list shared by a store and the feeds it hands out.
///
/// Each subscriber owns its own unbounded queue, so every subscriber sees every
/// published mapping in publish order and a slow or dropped subscriber never
/// affects the others.
#[derive(Debug, Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

impl Subscribers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new feed. `initial`, when given, is queued before any later publish.
    pub fn subscribe(self: &Arc<Self>, initial: Option<&AvailabilityMap>) -> AvailabilityFeed {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(initial) = initial {
            // the receiver is alive, so this cannot fail
            let _ = sender.send(Arc::new(initial.clone()));
        }
        self.lock().insert(id, sender);
        debug!("availability subscriber {id} registered");

        AvailabilityFeed {
            id,
            receiver,
            subscribers: Arc::downgrade(self),
        }
    }

    /// Deliver the full mapping to every live subscriber.
    ///
    /// Callers publish while still holding their write lock so that delivery
    /// order matches commit order.
    pub fn publish(&self, availability: &AvailabilityMap) {
        let mut listeners = self.lock();
        if listeners.is_empty() {
            return;
        }
        let shared = Arc::new(availability.clone());
        listeners.retain(|id, sender| {
            let alive = sender.send(Arc::clone(&shared)).is_ok();
            if !alive {
                debug!("availability subscriber {id} went away");
            }
            alive
        });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!("availability subscriber {id} unsubscribed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Listener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Receiving end of an availability subscription.
///
/// Dropping the feed unsubscribes it, which ties the subscription to the
/// lifetime of whatever view owns it.
///
/// The queue is unbounded: every published mapping stays buffered until it is
/// read. A consumer that only needs the current state should call
/// [`latest`](Self::latest) to drain it instead of letting mappings pile up.
#[derive(Debug)]
pub struct AvailabilityFeed {
    id: u64,
    receiver: mpsc::UnboundedReceiver<Arc<AvailabilityMap>>,
    subscribers: Weak<Subscribers>,
}

impl AvailabilityFeed {
    /// Wait for the next mapping. `None` once the store has gone away.
    pub async fn changed(&mut self) -> Option<Arc<AvailabilityMap>> {
        self.receiver.recv().await
    }

    /// Next queued mapping, without waiting.
    pub fn try_changed(&mut self) -> Option<Arc<AvailabilityMap>> {
        self.receiver.try_recv().ok()
    }

    /// Skip to the newest queued mapping, discarding older ones.
    pub fn latest(&mut self) -> Option<Arc<AvailabilityMap>> {
        let mut newest = None;
        while let Ok(map) = self.receiver.try_recv() {
            newest = Some(map);
        }
        newest
    }

    pub fn unsubscribe(self) {}
}

impl Drop for AvailabilityFeed {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(self.id);
        }
    }
}
