// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer contracts and the copy-on-write registry that holds them.
//!
//! Listeners are read on hot paths (every dispatched event, every delivery turn) and written
//! rarely, so the registry publishes an immutable snapshot through an [`ArcSwap`]. Iterating
//! a snapshot never blocks a concurrent add or remove, and a listener added during iteration
//! is seen from the next notification on.

use std::sync::Arc;

use arc_swap::ArcSwap;
use understory_event::Event;

/// Observes every event handed to a dispatcher, before any batching.
pub trait EventDispatcherListener: Send + Sync {
    /// Called synchronously on the producer's thread.
    fn on_event_dispatch(&self, event: &dyn Event);
}

/// Observes the end of each delivery turn (or frame tick, for the immediate dispatcher).
pub trait BatchEventDispatchedListener: Send + Sync {
    /// Called once per batch, after delivery completed and outside any dispatcher lock.
    fn on_batch_event_dispatched(&self);
}

/// Ordered set of listeners, identified by allocation.
pub(crate) struct ListenerRegistry<L: ?Sized> {
    entries: ArcSwap<Vec<Arc<L>>>,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl<L: ?Sized> core::fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.entries.load().len())
            .finish()
    }
}

fn same<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Append `listener` unless this instance is already registered.
    pub(crate) fn add(&self, listener: Arc<L>) {
        self.entries.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.iter().any(|l| same(l, &listener)) {
                next.push(Arc::clone(&listener));
            }
            next
        });
    }

    /// Remove `listener` if registered.
    pub(crate) fn remove(&self, listener: &Arc<L>) {
        self.entries.rcu(|current| {
            current
                .iter()
                .filter(|l| !same(l, listener))
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    /// Current listeners in registration order.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        self.entries.load_full()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl BatchEventDispatchedListener for Counting {
        fn on_batch_event_dispatched(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registration_is_idempotent_per_instance() {
        let registry: ListenerRegistry<dyn BatchEventDispatchedListener> = ListenerRegistry::default();
        let a: Arc<dyn BatchEventDispatchedListener> = Arc::new(Counting::default());
        let b: Arc<dyn BatchEventDispatchedListener> = Arc::new(Counting::default());
        registry.add(Arc::clone(&a));
        registry.add(Arc::clone(&a));
        registry.add(Arc::clone(&b));
        assert_eq!(registry.len(), 2);
        registry.remove(&a);
        assert_eq!(registry.len(), 1);
        assert!(same(&registry.snapshot()[0], &b), "b remains");
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let registry: ListenerRegistry<dyn BatchEventDispatchedListener> = ListenerRegistry::default();
        let a: Arc<dyn BatchEventDispatchedListener> = Arc::new(Counting::default());
        registry.add(Arc::clone(&a));
        let snapshot = registry.snapshot();
        registry.remove(&a);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry: ListenerRegistry<Counting> = ListenerRegistry::default();
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        registry.add(Arc::clone(&first));
        registry.add(Arc::clone(&second));
        let snapshot = registry.snapshot();
        assert!(Arc::ptr_eq(&snapshot[0], &first), "first stays first");
        assert!(Arc::ptr_eq(&snapshot[1], &second), "second stays second");
    }
}
