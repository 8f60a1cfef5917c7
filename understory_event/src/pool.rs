// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity free lists for event instances, keyed by event subtype.
//!
//! High-frequency producers (touch and pointer streams) reuse event allocations instead of
//! allocating one box per motion sample.
//!
//! - [`EventPool::obtain`] hands out a boxed instance together with a [`PoolLease`].
//! - [`PoolLease::release`] resets the instance and returns it to the free list, unless the
//!   list is already at capacity, in which case the instance is dropped.
//!
//! The pool keeps a ledger of outstanding leases. Releasing a lease that is not outstanding
//! (for example because a cloned event was disposed twice) is reported as
//! [`PoolError::AlreadyReleased`] instead of corrupting the free list.
//!
//! ```
//! use understory_event::pool::{EventPool, Poolable};
//!
//! #[derive(Default)]
//! struct Sample(u32);
//! impl Poolable for Sample {
//!     fn reset(&mut self) {
//!         self.0 = 0;
//!     }
//! }
//!
//! let pool: EventPool<Sample> = EventPool::new("Sample", 2);
//! let (mut sample, lease) = pool.obtain();
//! sample.0 = 7;
//! assert_eq!(pool.outstanding(), 1);
//! lease.release(sample).unwrap();
//! assert_eq!(pool.outstanding(), 0);
//! assert_eq!(pool.available(), 1);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PoolError;

/// Pool of touch events kept by default.
pub const TOUCH_EVENT_POOL_CAPACITY: usize = 3;

/// Pool of pointer events kept by default.
pub const POINTER_EVENT_POOL_CAPACITY: usize = 6;

/// Types that can be recycled through an [`EventPool`].
pub trait Poolable: Default + Send + 'static {
    /// Clear the instance before it goes back on the free list.
    fn reset(&mut self);
}

struct PoolState<T> {
    free: Vec<Box<T>>,
    outstanding: HashSet<u64>,
    next_lease: u64,
}

struct PoolShared<T> {
    name: &'static str,
    capacity: usize,
    state: Mutex<PoolState<T>>,
}

/// A synchronized free list of `T`.
///
/// Cloning the pool clones a handle to the same free list.
pub struct EventPool<T> {
    shared: Arc<PoolShared<T>>,
}

impl<T> Clone for EventPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> core::fmt::Debug for EventPool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("EventPool")
            .field("name", &self.shared.name)
            .field("capacity", &self.shared.capacity)
            .field("available", &state.free.len())
            .field("outstanding", &state.outstanding.len())
            .finish()
    }
}

impl<T: Poolable> EventPool<T> {
    /// Create a pool that keeps at most `capacity` idle instances.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                name,
                capacity,
                state: Mutex::new(PoolState {
                    free: Vec::with_capacity(capacity),
                    outstanding: HashSet::new(),
                    next_lease: 1,
                }),
            }),
        }
    }

    /// Take an idle instance, or allocate a fresh one when the free list is empty.
    pub fn obtain(&self) -> (Box<T>, PoolLease<T>) {
        let mut state = self.shared.state.lock();
        let item = state.free.pop().unwrap_or_default();
        let id = state.next_lease;
        state.next_lease += 1;
        state.outstanding.insert(id);
        drop(state);
        (
            item,
            PoolLease {
                id,
                pool: Arc::clone(&self.shared),
            },
        )
    }
}

impl<T> EventPool<T> {
    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Maximum number of idle instances kept.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Idle instances ready for reuse.
    pub fn available(&self) -> usize {
        self.shared.state.lock().free.len()
    }

    /// Instances obtained and not yet released.
    pub fn outstanding(&self) -> usize {
        self.shared.state.lock().outstanding.len()
    }
}

/// Proof that an instance was obtained from a pool.
///
/// Leases are cloneable so that pooled events can be cloned; only one clone can be released
/// successfully.
pub struct PoolLease<T> {
    id: u64,
    pool: Arc<PoolShared<T>>,
}

impl<T> Clone for PoolLease<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<T> core::fmt::Debug for PoolLease<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolLease")
            .field("pool", &self.pool.name)
            .field("id", &self.id)
            .finish()
    }
}

impl<T> PartialEq for PoolLease<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.pool, &other.pool)
    }
}

impl<T: Poolable> PoolLease<T> {
    /// Lease id, unique within its pool.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Reset `item` and return it to the pool.
    pub fn release(self, mut item: Box<T>) -> Result<(), PoolError> {
        item.reset();
        let mut state = self.pool.state.lock();
        if !state.outstanding.remove(&self.id) {
            return Err(PoolError::AlreadyReleased {
                pool: self.pool.name,
                lease: self.id,
            });
        }
        if state.free.len() < self.pool.capacity {
            state.free.push(item);
        }
        Ok(())
    }

    /// [`release`](Self::release), logging a failure as a soft error.
    ///
    /// A failed release means some producer disposed the same event twice. The process keeps
    /// running; the duplicate instance is dropped.
    pub fn recycle(self, item: Box<T>) {
        if let Err(err) = self.release(item) {
            log::warn!("{err}");
        }
    }
}
