// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The consumer-side sink and its atomically swappable slot.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use understory_event::{Event, EventCategory, EventData, SurfaceId, TargetId};

/// Receives delivered events on the consumer thread.
///
/// Called once per surviving event per delivery turn. Failures inside the emitter are the
/// emitter's business; the dispatcher never retries.
pub trait EventEmitter: Send + Sync {
    /// Hand one event to the consumer.
    fn receive_event(
        &self,
        surface_id: SurfaceId,
        target: TargetId,
        event_name: &str,
        can_coalesce: bool,
        coalescing_key: i16,
        payload: EventData,
        category: EventCategory,
    );
}

impl<E: EventEmitter + ?Sized> EventEmitter for Arc<E> {
    fn receive_event(
        &self,
        surface_id: SurfaceId,
        target: TargetId,
        event_name: &str,
        can_coalesce: bool,
        coalescing_key: i16,
        payload: EventData,
        category: EventCategory,
    ) {
        (**self).receive_event(
            surface_id,
            target,
            event_name,
            can_coalesce,
            coalescing_key,
            payload,
            category,
        );
    }
}

/// Publish/clear slot for the registered emitter.
///
/// Readers on the consumer thread race freely against a reattaching consumer.
#[derive(Default)]
pub(crate) struct EmitterSlot {
    current: ArcSwapOption<Box<dyn EventEmitter>>,
}

impl core::fmt::Debug for EmitterSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmitterSlot")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl EmitterSlot {
    pub(crate) fn register(&self, emitter: Box<dyn EventEmitter>) {
        self.current.store(Some(Arc::new(emitter)));
    }

    pub(crate) fn unregister(&self) {
        self.current.store(None);
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.current.load().is_some()
    }

    pub(crate) fn load(&self) -> Option<Arc<Box<dyn EventEmitter>>> {
        self.current.load_full()
    }
}

/// Forward `event` to `emitter`.
pub(crate) fn deliver(emitter: &dyn EventEmitter, event: &dyn Event) {
    emitter.receive_event(
        event.surface_id(),
        event.target(),
        event.event_name(),
        event.can_coalesce(),
        event.coalescing_key(),
        event.event_data(),
        event.category(),
    );
}
