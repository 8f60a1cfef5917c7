// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dispatcher contract shared by both strategies, and the host collaborators it needs.

use std::sync::Arc;

use understory_event::Event;

use crate::emitter::EventEmitter;
use crate::frame::FrameClock;
use crate::listener::{BatchEventDispatchedListener, EventDispatcherListener};
use crate::queue::TaskQueue;

/// Host application lifecycle hooks.
pub trait LifecycleListener {
    /// The host came to the foreground: re-arm the frame scheduler.
    fn on_host_resume(&self);
    /// The host went to the background: stop arming the frame scheduler.
    fn on_host_pause(&self);
    /// The host is going away: stop the scheduler and release pending events.
    fn on_host_destroy(&self);
}

/// Relays UI events from producer threads to a single consumer.
///
/// ## Contract
///
/// - [`dispatch_event`](Self::dispatch_event) never blocks on delivery and never returns an
///   error. Every [`EventDispatcherListener`] sees the event synchronously, on the calling
///   thread, before anything else happens to it.
/// - Every dispatched event is disposed exactly once, whether it was delivered, superseded,
///   or dropped.
/// - With no emitter registered, events reaching delivery are dropped with a diagnostic.
///
/// The batching strategy ([`BatchingEventDispatcher`](crate::BatchingEventDispatcher))
/// additionally guarantees that:
///
/// - at most one event per `(target, name, coalescing key)` is delivered per turn, and
///   non-coalescable events are delivered exactly once each;
/// - events of one turn are delivered in non-decreasing timestamp order;
/// - at most one delivery turn is in flight.
///
/// The immediate strategy ([`ImmediateEventDispatcher`](crate::ImmediateEventDispatcher))
/// waives those three: it delivers every event, in call order, on the calling thread.
pub trait EventDispatcher: LifecycleListener + Send + Sync {
    /// Hand an event over for delivery.
    ///
    /// # Panics
    ///
    /// If the event's header is uninitialized and
    /// [`strict_invariants`](crate::DispatcherConfig::strict_invariants) is on.
    fn dispatch_event(&self, event: Box<dyn Event>);

    /// Make sure the frame scheduler is armed, without staging anything.
    fn dispatch_all_events(&self);

    /// Observe every dispatched event. Adding the same instance twice has no effect.
    fn add_listener(&self, listener: Arc<dyn EventDispatcherListener>);

    /// Stop observing dispatched events.
    fn remove_listener(&self, listener: &Arc<dyn EventDispatcherListener>);

    /// Observe completed batches. Adding the same instance twice has no effect.
    fn add_batch_event_dispatched_listener(&self, listener: Arc<dyn BatchEventDispatchedListener>);

    /// Stop observing completed batches.
    fn remove_batch_event_dispatched_listener(
        &self,
        listener: &Arc<dyn BatchEventDispatchedListener>,
    );

    /// Attach (or replace) the consumer-side emitter.
    fn register_event_emitter(&self, emitter: Box<dyn EventEmitter>);

    /// Detach the emitter; later deliveries are dropped until one is registered again.
    fn unregister_event_emitter(&self);

    /// The consumer is gone: halt the frame scheduler before returning, detach the emitter,
    /// and release pending events.
    fn on_consumer_destroyed(&self);
}

/// Threads and clock a dispatcher runs against.
#[derive(Clone)]
pub struct HostContext {
    /// Queue that owns the frame clock.
    pub ui_queue: Arc<dyn TaskQueue>,
    /// Queue that runs delivery turns.
    pub consumer_queue: Arc<dyn TaskQueue>,
    /// Per-frame callback registration, used from `ui_queue` only.
    pub clock: Arc<dyn FrameClock>,
}

impl core::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostContext")
            .field("ui_queue", &self.ui_queue.name())
            .field("consumer_queue", &self.consumer_queue.name())
            .finish_non_exhaustive()
    }
}

/// Handle uninitialized events per `strict`: panic, or log and dispose.
///
/// Returns the event back when it is fit for dispatch.
pub(crate) fn check_initialized(
    event: Box<dyn Event>,
    strict: bool,
) -> Option<Box<dyn Event>> {
    if event.is_initialized() {
        return Some(event);
    }
    if strict {
        panic!(
            "dispatched `{}` (target {:?}) before initializing it",
            event.event_name(),
            event.target()
        );
    }
    log::error!(
        "dropping `{}` (target {:?}): dispatched before initializing it",
        event.event_name(),
        event.target()
    );
    event.dispose();
    None
}
