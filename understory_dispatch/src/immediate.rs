// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immediate dispatcher: deliver on the calling thread, tick batch listeners per frame.
//!
//! There is no staging, no coalescing, and no sorting: every event reaches the emitter in call
//! order, and producers on different threads interleave freely. The frame scheduler only drives
//! [`BatchEventDispatchedListener`]s, once per frame, on the UI queue.

use std::sync::{Arc, Weak};

use understory_event::Event;

use crate::config::DispatcherConfig;
use crate::dispatcher::{EventDispatcher, HostContext, LifecycleListener, check_initialized};
use crate::emitter::{EmitterSlot, EventEmitter, deliver};
use crate::executor::notify_batch_listeners;
use crate::listener::{BatchEventDispatchedListener, EventDispatcherListener, ListenerRegistry};
use crate::scheduler::{FrameScheduler, FrameWork, SchedulerState};

struct Shared {
    config: DispatcherConfig,
    emitter: EmitterSlot,
    listeners: ListenerRegistry<dyn EventDispatcherListener>,
    batch_listeners: ListenerRegistry<dyn BatchEventDispatchedListener>,
    scheduler: Arc<FrameScheduler>,
}

impl FrameWork for Shared {
    fn on_frame(&self) {
        notify_batch_listeners(&self.batch_listeners);
    }
}

/// Dispatcher that delivers every event synchronously, without coalescing.
pub struct ImmediateEventDispatcher {
    shared: Arc<Shared>,
}

impl core::fmt::Debug for ImmediateEventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ImmediateEventDispatcher")
            .field("scheduler", &self.shared.scheduler.state())
            .field("emitter", &self.shared.emitter)
            .field("listeners", &self.shared.listeners)
            .field("batch_listeners", &self.shared.batch_listeners)
            .finish_non_exhaustive()
    }
}

impl ImmediateEventDispatcher {
    /// Create a dispatcher bound to `host`.
    ///
    /// The consumer queue is unused: delivery happens on the producer's thread.
    pub fn new(host: HostContext, config: DispatcherConfig) -> Self {
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let work: Weak<dyn FrameWork> = this.clone();
            Shared {
                config,
                emitter: EmitterSlot::default(),
                listeners: ListenerRegistry::default(),
                batch_listeners: ListenerRegistry::default(),
                scheduler: FrameScheduler::new(work, host.ui_queue, host.clock),
            }
        });
        Self { shared }
    }

    /// Current state of the frame scheduler.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.shared.scheduler.state()
    }
}

impl LifecycleListener for ImmediateEventDispatcher {
    fn on_host_resume(&self) {
        self.shared.scheduler.resume();
    }

    fn on_host_pause(&self) {
        self.shared.scheduler.stop();
    }

    fn on_host_destroy(&self) {
        self.shared.scheduler.stop();
    }
}

impl EventDispatcher for ImmediateEventDispatcher {
    fn dispatch_event(&self, event: Box<dyn Event>) {
        let Some(event) = check_initialized(event, self.shared.config.strict_invariants) else {
            return;
        };
        for listener in self.shared.listeners.snapshot().iter() {
            listener.on_event_dispatch(&*event);
        }
        match self.shared.emitter.load() {
            Some(emitter) => deliver(&**emitter, &*event),
            None => log::debug!(
                "no emitter registered; dropping `{}` for target {:?}",
                event.event_name(),
                event.target()
            ),
        }
        event.dispose();
        self.shared.scheduler.maybe_post_from_non_ui();
    }

    fn dispatch_all_events(&self) {
        self.shared.scheduler.maybe_post_from_non_ui();
    }

    fn add_listener(&self, listener: Arc<dyn EventDispatcherListener>) {
        self.shared.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn EventDispatcherListener>) {
        self.shared.listeners.remove(listener);
    }

    fn add_batch_event_dispatched_listener(&self, listener: Arc<dyn BatchEventDispatchedListener>) {
        self.shared.batch_listeners.add(listener);
    }

    fn remove_batch_event_dispatched_listener(
        &self,
        listener: &Arc<dyn BatchEventDispatchedListener>,
    ) {
        self.shared.batch_listeners.remove(listener);
    }

    fn register_event_emitter(&self, emitter: Box<dyn EventEmitter>) {
        self.shared.emitter.register(emitter);
    }

    fn unregister_event_emitter(&self) {
        self.shared.emitter.unregister();
    }

    fn on_consumer_destroyed(&self) {
        self.shared
            .scheduler
            .stop_synchronously(self.shared.config.teardown_timeout);
        self.shared.emitter.unregister();
    }
}

impl Drop for ImmediateEventDispatcher {
    fn drop(&mut self) {
        self.shared.scheduler.stop();
    }
}
