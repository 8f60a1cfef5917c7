// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The batching dispatcher: stage, coalesce per frame, deliver in timestamp order.
//!
//! ## Flow
//!
//! 1. [`dispatch_event`](EventDispatcher::dispatch_event) notifies listeners, appends the
//!    event to the staging buffer, and arms the frame scheduler.
//! 2. On every frame, staged events are merged into the dispatch buffer (staging lock, then
//!    dispatch lock), and a delivery turn is posted to the consumer queue unless one is already
//!    pending.
//! 3. The delivery turn sorts, delivers, disposes, and notifies batch listeners.
//!
//! Staging and delivery take different locks, so producers never wait for a delivery turn.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use understory_dispatch::{
//!     BatchingEventDispatcher, DispatcherConfig, EventDispatcher, HostContext,
//!     frame::ManualFrameClock, queue::ManualQueue,
//! };
//! use understory_event::layout::LayoutEvent;
//! use understory_event::{SurfaceId, TargetId};
//!
//! let ui = Arc::new(ManualQueue::new("ui"));
//! let consumer = Arc::new(ManualQueue::new("consumer"));
//! let clock = Arc::new(ManualFrameClock::new());
//! let dispatcher = BatchingEventDispatcher::new(
//!     HostContext { ui_queue: ui.clone(), consumer_queue: consumer.clone(), clock: clock.clone() },
//!     DispatcherConfig::default(),
//! );
//!
//! for t in 0..10 {
//!     let frame = kurbo::Rect::new(0., 0., 10. + t as f64, 10.);
//!     dispatcher.dispatch_event(Box::new(LayoutEvent::new(SurfaceId(1), TargetId(3), t, frame)));
//! }
//! clock.tick(0);
//! assert_eq!(dispatcher.pending_len(), 1);
//! consumer.run_pending();
//! assert_eq!(dispatcher.pending_len(), 0);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use understory_event::Event;

use crate::buffer::{DispatchBuffer, StagingBuffer};
use crate::config::DispatcherConfig;
use crate::dispatcher::{EventDispatcher, HostContext, LifecycleListener, check_initialized};
use crate::emitter::{EmitterSlot, EventEmitter};
use crate::executor::run_delivery_turn;
use crate::listener::{BatchEventDispatchedListener, EventDispatcherListener, ListenerRegistry};
use crate::queue::TaskQueue;
use crate::scheduler::{FrameScheduler, FrameWork, SchedulerState};

struct Shared {
    this: Weak<Self>,
    config: DispatcherConfig,
    staging: Mutex<StagingBuffer>,
    dispatch: Mutex<DispatchBuffer>,
    has_dispatch_scheduled: AtomicBool,
    emitter: EmitterSlot,
    listeners: ListenerRegistry<dyn EventDispatcherListener>,
    batch_listeners: ListenerRegistry<dyn BatchEventDispatchedListener>,
    consumer_queue: Arc<dyn TaskQueue>,
    scheduler: Arc<FrameScheduler>,
}

impl Shared {
    fn discard_pending(&self) -> usize {
        let mut staging = self.staging.lock();
        let mut dispatch = self.dispatch.lock();
        staging.discard() + dispatch.discard()
    }

    fn schedule_delivery(&self) {
        if self.has_dispatch_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.this.clone();
        let turn = Box::new(move || {
            if let Some(this) = this.upgrade() {
                run_delivery_turn(
                    &this.has_dispatch_scheduled,
                    &this.dispatch,
                    &this.emitter,
                    &this.batch_listeners,
                );
            }
        });
        if let Err(err) = self.consumer_queue.post(turn) {
            self.has_dispatch_scheduled.store(false, Ordering::Release);
            log::warn!("could not schedule a delivery turn: {err}");
        }
    }
}

impl FrameWork for Shared {
    fn on_frame(&self) {
        let stats = {
            let mut staging = self.staging.lock();
            let mut dispatch = self.dispatch.lock();
            dispatch.merge(&mut staging)
        };
        if stats.staged > 0 {
            log::trace!(
                "merged {} staged events, {} coalesced away",
                stats.staged,
                stats.coalesced
            );
        }
        self.schedule_delivery();
    }
}

/// Dispatcher that coalesces events per frame and delivers them in timestamp order.
///
/// Dropping the dispatcher stops its scheduler and disposes every pending event.
pub struct BatchingEventDispatcher {
    shared: Arc<Shared>,
}

impl core::fmt::Debug for BatchingEventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BatchingEventDispatcher")
            .field("scheduler", &self.shared.scheduler.state())
            .field("staged", &self.shared.staging.lock().len())
            .field("buffered", &self.shared.dispatch.lock().live_len())
            .field("emitter", &self.shared.emitter)
            .field("listeners", &self.shared.listeners)
            .field("batch_listeners", &self.shared.batch_listeners)
            .finish_non_exhaustive()
    }
}

impl BatchingEventDispatcher {
    /// Create a dispatcher bound to `host`. The scheduler arms on the first dispatched event.
    pub fn new(host: HostContext, config: DispatcherConfig) -> Self {
        let HostContext {
            ui_queue,
            consumer_queue,
            clock,
        } = host;
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let work: Weak<dyn FrameWork> = this.clone();
            Shared {
                this: this.clone(),
                staging: Mutex::new(StagingBuffer::with_capacity(config.initial_capacity)),
                dispatch: Mutex::new(DispatchBuffer::with_capacity(config.initial_capacity)),
                has_dispatch_scheduled: AtomicBool::new(false),
                emitter: EmitterSlot::default(),
                listeners: ListenerRegistry::default(),
                batch_listeners: ListenerRegistry::default(),
                consumer_queue,
                scheduler: FrameScheduler::new(work, ui_queue, clock),
                config,
            }
        });
        Self { shared }
    }

    /// Current state of the frame scheduler.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.shared.scheduler.state()
    }

    /// Events staged or buffered and not yet delivered.
    pub fn pending_len(&self) -> usize {
        let staged = self.shared.staging.lock().len();
        staged + self.shared.dispatch.lock().live_len()
    }

    /// Whether a delivery turn is queued on the consumer and has not started yet.
    pub fn has_dispatch_scheduled(&self) -> bool {
        self.shared.has_dispatch_scheduled.load(Ordering::Acquire)
    }
}

impl LifecycleListener for BatchingEventDispatcher {
    fn on_host_resume(&self) {
        self.shared.scheduler.resume();
    }

    fn on_host_pause(&self) {
        self.shared.scheduler.stop();
    }

    fn on_host_destroy(&self) {
        self.shared.scheduler.stop();
        let discarded = self.shared.discard_pending();
        if discarded > 0 {
            log::debug!("host destroyed; discarded {discarded} pending events");
        }
    }
}

impl EventDispatcher for BatchingEventDispatcher {
    fn dispatch_event(&self, event: Box<dyn Event>) {
        let Some(event) = check_initialized(event, self.shared.config.strict_invariants) else {
            return;
        };
        for listener in self.shared.listeners.snapshot().iter() {
            listener.on_event_dispatch(&*event);
        }
        self.shared.staging.lock().push(event);
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
        let discarded = self.shared.discard_pending();
        if discarded > 0 {
            log::debug!("consumer destroyed; discarded {discarded} pending events");
        }
    }
}

impl Drop for BatchingEventDispatcher {
    fn drop(&mut self) {
        self.shared.scheduler.stop();
        self.shared.discard_pending();
    }
}
