// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::json;
use understory_event::{Event, EventCategory, EventData, EventHeader, SurfaceId, TargetId};

use crate::dispatcher::HostContext;
use crate::emitter::EventEmitter;
use crate::frame::ManualFrameClock;
use crate::listener::{BatchEventDispatchedListener, EventDispatcherListener};
use crate::queue::ManualQueue;

/// Tags of disposed [`TestEvent`]s, in disposal order.
#[derive(Clone, Debug, Default)]
pub(crate) struct DisposeLog(Arc<Mutex<Vec<u32>>>);

impl DisposeLog {
    pub(crate) fn disposed(&self) -> Vec<u32> {
        self.0.lock().clone()
    }
}

/// An event that records its disposal and carries a tag as payload.
#[derive(Debug)]
pub(crate) struct TestEvent {
    header: EventHeader,
    tag: u32,
    name: &'static str,
    key: i16,
    coalescable: bool,
    log: DisposeLog,
}

impl TestEvent {
    pub(crate) fn new(log: &DisposeLog, tag: u32, name: &'static str, target: i32, t: u64) -> Self {
        Self {
            header: EventHeader::new(SurfaceId(1), TargetId(target), t),
            tag,
            name,
            key: 0,
            coalescable: true,
            log: log.clone(),
        }
    }

    pub(crate) fn uninit(log: &DisposeLog, tag: u32) -> Self {
        Self {
            header: EventHeader::uninit(),
            ..Self::new(log, tag, "topUninit", 0, 0)
        }
    }

    pub(crate) fn with_key(mut self, key: i16) -> Self {
        self.key = key;
        self
    }

    pub(crate) fn discrete(mut self) -> Self {
        self.coalescable = false;
        self
    }

    pub(crate) fn tag_of(event: &dyn Event) -> u32 {
        match event.event_data() {
            EventData::Custom(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(u32::MAX),
            _ => u32::MAX,
        }
    }
}

impl Event for TestEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn event_name(&self) -> &str {
        self.name
    }

    fn event_data(&self) -> EventData {
        EventData::Custom(json!(self.tag))
    }

    fn category(&self) -> EventCategory {
        if self.coalescable {
            EventCategory::Continuous
        } else {
            EventCategory::Discrete
        }
    }

    fn can_coalesce(&self) -> bool {
        self.coalescable
    }

    fn coalescing_key(&self) -> i16 {
        self.key
    }

    fn dispose(self: Box<Self>) {
        self.log.0.lock().push(self.tag);
    }
}

/// One delivered event as seen by the emitter.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Delivered {
    pub(crate) target: TargetId,
    pub(crate) name: String,
    pub(crate) tag: u32,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingEmitter {
    delivered: Mutex<Vec<Delivered>>,
}

impl RecordingEmitter {
    pub(crate) fn tags(&self) -> Vec<u32> {
        self.delivered.lock().iter().map(|d| d.tag).collect()
    }

    pub(crate) fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn receive_event(
        &self,
        _surface_id: SurfaceId,
        target: TargetId,
        event_name: &str,
        _can_coalesce: bool,
        _coalescing_key: i16,
        payload: EventData,
        _category: EventCategory,
    ) {
        let tag = match payload {
            EventData::Custom(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(u32::MAX),
            _ => u32::MAX,
        };
        self.delivered.lock().push(Delivered {
            target,
            name: event_name.to_owned(),
            tag,
        });
    }
}

#[derive(Debug, Default)]
pub(crate) struct BatchCounter(AtomicUsize);

impl BatchCounter {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl BatchEventDispatchedListener for BatchCounter {
    fn on_batch_event_dispatched(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub(crate) struct SeenNames(Mutex<Vec<String>>);

impl SeenNames {
    pub(crate) fn names(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl EventDispatcherListener for SeenNames {
    fn on_event_dispatch(&self, event: &dyn Event) {
        self.0.lock().push(event.event_name().to_owned());
    }
}

/// A single-threaded host: UI queue, consumer queue and clock all pumped by the test thread.
#[derive(Debug)]
pub(crate) struct ManualHost {
    pub(crate) ui: Arc<ManualQueue>,
    pub(crate) consumer: Arc<ManualQueue>,
    pub(crate) clock: Arc<ManualFrameClock>,
    frame_time: AtomicU64,
}

impl ManualHost {
    pub(crate) fn new() -> Self {
        Self {
            ui: Arc::new(ManualQueue::new("ui")),
            consumer: Arc::new(ManualQueue::new("consumer")),
            clock: Arc::new(ManualFrameClock::new()),
            frame_time: AtomicU64::new(0),
        }
    }

    pub(crate) fn context(&self) -> HostContext {
        HostContext {
            ui_queue: self.ui.clone(),
            consumer_queue: self.consumer.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Fire one frame on the UI queue without running the consumer.
    pub(crate) fn tick(&self) {
        let t = self.frame_time.fetch_add(16_666_667, Ordering::SeqCst);
        self.ui.run_pending();
        self.clock.tick(t);
        self.ui.run_pending();
    }

    /// Fire one frame and run whatever it scheduled on the consumer.
    pub(crate) fn frame(&self) {
        self.tick();
        self.consumer.run_pending();
    }
}
