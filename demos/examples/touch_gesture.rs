// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A two-finger touch gesture on real threads.
//!
//! The UI and consumer queues are worker threads, and frames come from a 60 Hz interval clock.
//! Moves between the same two pointer changes share a coalescing key and merge, so the consumer
//! sees far fewer moves than were produced, but every start and end.
//!
//! Run:
//! - `cargo run -p understory_demos --example touch_gesture`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use kurbo::Point;
use understory_dispatch::frame::{DEFAULT_FRAME_INTERVAL, IntervalFrameClock};
use understory_dispatch::queue::{MessageQueueThread, TaskQueue};
use understory_dispatch::{
    BatchEventDispatchedListener, BatchingEventDispatcher, DispatcherConfig, EventDispatcher,
    EventEmitter, HostContext,
};
use understory_event::coalescing::CoalescingKeyHelper;
use understory_event::pool::{EventPool, TOUCH_EVENT_POOL_CAPACITY};
use understory_event::touch::{MotionAction, TouchEvent, TouchPoint, TouchSample};
use understory_event::{EventCategory, EventData, SurfaceId, TargetId, monotonic_ms};

#[derive(Default)]
struct Tally {
    starts: AtomicUsize,
    moves: AtomicUsize,
    ends: AtomicUsize,
    batches: AtomicUsize,
}

impl EventEmitter for Tally {
    fn receive_event(
        &self,
        _surface_id: SurfaceId,
        _target: TargetId,
        event_name: &str,
        _can_coalesce: bool,
        coalescing_key: i16,
        payload: EventData,
        _category: EventCategory,
    ) {
        let counter = match event_name {
            "topTouchStart" => &self.starts,
            "topTouchMove" => &self.moves,
            _ => &self.ends,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if let EventData::Touch(data) = payload {
            log::info!(
                "{event_name} key={coalescing_key} touches={} changed={:?}",
                data.touches.len(),
                data.changed_indices
            );
        }
    }
}

impl BatchEventDispatchedListener for Tally {
    fn on_batch_event_dispatched(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }
}

fn finger(id: i32, x: f64, y: f64) -> TouchPoint {
    TouchPoint {
        identifier: id,
        target: TargetId(5),
        location: Point::new(x, y),
        page: Point::new(x, y),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ui: Arc<dyn TaskQueue> = Arc::new(MessageQueueThread::spawn("ui").expect("spawn ui"));
    let consumer: Arc<dyn TaskQueue> =
        Arc::new(MessageQueueThread::spawn("consumer").expect("spawn consumer"));
    let clock = Arc::new(IntervalFrameClock::start(&ui, DEFAULT_FRAME_INTERVAL).expect("clock"));
    let dispatcher = BatchingEventDispatcher::new(
        HostContext {
            ui_queue: ui,
            consumer_queue: consumer,
            clock,
        },
        DispatcherConfig::default(),
    );
    let tally = Arc::new(Tally::default());
    dispatcher.register_event_emitter(Box::new(Arc::clone(&tally)));
    dispatcher.add_batch_event_dispatched_listener(tally.clone());

    let pool = EventPool::new("TouchEvent", TOUCH_EVENT_POOL_CAPACITY);
    let mut keys = CoalescingKeyHelper::new();
    let down_time = monotonic_ms();
    let mut produced_moves = 0;
    let mut emit = |action: MotionAction, action_index: usize, touches: Vec<TouchPoint>| {
        let sample = TouchSample {
            surface_id: SurfaceId(1),
            target: TargetId(5),
            action,
            action_index,
            gesture_start_ms: down_time,
            timestamp_ms: monotonic_ms(),
            touches,
        };
        match TouchEvent::obtain(&pool, sample, &mut keys) {
            Ok(event) => dispatcher.dispatch_event(event),
            Err(err) => log::warn!("dropping sample: {err}"),
        }
    };

    emit(MotionAction::Down, 0, vec![finger(0, 10.0, 10.0)]);
    for i in 0..60 {
        emit(MotionAction::Move, 0, vec![finger(0, 10.0, 10.0 + f64::from(i))]);
        produced_moves += 1;
        thread::sleep(Duration::from_millis(1));
    }
    emit(MotionAction::PointerDown, 1, vec![finger(0, 10.0, 70.0), finger(1, 80.0, 80.0)]);
    for i in 0..60 {
        let dy = f64::from(i);
        emit(
            MotionAction::Move,
            0,
            vec![finger(0, 10.0, 70.0 + dy), finger(1, 80.0, 80.0 + dy)],
        );
        produced_moves += 1;
        thread::sleep(Duration::from_millis(1));
    }
    emit(MotionAction::PointerUp, 1, vec![finger(0, 10.0, 130.0), finger(1, 80.0, 140.0)]);
    emit(MotionAction::Up, 0, vec![finger(0, 10.0, 130.0)]);

    thread::sleep(DEFAULT_FRAME_INTERVAL * 4);
    println!(
        "produced {produced_moves} moves; delivered {} starts, {} moves, {} ends in {} batches",
        tally.starts.load(Ordering::Relaxed),
        tally.moves.load(Ordering::Relaxed),
        tally.ends.load(Ordering::Relaxed),
        tally.batches.load(Ordering::Relaxed),
    );
    println!(
        "pool: {} idle, {} outstanding",
        pool.available(),
        pool.outstanding()
    );
    dispatcher.on_consumer_destroyed();
}
