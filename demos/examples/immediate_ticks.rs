// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immediate delivery with per-frame batch notifications.
//!
//! Events reach the emitter inside `dispatch_event`, nothing is merged, and the frame clock only
//! drives the "batch dispatched" listener. The host holds the dispatcher as an optional trait
//! object so that it keeps working before one is installed.
//!
//! Run:
//! - `cargo run -p understory_demos --example immediate_ticks`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use understory_dispatch::frame::ManualFrameClock;
use understory_dispatch::queue::ManualQueue;
use understory_dispatch::{
    BatchEventDispatchedListener, DispatcherConfig, EventDispatcher, EventEmitter, HostContext,
    ImmediateEventDispatcher,
};
use understory_event::custom::CustomEvent;
use understory_event::{Event, EventCategory, EventData, SurfaceId, TargetId};

struct Log;

impl EventEmitter for Log {
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
        println!("  delivered {event_name} to {} ({payload:?})", target.0);
    }
}

#[derive(Default)]
struct Ticks(AtomicUsize);

impl BatchEventDispatchedListener for Ticks {
    fn on_batch_event_dispatched(&self) {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        println!("  batch notification #{n}");
    }
}

struct Host {
    dispatcher: Option<Arc<dyn EventDispatcher>>,
}

impl Host {
    fn send(&self, event: Box<dyn Event>) {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch_event(event),
            None => {
                log::debug!("no dispatcher installed, dropping {}", event.event_name());
                event.dispose();
            }
        }
    }
}

fn scroll(target: i32, t: u64, y: i64) -> Box<dyn Event> {
    Box::new(CustomEvent::new(
        SurfaceId(1),
        TargetId(target),
        t,
        "topScroll",
        json!({ "y": y }),
    ))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let ui = Arc::new(ManualQueue::new("ui"));
    let consumer = Arc::new(ManualQueue::new("consumer"));
    let clock = Arc::new(ManualFrameClock::new());

    let mut host = Host { dispatcher: None };
    host.send(scroll(3, 0, 0));

    let dispatcher: Arc<dyn EventDispatcher> = Arc::new(ImmediateEventDispatcher::new(
        HostContext {
            ui_queue: ui.clone(),
            consumer_queue: consumer,
            clock: clock.clone(),
        },
        DispatcherConfig::default(),
    ));
    let ticks = Arc::new(Ticks::default());
    dispatcher.register_event_emitter(Box::new(Log));
    dispatcher.add_batch_event_dispatched_listener(ticks.clone());
    host.dispatcher = Some(dispatcher);

    for frame in 0..3_u64 {
        println!("== Frame {frame} ==");
        for i in 0..3_u64 {
            let y = i64::try_from(frame * 30 + i * 10).unwrap_or(i64::MAX);
            host.send(scroll(3, frame * 16 + i, y));
        }
        clock.tick(frame * 16_666_667);
        ui.run_pending();
    }
    println!("{} batch notifications", ticks.0.load(Ordering::Relaxed));

    if let Some(dispatcher) = host.dispatcher.take() {
        dispatcher.on_consumer_destroyed();
    }
}
