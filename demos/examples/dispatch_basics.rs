// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batching basics.
//!
//! A single-threaded host pumps the UI queue, the frame clock and the consumer queue by hand.
//! Ten layout changes of one view collapse into one delivery, a discrete custom event is kept
//! as is, and everything arrives in timestamp order.
//!
//! Run:
//! - `cargo run -p understory_demos --example dispatch_basics`
//! - `RUST_LOG=trace cargo run -p understory_demos --example dispatch_basics` for merge stats

use std::sync::Arc;

use kurbo::Rect;
use serde_json::json;
use understory_dispatch::frame::ManualFrameClock;
use understory_dispatch::queue::ManualQueue;
use understory_dispatch::{
    BatchingEventDispatcher, DispatcherConfig, EventDispatcher, EventEmitter, HostContext,
};
use understory_event::custom::CustomEvent;
use understory_event::layout::LayoutEvent;
use understory_event::{EventCategory, EventData, SurfaceId, TargetId};

struct PrintEmitter;

impl EventEmitter for PrintEmitter {
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
        println!(
            "  surface {} target {:>3} {event_name:<18} coalesce={can_coalesce} key={coalescing_key} {category:?}",
            surface_id.0, target.0
        );
        match payload {
            EventData::Layout(frame) => println!("    frame {frame:?}"),
            EventData::Custom(value) => println!("    payload {value}"),
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let ui = Arc::new(ManualQueue::new("ui"));
    let consumer = Arc::new(ManualQueue::new("consumer"));
    let clock = Arc::new(ManualFrameClock::new());
    let dispatcher = BatchingEventDispatcher::new(
        HostContext {
            ui_queue: ui.clone(),
            consumer_queue: consumer.clone(),
            clock: clock.clone(),
        },
        DispatcherConfig::default(),
    );
    dispatcher.register_event_emitter(Box::new(PrintEmitter));

    let surface = SurfaceId(1);
    for t in 0..10_u32 {
        let w = 100.0 + f64::from(t) * 4.0;
        dispatcher.dispatch_event(Box::new(LayoutEvent::new(
            surface,
            TargetId(7),
            u64::from(t) + 10,
            Rect::new(0.0, 0.0, w, 40.0),
        )));
    }
    dispatcher.dispatch_event(Box::new(
        CustomEvent::new(surface, TargetId(12), 3, "topSubmitEditing", json!({ "text": "hi" }))
            .with_coalescing(false)
            .with_category(EventCategory::Discrete),
    ));

    println!("== Before the frame: {} pending ==", dispatcher.pending_len());
    clock.tick(0);
    ui.run_pending();
    println!("== After the frame: {} pending ==", dispatcher.pending_len());
    println!("== Delivery turn ==");
    consumer.run_pending();
    println!("== Done: {} pending ==", dispatcher.pending_len());
}
