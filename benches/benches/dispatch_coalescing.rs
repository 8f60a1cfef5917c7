// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_dispatch::frame::ManualFrameClock;
use understory_dispatch::queue::ManualQueue;
use understory_dispatch::{
    BatchingEventDispatcher, DispatcherConfig, EventDispatcher, HostContext,
    ImmediateEventDispatcher,
};
use understory_event::pointer::{
    PointerButtons, PointerCoalescingKey, PointerData, PointerEvent, PointerEventKind,
    PointerSample,
};
use understory_event::pool::{EventPool, POINTER_EVENT_POOL_CAPACITY};
use understory_event::{SurfaceId, TargetId};

struct Host {
    ui: Arc<ManualQueue>,
    consumer: Arc<ManualQueue>,
    clock: Arc<ManualFrameClock>,
}

impl Host {
    fn new() -> Self {
        Self {
            ui: Arc::new(ManualQueue::new("ui")),
            consumer: Arc::new(ManualQueue::new("consumer")),
            clock: Arc::new(ManualFrameClock::new()),
        }
    }

    fn context(&self) -> HostContext {
        HostContext {
            ui_queue: self.ui.clone(),
            consumer_queue: self.consumer.clone(),
            clock: self.clock.clone(),
        }
    }

    fn frame(&self) {
        self.clock.tick(0);
        self.ui.run_pending();
        self.consumer.run_pending();
    }
}

fn moves(
    pool: &EventPool<PointerEvent>,
    n: usize,
    targets: i32,
) -> impl Iterator<Item = Box<PointerEvent>> + '_ {
    let key = PointerCoalescingKey::new();
    (0..n).map(move |i| {
        let t = i as u64;
        PointerEvent::obtain(
            pool,
            PointerSample {
                surface_id: SurfaceId(1),
                target: TargetId(i as i32 % targets),
                kind: PointerEventKind::Move,
                timestamp_ms: t,
                coalescing_key: key.current(),
                data: PointerData {
                    pointer_id: 1,
                    client: Point::new(t as f64, 0.0),
                    buttons: PointerButtons::PRIMARY,
                    ..PointerData::default()
                },
            },
        )
    })
}

fn bench_batching_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching_frame");
    for &(n, targets) in &[(64_usize, 1_i32), (1024, 1), (1024, 64), (1024, 1024)] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("moves_{n}_targets_{targets}"), |b| {
            let host = Host::new();
            let dispatcher = BatchingEventDispatcher::new(host.context(), DispatcherConfig::default());
            let pool = EventPool::new("PointerEvent", POINTER_EVENT_POOL_CAPACITY);
            b.iter_batched(
                || moves(&pool, n, targets).collect::<Vec<_>>(),
                |events| {
                    for e in events {
                        dispatcher.dispatch_event(e);
                    }
                    host.frame();
                    black_box(dispatcher.pending_len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_immediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("immediate");
    let n = 1024_usize;
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("moves_1024", |b| {
        let host = Host::new();
        let dispatcher = ImmediateEventDispatcher::new(host.context(), DispatcherConfig::default());
        let pool = EventPool::new("PointerEvent", POINTER_EVENT_POOL_CAPACITY);
        b.iter_batched(
            || moves(&pool, n, 1).collect::<Vec<_>>(),
            |events| {
                for e in events {
                    dispatcher.dispatch_event(e);
                }
                host.frame();
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_batching_frame, bench_immediate);
criterion_main!(benches);
