// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_event::TargetId;
use understory_event::cookie::EventTypeRegistry;

const NAMES: [&str; 8] = [
    "topTouchStart",
    "topTouchMove",
    "topTouchEnd",
    "topTouchCancel",
    "topPointerMove",
    "topLayout",
    "topScroll",
    "topChange",
];

fn bench_cookies(c: &mut Criterion) {
    let mut group = c.benchmark_group("cookies");
    group.throughput(Throughput::Elements(1024));
    group.bench_function("warm_registry_1024", |b| {
        let mut types = EventTypeRegistry::new();
        for name in NAMES {
            types.type_id(name);
        }
        b.iter(|| {
            let mut acc = 0_u64;
            for i in 0..1024_i32 {
                let name = NAMES[(i as usize) % NAMES.len()];
                let cookie = types.cookie(TargetId(i & 63), name, (i & 3) as i16);
                acc ^= cookie.bits();
            }
            black_box(acc)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cookies);
criterion_main!(benches);
