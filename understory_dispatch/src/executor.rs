// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The delivery turn run on the consumer queue.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::buffer::DispatchBuffer;
use crate::emitter::{EmitterSlot, deliver};
use crate::listener::{BatchEventDispatchedListener, ListenerRegistry};

/// One delivery turn.
///
/// 1. Clear `scheduled`, so frames from now on may schedule the next turn.
/// 2. Under the dispatch lock, deliver every buffered event in timestamp order and dispose it.
/// 3. Outside the lock, notify batch listeners once each.
pub(crate) fn run_delivery_turn(
    scheduled: &AtomicBool,
    dispatch: &Mutex<DispatchBuffer>,
    emitter: &EmitterSlot,
    batch_listeners: &ListenerRegistry<dyn BatchEventDispatchedListener>,
) {
    scheduled.store(false, Ordering::Release);

    {
        let mut buffer = dispatch.lock();
        let emitter = emitter.load();
        let delivered = buffer.drain_ordered(|event| {
            match &emitter {
                Some(emitter) => deliver(&***emitter, &*event),
                None => log::debug!(
                    "no emitter registered; dropping `{}` for target {:?}",
                    event.event_name(),
                    event.target()
                ),
            }
            event.dispose();
        });
        if delivered > 0 {
            log::trace!("delivery turn handed {delivered} events to the consumer");
        }
    }

    notify_batch_listeners(batch_listeners);
}

pub(crate) fn notify_batch_listeners(
    listeners: &ListenerRegistry<dyn BatchEventDispatchedListener>,
) {
    for listener in listeners.snapshot().iter() {
        listener.on_batch_event_dispatched();
    }
}
