// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Dispatch: frame-synchronized delivery of UI events to a single consumer.
//!
//! ## Overview
//!
//! Producers (usually the UI thread, sometimes others) hand [`Event`](understory_event::Event)s
//! to an [`EventDispatcher`]. A consumer running on its own thread, typically a scripting
//! runtime, receives them through an [`EventEmitter`]. In between, the dispatcher bounds how
//! much work reaches the consumer, whatever the producer's event rate.
//!
//! Three roles are involved, not necessarily three distinct threads:
//!
//! - producers call [`EventDispatcher::dispatch_event`] from any thread;
//! - the UI queue owns the [`FrameClock`](frame::FrameClock) and runs the per-frame work;
//! - the consumer queue runs delivery turns.
//!
//! ## Strategies
//!
//! - [`BatchingEventDispatcher`] stages events, merges them once per frame so that at most one
//!   event per `(target, name, coalescing key)` survives, and delivers each frame's survivors in
//!   one turn, sorted by timestamp.
//! - [`ImmediateEventDispatcher`] delivers every event right away on the calling thread and uses
//!   the frame clock only to notify batch listeners once per frame.
//!
//! Both implement the same [`EventDispatcher`] trait, so hosts can pick one at startup and
//! hold it as `Arc<dyn EventDispatcher>`.
//!
//! ## Hosting
//!
//! A [`HostContext`] bundles the UI queue, the consumer queue, and the frame clock.
//! [`queue::MessageQueueThread`] and [`frame::IntervalFrameClock`] give a self-contained
//! threaded host; [`queue::ManualQueue`] and [`frame::ManualFrameClock`] let an existing event
//! loop drive everything explicitly.
//!
//! ## Diagnostics
//!
//! The crate logs through [`log`]; it never installs a logger.
//!
//! | level   | when                                                        |
//! |---------|-------------------------------------------------------------|
//! | `error` | uninitialized event dropped (lenient mode), task panicked   |
//! | `warn`  | pooled event released twice, teardown timed out, queue gone |
//! | `debug` | event dropped because no emitter is registered              |
//! | `trace` | per-frame merge statistics, per-turn delivery counts        |

mod batching;
mod buffer;
mod config;
mod dispatcher;
mod emitter;
mod error;
mod executor;
mod immediate;
mod listener;
mod scheduler;

pub mod frame;
pub mod queue;

#[cfg(test)]
mod testing;

pub use batching::BatchingEventDispatcher;
pub use config::DispatcherConfig;
pub use dispatcher::{EventDispatcher, HostContext, LifecycleListener};
pub use emitter::EventEmitter;
pub use error::QueueError;
pub use immediate::ImmediateEventDispatcher;
pub use listener::{BatchEventDispatchedListener, EventDispatcherListener};
pub use scheduler::SchedulerState;
