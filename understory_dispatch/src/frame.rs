// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render clocks.
//!
//! A [`FrameClock`] fires one-shot callbacks once per frame on the UI queue, after the UI's own
//! work for the frame. A callback that wants the next frame too posts itself again.
//!
//! - [`ManualFrameClock`]: the host calls [`ManualFrameClock::tick`] from its own frame loop.
//! - [`IntervalFrameClock`]: a ticker thread that posts a tick onto the UI queue at a fixed
//!   interval, but only while callbacks are waiting.
//!
//! Registration is thread-affine: post and remove callbacks from the UI queue.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, bounded, select, tick};
use parking_lot::Mutex;

use crate::error::QueueError;
use crate::queue::TaskQueue;

/// Frame interval of a 60 Hz display.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Work run once per frame.
pub trait FrameCallback: Send + Sync {
    /// Called on the UI queue with the frame time in nanoseconds.
    fn do_frame(&self, frame_time_nanos: u64);
}

/// Per-frame callback registration.
pub trait FrameClock: Send + Sync {
    /// Run `callback` on the next frame, once.
    fn post_frame_callback(&self, callback: Arc<dyn FrameCallback>);

    /// Drop a pending registration of `callback`, if any.
    fn remove_frame_callback(&self, callback: &Arc<dyn FrameCallback>);
}

fn same_callback(a: &Arc<dyn FrameCallback>, b: &Arc<dyn FrameCallback>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// A frame clock driven by explicit [`tick`](Self::tick) calls.
#[derive(Default)]
pub struct ManualFrameClock {
    pending: Mutex<Vec<Arc<dyn FrameCallback>>>,
}

impl core::fmt::Debug for ManualFrameClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualFrameClock")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl ManualFrameClock {
    /// Create a clock with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every callback registered before this call.
    ///
    /// Callbacks posted while ticking wait for the next tick.
    pub fn tick(&self, frame_time_nanos: u64) {
        let due = core::mem::take(&mut *self.pending.lock());
        for callback in due {
            callback.do_frame(frame_time_nanos);
        }
    }

    /// Callbacks waiting for the next tick.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl FrameClock for ManualFrameClock {
    fn post_frame_callback(&self, callback: Arc<dyn FrameCallback>) {
        self.pending.lock().push(callback);
    }

    fn remove_frame_callback(&self, callback: &Arc<dyn FrameCallback>) {
        self.pending.lock().retain(|c| !same_callback(c, callback));
    }
}

/// A frame clock that ticks on a fixed interval.
///
/// The ticker thread holds the UI queue weakly and exits once the clock is dropped or the
/// queue is gone. Dropping the clock does not wait for the ticker.
pub struct IntervalFrameClock {
    frames: Arc<ManualFrameClock>,
    interval: Duration,
    _stop: Sender<()>,
}

impl core::fmt::Debug for IntervalFrameClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntervalFrameClock")
            .field("interval", &self.interval)
            .field("pending", &self.frames.pending_count())
            .finish_non_exhaustive()
    }
}

impl IntervalFrameClock {
    /// Start ticking every `interval`, firing callbacks on `ui_queue`.
    pub fn start(ui_queue: &Arc<dyn TaskQueue>, interval: Duration) -> Result<Self, QueueError> {
        let frames = Arc::new(ManualFrameClock::new());
        // Never sent on; dropping the sender disconnects the channel and wakes the ticker.
        let (stop, stopped) = bounded::<()>(0);
        let thread_name = format!("{}-frames", ui_queue.name());
        let ui_queue: Weak<dyn TaskQueue> = Arc::downgrade(ui_queue);
        let ticker_frames = Arc::clone(&frames);
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let epoch = Instant::now();
                let ticks = tick(interval);
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            if ticker_frames.pending_count() == 0 {
                                continue;
                            }
                            let Some(queue) = ui_queue.upgrade() else {
                                break;
                            };
                            let frames = Arc::clone(&ticker_frames);
                            let now = u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
                            if let Err(err) = queue.post(Box::new(move || frames.tick(now))) {
                                log::debug!("frame ticker stopping: {err}");
                                break;
                            }
                        }
                        recv(stopped) -> _ => break,
                    }
                }
            })
            .map_err(|source| QueueError::Spawn {
                queue: thread_name,
                source,
            })?;
        Ok(Self {
            frames,
            interval,
            _stop: stop,
        })
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for IntervalFrameClock {
    fn post_frame_callback(&self, callback: Arc<dyn FrameCallback>) {
        self.frames.post_frame_callback(callback);
    }

    fn remove_frame_callback(&self, callback: &Arc<dyn FrameCallback>) {
        self.frames.remove_frame_callback(callback);
    }
}
