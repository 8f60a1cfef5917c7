// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame scheduler: a self-reposting frame callback.
//!
//! ## States
//!
//! ```text
//!            arm (UI queue)              frame, not stopping: repost + work
//!   Idle ----------------------> Posted <----------------------------------+
//!    ^                             |  |                                    |
//!    |      frame, stopping        |  +------------------------------------+
//!    +---------- Stopping <--------+
//!                          stop
//! ```
//!
//! While posted, the scheduler re-registers on every frame whether or not there is work,
//! since it cannot know ahead of time whether the next frame will have staged events.
//! A stopped scheduler fires one last time, does no work, and goes idle.
//! Arming a stopped scheduler is a no-op until [`FrameScheduler::resume`].
//!
//! Clock registration only happens on the UI queue; requests from other threads are marshaled
//! there through [`TaskQueue::run_or_post`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::bounded;

use crate::frame::{FrameCallback, FrameClock};
use crate::queue::TaskQueue;

/// Observable state of a dispatcher's frame scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchedulerState {
    /// Not registered with the frame clock.
    Idle,
    /// Registered and waiting for the next frame.
    Posted,
    /// Registered, but the next frame will deregister instead of doing work.
    Stopping,
}

/// Per-frame work owned by a dispatcher.
pub(crate) trait FrameWork: Send + Sync {
    fn on_frame(&self);
}

pub(crate) struct FrameScheduler {
    this: Weak<Self>,
    work: Weak<dyn FrameWork>,
    ui_queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn FrameClock>,
    is_posted: AtomicBool,
    should_stop: AtomicBool,
}

impl core::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("state", &self.state())
            .field("ui_queue", &self.ui_queue.name())
            .finish_non_exhaustive()
    }
}

impl FrameScheduler {
    pub(crate) fn new(
        work: Weak<dyn FrameWork>,
        ui_queue: Arc<dyn TaskQueue>,
        clock: Arc<dyn FrameClock>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            work,
            ui_queue,
            clock,
            is_posted: AtomicBool::new(false),
            should_stop: AtomicBool::new(false),
        })
    }

    pub(crate) fn state(&self) -> SchedulerState {
        match (
            self.is_posted.load(Ordering::Acquire),
            self.should_stop.load(Ordering::Acquire),
        ) {
            (false, _) => SchedulerState::Idle,
            (true, false) => SchedulerState::Posted,
            (true, true) => SchedulerState::Stopping,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.should_stop.load(Ordering::Acquire)
    }

    fn as_callback(&self) -> Option<Arc<dyn FrameCallback>> {
        self.this
            .upgrade()
            .map(|this| this as Arc<dyn FrameCallback>)
    }

    fn post_to_clock(&self) {
        if let Some(callback) = self.as_callback() {
            self.clock.post_frame_callback(callback);
        }
    }

    /// Arm the scheduler. Must run on the UI queue.
    fn maybe_post(&self) {
        if self.should_stop.load(Ordering::Acquire) {
            return;
        }
        if !self.is_posted.swap(true, Ordering::AcqRel) {
            self.post_to_clock();
        }
    }

    /// Arm the scheduler from any thread.
    pub(crate) fn maybe_post_from_non_ui(&self) {
        if self.is_posted.load(Ordering::Acquire) {
            return;
        }
        let this = self.this.clone();
        let arm = Box::new(move || {
            if let Some(this) = this.upgrade() {
                this.maybe_post();
            }
        });
        if let Err(err) = self.ui_queue.run_or_post(arm) {
            log::warn!("could not arm frame scheduler: {err}");
        }
    }

    /// Stop arming. Idempotent; a posted callback fires once more and goes idle.
    pub(crate) fn stop(&self) {
        self.should_stop.store(true, Ordering::Release);
    }

    /// Clear a previous [`stop`](Self::stop) and arm.
    pub(crate) fn resume(&self) {
        self.should_stop.store(false, Ordering::Release);
        self.maybe_post_from_non_ui();
    }

    /// Stop and deregister from the clock on the UI queue, waiting at most `timeout`.
    ///
    /// Returns whether the UI queue confirmed the halt in time.
    pub(crate) fn stop_synchronously(&self, timeout: Duration) -> bool {
        self.stop();
        let this = self.this.clone();
        let (done, halted) = bounded::<()>(1);
        let halt = Box::new(move || {
            if let Some(this) = this.upgrade() {
                this.halt();
            }
            let _ = done.send(());
        });
        if let Err(err) = self.ui_queue.run_or_post(halt) {
            log::warn!("could not halt frame scheduler: {err}");
            return false;
        }
        match halted.recv_timeout(timeout) {
            Ok(()) => true,
            Err(_) => {
                log::warn!(
                    "timed out after {timeout:?} waiting for `{}` to halt the frame scheduler",
                    self.ui_queue.name()
                );
                false
            }
        }
    }

    fn halt(&self) {
        if let Some(callback) = self.as_callback() {
            self.clock.remove_frame_callback(&callback);
        }
        self.is_posted.store(false, Ordering::Release);
    }
}

impl FrameCallback for FrameScheduler {
    fn do_frame(&self, _frame_time_nanos: u64) {
        if self.should_stop.load(Ordering::Acquire) {
            self.is_posted.store(false, Ordering::Release);
            return;
        }
        let Some(work) = self.work.upgrade() else {
            log::trace!("frame scheduler outlived its dispatcher; going idle");
            self.should_stop.store(true, Ordering::Release);
            self.is_posted.store(false, Ordering::Release);
            return;
        };
        self.post_to_clock();
        work.on_frame();
    }
}
