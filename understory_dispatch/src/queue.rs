// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thread-affine task queues.
//!
//! The dispatcher talks to two queues: the UI queue, which owns the frame clock, and the
//! consumer queue, which runs delivery turns. Both are reached through [`TaskQueue`], whose
//! [`run_or_post`](TaskQueue::run_or_post) is the single "run here if already on the queue,
//! otherwise enqueue" primitive the scheduler relies on.
//!
//! Two implementations are provided:
//!
//! - [`MessageQueueThread`]: a dedicated worker thread fed by a channel.
//! - [`ManualQueue`]: a queue bound to the thread that created it and drained explicitly by
//!   the host with [`ManualQueue::run_pending`]. Useful for embedding in an existing event
//!   loop and for deterministic tests.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use understory_dispatch::queue::{ManualQueue, TaskQueue};
//!
//! let queue = ManualQueue::new("ui");
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = Arc::clone(&hits);
//! queue.post(Box::new(move || { h.fetch_add(1, Ordering::SeqCst); })).unwrap();
//! assert_eq!(hits.load(Ordering::SeqCst), 0);
//! assert_eq!(queue.run_pending(), 1);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::QueueError;

/// A unit of work for a [`TaskQueue`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A serial executor bound to one thread.
pub trait TaskQueue: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether the calling thread is the queue's thread.
    fn is_on_queue(&self) -> bool;

    /// Enqueue `task` to run on the queue's thread.
    fn post(&self, task: Task) -> Result<(), QueueError>;

    /// Run `task` inline when already on the queue, otherwise [`post`](Self::post) it.
    fn run_or_post(&self, task: Task) -> Result<(), QueueError> {
        if self.is_on_queue() {
            task();
            Ok(())
        } else {
            self.post(task)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Run `task`, logging a panic instead of unwinding into the queue loop.
fn run_task(queue: &str, task: Task) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        log::error!(
            "task on queue `{queue}` panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

/// A task queue backed by its own worker thread.
///
/// A task that panics is logged and the worker keeps going.
pub struct MessageQueueThread {
    name: String,
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl core::fmt::Debug for MessageQueueThread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageQueueThread")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .field("running", &self.sender.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl MessageQueueThread {
    /// Start a worker thread named `name`.
    pub fn spawn(name: impl Into<String>) -> Result<Self, QueueError> {
        let name = name.into();
        let (sender, receiver): (Sender<Task>, Receiver<Task>) = unbounded();
        let queue_name = name.clone();
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for task in receiver.iter() {
                    run_task(&queue_name, task);
                }
                log::debug!("queue `{queue_name}` drained and stopped");
            })
            .map_err(|source| QueueError::Spawn {
                queue: name.clone(),
                source,
            })?;
        let thread_id = worker.thread().id();
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            thread_id,
        })
    }

    /// Stop accepting tasks, let already queued tasks finish, and join the worker.
    ///
    /// Called from the worker itself, this only closes the queue.
    pub fn quit_synchronous(&self) {
        drop(self.sender.lock().take());
        if self.is_on_queue() {
            return;
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            log::error!("queue `{}` worker exited by panic", self.name);
        }
    }
}

impl TaskQueue for MessageQueueThread {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_on_queue(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn post(&self, task: Task) -> Result<(), QueueError> {
        let closed = || QueueError::Closed {
            queue: self.name.clone(),
        };
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or_else(closed)?;
        sender.send(task).map_err(|_| closed())
    }
}

impl Drop for MessageQueueThread {
    fn drop(&mut self) {
        self.quit_synchronous();
    }
}

/// A task queue pumped by the thread that created it.
///
/// [`is_on_queue`](TaskQueue::is_on_queue) is true on the creating thread only;
/// [`run_pending`](Self::run_pending) should be called from that thread.
pub struct ManualQueue {
    name: String,
    owner: ThreadId,
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl core::fmt::Debug for ManualQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualQueue")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("pending", &self.receiver.len())
            .finish_non_exhaustive()
    }
}

impl ManualQueue {
    /// Create a queue owned by the calling thread.
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            name: name.into(),
            owner: thread::current().id(),
            sender,
            receiver,
        }
    }

    /// Run queued tasks, including ones they enqueue, until the queue is empty.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            run_task(&self.name, task);
            ran += 1;
        }
        ran
    }

    /// Tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl TaskQueue for ManualQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_on_queue(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn post(&self, task: Task) -> Result<(), QueueError> {
        self.sender.send(task).map_err(|_| QueueError::Closed {
            queue: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn run_or_post_runs_inline_on_the_owner_thread() {
        let queue = ManualQueue::new("ui");
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        queue
            .run_or_post(Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn run_or_post_enqueues_from_other_threads() {
        let queue = Arc::new(ManualQueue::new("ui"));
        let q = Arc::clone(&queue);
        thread::spawn(move || {
            assert!(!q.is_on_queue(), "foreign thread is not the owner");
            q.run_or_post(Box::new(|| {})).unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.run_pending(), 1);
    }

    #[test]
    fn worker_thread_runs_tasks_in_order() {
        let queue = MessageQueueThread::spawn("worker").unwrap();
        let (tx, rx) = bounded(3);
        for i in 0..3 {
            let tx = tx.clone();
            queue
                .post(Box::new(move || {
                    tx.send(i).unwrap();
                }))
                .unwrap();
        }
        let got: Vec<i32> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let queue = MessageQueueThread::spawn("worker").unwrap();
        queue.post(Box::new(|| panic!("boom"))).unwrap();
        let (tx, rx) = bounded(1);
        queue
            .post(Box::new(move || {
                tx.send(()).unwrap();
            }))
            .unwrap();
        assert!(
            rx.recv_timeout(Duration::from_secs(5)).is_ok(),
            "worker survives a panicking task"
        );
    }

    #[test]
    fn posting_after_quit_fails() {
        let queue = MessageQueueThread::spawn("worker").unwrap();
        queue.quit_synchronous();
        let err = queue.post(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, QueueError::Closed { ref queue } if queue == "worker"));
        queue.quit_synchronous();
    }

    #[test]
    fn worker_reports_being_on_queue() {
        let queue = Arc::new(MessageQueueThread::spawn("worker").unwrap());
        let (tx, rx) = bounded(1);
        let q = Arc::clone(&queue);
        queue
            .post(Box::new(move || {
                tx.send(q.is_on_queue()).unwrap();
            }))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "task runs on the worker");
        assert!(!queue.is_on_queue(), "test thread is not the worker");
    }
}
