// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by task queues.

/// Failure to run work on a [`TaskQueue`](crate::queue::TaskQueue).
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue stopped accepting tasks.
    #[error("queue `{queue}` is closed")]
    Closed {
        /// Queue name.
        queue: String,
    },
    /// The worker thread could not be started.
    #[error("failed to spawn thread for queue `{queue}`")]
    Spawn {
        /// Queue name.
        queue: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },
}
