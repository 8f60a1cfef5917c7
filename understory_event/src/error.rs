// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for event pools and gesture bookkeeping.

/// Errors reported when returning an instance to an [`EventPool`](crate::pool::EventPool).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    /// The lease was already released, so the instance was released twice.
    #[error("attempted to release {pool} lease {lease}, which was already released")]
    AlreadyReleased {
        /// Name of the pool.
        pool: &'static str,
        /// Lease id that was released twice.
        lease: u64,
    },
}

/// Errors from the [`CoalescingKeyHelper`](crate::coalescing::CoalescingKeyHelper).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoalescingKeyError {
    /// No gesture was started for this (truncated) start time.
    #[error("no coalescing key tracked for gesture {gesture}")]
    UnknownGesture {
        /// Truncated gesture start time used as the key.
        gesture: i32,
    },
}
