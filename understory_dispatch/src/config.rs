// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher configuration.

use std::time::Duration;

/// Tunables shared by both dispatcher strategies.
///
/// ```
/// use std::time::Duration;
/// use understory_dispatch::DispatcherConfig;
///
/// let config = DispatcherConfig::default()
///     .with_initial_capacity(64)
///     .with_teardown_timeout(Duration::from_millis(250));
/// assert_eq!(config.initial_capacity, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Starting capacity of the staging and dispatch buffers.
    pub initial_capacity: usize,
    /// Panic when an uninitialized event is dispatched, instead of logging and dropping it.
    pub strict_invariants: bool,
    /// How long consumer teardown waits for the UI queue to halt the frame scheduler.
    pub teardown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            strict_invariants: cfg!(debug_assertions),
            teardown_timeout: Duration::from_secs(1),
        }
    }
}

impl DispatcherConfig {
    /// Set [`initial_capacity`](Self::initial_capacity).
    #[must_use]
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Set [`strict_invariants`](Self::strict_invariants).
    #[must_use]
    pub fn with_strict_invariants(mut self, strict: bool) -> Self {
        self.strict_invariants = strict;
        self
    }

    /// Set [`teardown_timeout`](Self::teardown_timeout).
    #[must_use]
    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }
}
