// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-gesture coalescing keys for touch streams.
//!
//! Touch moves must only merge with moves from the same stretch of a gesture: once another
//! finger goes down or up, earlier moves carry a different pointer set and must still reach
//! the consumer. The helper keeps one small counter per gesture and bumps it on every
//! secondary pointer down/up, so moves before and after the change get different keys.
//!
//! Gestures are identified by their start (down) time, truncated to 32 bits.
//!
//! ```
//! use understory_event::coalescing::CoalescingKeyHelper;
//!
//! let mut keys = CoalescingKeyHelper::new();
//! keys.add(1_000);
//! assert_eq!(keys.get(1_000), Ok(0));
//! keys.increment(1_000).unwrap();
//! assert_eq!(keys.get(1_000), Ok(1));
//! keys.remove(1_000);
//! assert!(!keys.has(1_000));
//! ```

use std::collections::HashMap;

use crate::error::CoalescingKeyError;

/// Gesture start time → coalescing key.
#[derive(Clone, Debug, Default)]
pub struct CoalescingKeyHelper {
    keys: HashMap<i32, i16>,
}

impl CoalescingKeyHelper {
    /// Create an empty helper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a gesture with key `0`.
    pub fn add(&mut self, gesture_start_ms: u64) {
        self.keys.insert(gesture_id(gesture_start_ms), 0);
    }

    /// Bump the key of a tracked gesture.
    pub fn increment(&mut self, gesture_start_ms: u64) -> Result<(), CoalescingKeyError> {
        let gesture = gesture_id(gesture_start_ms);
        let key = self
            .keys
            .get_mut(&gesture)
            .ok_or(CoalescingKeyError::UnknownGesture { gesture })?;
        *key = key.wrapping_add(1);
        Ok(())
    }

    /// Current key of a tracked gesture.
    pub fn get(&self, gesture_start_ms: u64) -> Result<i16, CoalescingKeyError> {
        let gesture = gesture_id(gesture_start_ms);
        self.keys
            .get(&gesture)
            .copied()
            .ok_or(CoalescingKeyError::UnknownGesture { gesture })
    }

    /// Stop tracking a gesture. Unknown gestures are ignored.
    pub fn remove(&mut self, gesture_start_ms: u64) {
        self.keys.remove(&gesture_id(gesture_start_ms));
    }

    /// Whether a gesture is tracked.
    pub fn has(&self, gesture_start_ms: u64) -> bool {
        self.keys.contains_key(&gesture_id(gesture_start_ms))
    }
}

// Two gestures whose start times agree in the low 32 bits share a key.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "Gesture ids are the low 32 bits of the start time."
)]
fn gesture_id(gesture_start_ms: u64) -> i32 {
    gesture_start_ms as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gesture_is_an_error() {
        let mut keys = CoalescingKeyHelper::new();
        assert_eq!(
            keys.get(5),
            Err(CoalescingKeyError::UnknownGesture { gesture: 5 })
        );
        assert!(keys.increment(5).is_err(), "cannot bump an untracked gesture");
    }

    #[test]
    fn gestures_are_tracked_independently() {
        let mut keys = CoalescingKeyHelper::new();
        keys.add(10);
        keys.add(20);
        keys.increment(10).unwrap();
        keys.increment(10).unwrap();
        assert_eq!(keys.get(10), Ok(2));
        assert_eq!(keys.get(20), Ok(0));
    }

    #[test]
    fn readding_a_gesture_resets_its_key() {
        let mut keys = CoalescingKeyHelper::new();
        keys.add(10);
        keys.increment(10).unwrap();
        keys.add(10);
        assert_eq!(keys.get(10), Ok(0));
    }

    #[test]
    fn start_times_alias_on_the_low_32_bits() {
        let mut keys = CoalescingKeyHelper::new();
        keys.add(7);
        assert!(keys.has(7 + (1 << 32)), "truncated ids collide");
    }

    #[test]
    fn key_wraps_instead_of_overflowing() {
        let mut keys = CoalescingKeyHelper::new();
        keys.add(1);
        for _ in 0..=i16::MAX as u32 {
            keys.increment(1).unwrap();
        }
        assert_eq!(keys.get(1), Ok(i16::MIN));
    }
}
