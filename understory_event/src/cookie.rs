// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event cookies: the identity used to decide which pending events may merge.
//!
//! A cookie packs three fields into a `u64`:
//!
//! | bits    | field                                  |
//! |---------|----------------------------------------|
//! | 0..32   | target id                              |
//! | 32..48  | event type id (per-registry, see below) |
//! | 48..64  | coalescing key                         |
//!
//! Event type ids are assigned by an [`EventTypeRegistry`] the first time a name is seen.
//! Ids are stable for the lifetime of the registry, and the table only grows.
//!
//! ```
//! use understory_event::cookie::{EventCookie, EventTypeRegistry};
//! use understory_event::TargetId;
//!
//! let mut types = EventTypeRegistry::new();
//! let a = types.cookie(TargetId(5), "topTouchMove", 1);
//! let b = types.cookie(TargetId(5), "topTouchMove", 1);
//! let c = types.cookie(TargetId(5), "topTouchMove", 2);
//! assert_eq!(a, b);
//! assert_ne!(a, c);
//! assert_eq!(a.target(), TargetId(5));
//! ```

use std::collections::HashMap;

use crate::types::TargetId;

/// Packed `(target, event type, coalescing key)` identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EventCookie(u64);

impl EventCookie {
    /// Compose a cookie from its parts.
    #[allow(
        clippy::cast_sign_loss,
        reason = "Target ids and coalescing keys are packed as raw bit patterns."
    )]
    pub const fn new(target: TargetId, event_type: u16, coalescing_key: i16) -> Self {
        let target_bits = target.0 as u32 as u64;
        let type_bits = (event_type as u64) << 32;
        let key_bits = (coalescing_key as u16 as u64) << 48;
        Self(target_bits | type_bits | key_bits)
    }

    /// The raw packed value.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Target id stored in the low 32 bits.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Extracting the packed 32-bit field."
    )]
    pub const fn target(self) -> TargetId {
        TargetId(self.0 as u32 as i32)
    }

    /// Event type id stored in bits 32..48.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Extracting the packed 16-bit field."
    )]
    pub const fn event_type(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Coalescing key stored in the top 16 bits.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Extracting the packed 16-bit field."
    )]
    pub const fn coalescing_key(self) -> i16 {
        (self.0 >> 48) as u16 as i16
    }
}

/// Name → type id table, owned by one dispatcher.
///
/// Ids are handed out in first-seen order starting at `0`. Past `u16::MAX` distinct names the
/// counter wraps and ids alias; event names are static per UI system, so this is not expected.
#[derive(Clone, Debug, Default)]
pub struct EventTypeRegistry {
    ids: HashMap<String, u16>,
    next: u16,
}

impl EventTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, assigning the next one on first sight.
    pub fn type_id(&mut self, name: &str) -> u16 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Cookie for an event with the given target, name and key.
    pub fn cookie(&mut self, target: TargetId, name: &str, coalescing_key: i16) -> EventCookie {
        EventCookie::new(target, self.type_id(name), coalescing_key)
    }

    /// Number of distinct names seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no name has been registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip_through_packing() {
        let c = EventCookie::new(TargetId(42), 7, -3);
        assert_eq!(c.target(), TargetId(42));
        assert_eq!(c.event_type(), 7);
        assert_eq!(c.coalescing_key(), -3);
    }

    #[test]
    fn layout_matches_bit_positions() {
        let c = EventCookie::new(TargetId(1), 2, 3);
        assert_eq!(c.bits(), 1 | (2 << 32) | (3 << 48));
    }

    #[test]
    fn negative_target_stays_in_low_bits() {
        let c = EventCookie::new(TargetId(-1), 0, 0);
        assert_eq!(c.bits(), 0xffff_ffff);
        assert_eq!(c.target(), TargetId(-1));
    }

    #[test]
    fn type_ids_are_assigned_in_first_seen_order_and_stable() {
        let mut types = EventTypeRegistry::new();
        assert!(types.is_empty(), "new registry is empty");
        assert_eq!(types.type_id("topTouchStart"), 0);
        assert_eq!(types.type_id("topTouchMove"), 1);
        assert_eq!(types.type_id("topTouchStart"), 0);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn different_names_on_one_target_get_different_cookies() {
        let mut types = EventTypeRegistry::new();
        let start = types.cookie(TargetId(5), "topTouchStart", 0);
        let end = types.cookie(TargetId(5), "topTouchEnd", 0);
        assert_ne!(start, end);
        assert_eq!(start.target(), end.target());
    }
}
