// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staging and dispatch buffers.
//!
//! ## Staging
//!
//! [`StagingBuffer`] is an arrival-ordered list filled by producers. It is drained once per
//! frame and keeps its capacity across cycles.
//!
//! ## Dispatch
//!
//! [`DispatchBuffer`] holds at most one live event per [`EventCookie`]. Slots are
//! `Option`s: an event superseded by a later coalesce leaves a `None` behind, and the winner
//! is appended at the end. Tombstones are never compacted mid-cycle; the whole buffer is
//! cleared after each delivery turn.
//!
//! Non-coalescable events are appended without touching the cookie map, so they can neither
//! absorb nor be absorbed by another event.
//!
//! Both buffers dispose whatever they still hold when dropped.

use std::collections::HashMap;

use understory_event::cookie::{EventCookie, EventTypeRegistry};
use understory_event::{Coalesced, Event};

#[derive(Debug, Default)]
pub(crate) struct StagingBuffer {
    events: Vec<Box<dyn Event>>,
}

impl StagingBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, event: Box<dyn Event>) {
        self.events.push(event);
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    /// Dispose every staged event.
    pub(crate) fn discard(&mut self) -> usize {
        let n = self.events.len();
        for event in self.events.drain(..) {
            event.dispose();
        }
        n
    }
}

impl Drop for StagingBuffer {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Counters from one [`DispatchBuffer::merge`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MergeStats {
    /// Events taken from staging.
    pub(crate) staged: usize,
    /// Events disposed because another event with the same cookie won.
    pub(crate) coalesced: usize,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchBuffer {
    slots: Vec<Option<Box<dyn Event>>>,
    cookie_to_index: HashMap<EventCookie, usize>,
    types: EventTypeRegistry,
}

impl DispatchBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            cookie_to_index: HashMap::with_capacity(capacity),
            types: EventTypeRegistry::new(),
        }
    }

    fn append(&mut self, event: Box<dyn Event>) -> usize {
        self.slots.push(Some(event));
        self.slots.len() - 1
    }

    /// Move every staged event into this buffer in arrival order, coalescing as it goes.
    pub(crate) fn merge(&mut self, staging: &mut StagingBuffer) -> MergeStats {
        let mut stats = MergeStats {
            staged: staging.events.len(),
            coalesced: 0,
        };
        for event in staging.events.drain(..) {
            if !event.can_coalesce() {
                self.append(event);
                continue;
            }

            let cookie =
                self.types
                    .cookie(event.target(), event.event_name(), event.coalescing_key());
            let Some(index) = self.cookie_to_index.get(&cookie).copied() else {
                let index = self.append(event);
                self.cookie_to_index.insert(cookie, index);
                continue;
            };

            let outcome = match self.slots[index].as_deref() {
                Some(incumbent) => event.coalesce(incumbent),
                // The map only points at live slots; a dangling entry behaves like a miss.
                None => Coalesced::Incoming,
            };
            match outcome {
                Coalesced::Incoming => {
                    let superseded = self.slots[index].take();
                    let index = self.append(event);
                    self.cookie_to_index.insert(cookie, index);
                    if let Some(superseded) = superseded {
                        superseded.dispose();
                        stats.coalesced += 1;
                    }
                }
                Coalesced::Incumbent => {
                    event.dispose();
                    stats.coalesced += 1;
                }
            }
        }
        stats
    }

    /// Live (non-tombstone) entries.
    pub(crate) fn live_len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Hand every live event to `deliver` in non-decreasing timestamp order, then clear.
    ///
    /// The sort is stable, so equal timestamps keep buffer order.
    pub(crate) fn drain_ordered(&mut self, mut deliver: impl FnMut(Box<dyn Event>)) -> usize {
        if self.live_len() > 1 {
            self.slots
                .sort_by_key(|slot| slot.as_ref().map_or(u64::MAX, |e| e.timestamp_ms()));
        }
        let mut delivered = 0;
        for event in self.slots.drain(..).flatten() {
            deliver(event);
            delivered += 1;
        }
        self.cookie_to_index.clear();
        delivered
    }

    /// Dispose every buffered event and clear.
    pub(crate) fn discard(&mut self) -> usize {
        self.drain_ordered(|event| event.dispose())
    }
}

impl Drop for DispatchBuffer {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DisposeLog, TestEvent};

    fn merged(events: Vec<TestEvent>) -> (DispatchBuffer, MergeStats) {
        let mut staging = StagingBuffer::with_capacity(4);
        for e in events {
            staging.push(Box::new(e));
        }
        let mut buffer = DispatchBuffer::with_capacity(4);
        let stats = buffer.merge(&mut staging);
        assert_eq!(staging.len(), 0, "merge drains staging");
        (buffer, stats)
    }

    fn drain_ids(buffer: &mut DispatchBuffer) -> Vec<u32> {
        let mut ids = Vec::new();
        buffer.drain_ordered(|e| {
            ids.push(TestEvent::tag_of(&*e));
            e.dispose();
        });
        ids
    }

    #[test]
    fn newer_event_supersedes_older_with_same_cookie() {
        let log = DisposeLog::default();
        let (mut buffer, stats) = merged(vec![
            TestEvent::new(&log, 1, "topTouchMove", 5, 10).with_key(1),
            TestEvent::new(&log, 2, "topTouchMove", 5, 20).with_key(1),
        ]);
        assert_eq!(stats, MergeStats { staged: 2, coalesced: 1 });
        assert_eq!(buffer.live_len(), 1);
        assert_eq!(log.disposed(), vec![1]);
        assert_eq!(drain_ids(&mut buffer), vec![2]);
        assert_eq!(log.disposed(), vec![1, 2]);
    }

    #[test]
    fn older_arrival_loses_to_incumbent_with_newer_timestamp() {
        let log = DisposeLog::default();
        let (mut buffer, _) = merged(vec![
            TestEvent::new(&log, 1, "topScroll", 5, 20),
            TestEvent::new(&log, 2, "topScroll", 5, 10),
        ]);
        assert_eq!(log.disposed(), vec![2]);
        assert_eq!(drain_ids(&mut buffer), vec![1]);
    }

    #[test]
    fn different_keys_do_not_merge() {
        let log = DisposeLog::default();
        let (buffer, stats) = merged(vec![
            TestEvent::new(&log, 1, "topTouchMove", 5, 10).with_key(1),
            TestEvent::new(&log, 2, "topTouchMove", 5, 11).with_key(2),
            TestEvent::new(&log, 3, "topTouchMove", 6, 12).with_key(1),
        ]);
        assert_eq!(stats.coalesced, 0);
        assert_eq!(buffer.live_len(), 3);
    }

    #[test]
    fn non_coalescable_events_all_survive() {
        let log = DisposeLog::default();
        let (mut buffer, _) = merged(vec![
            TestEvent::new(&log, 1, "topClick", 5, 10).discrete(),
            TestEvent::new(&log, 2, "topClick", 5, 10).discrete(),
            TestEvent::new(&log, 3, "topClick", 5, 10).discrete(),
        ]);
        assert!(log.disposed().is_empty(), "nothing superseded");
        assert_eq!(drain_ids(&mut buffer), vec![1, 2, 3]);
    }

    #[test]
    fn non_coalescable_event_is_not_absorbed_by_a_later_coalescable_one() {
        let log = DisposeLog::default();
        let (mut buffer, _) = merged(vec![
            TestEvent::new(&log, 1, "topChange", 5, 10).discrete(),
            TestEvent::new(&log, 2, "topChange", 5, 11),
            TestEvent::new(&log, 3, "topChange", 5, 12),
        ]);
        assert_eq!(log.disposed(), vec![2]);
        assert_eq!(drain_ids(&mut buffer), vec![1, 3]);
    }

    #[test]
    fn delivery_is_sorted_by_timestamp_and_stable() {
        let log = DisposeLog::default();
        let (mut buffer, _) = merged(vec![
            TestEvent::new(&log, 1, "topA", 1, 30),
            TestEvent::new(&log, 2, "topB", 2, 10),
            TestEvent::new(&log, 3, "topC", 3, 20).discrete(),
            TestEvent::new(&log, 4, "topD", 4, 10).discrete(),
            // Supersedes 1, leaving a tombstone at index 0.
            TestEvent::new(&log, 5, "topA", 1, 40),
        ]);
        assert_eq!(drain_ids(&mut buffer), vec![2, 4, 3, 5]);
    }

    #[test]
    fn cookie_map_resets_between_turns() {
        let log = DisposeLog::default();
        let (mut buffer, _) = merged(vec![TestEvent::new(&log, 1, "topA", 1, 1)]);
        assert_eq!(drain_ids(&mut buffer), vec![1]);
        let mut staging = StagingBuffer::with_capacity(1);
        staging.push(Box::new(TestEvent::new(&log, 2, "topA", 1, 0)));
        buffer.merge(&mut staging);
        assert_eq!(drain_ids(&mut buffer), vec![2], "no stale incumbent from the last turn");
    }

    #[test]
    fn dropping_buffers_disposes_everything_once() {
        let log = DisposeLog::default();
        let mut staging = StagingBuffer::with_capacity(2);
        staging.push(Box::new(TestEvent::new(&log, 1, "topA", 1, 1)));
        staging.push(Box::new(TestEvent::new(&log, 2, "topB", 1, 1)));
        let mut buffer = DispatchBuffer::with_capacity(2);
        buffer.merge(&mut staging);
        staging.push(Box::new(TestEvent::new(&log, 3, "topC", 1, 1)));
        drop(staging);
        drop(buffer);
        let mut disposed = log.disposed();
        disposed.sort_unstable();
        assert_eq!(disposed, vec![1, 2, 3]);
    }
}
