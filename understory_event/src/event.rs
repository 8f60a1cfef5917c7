// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Event`] trait and its coalescing contract.
//!
//! ## Coalescing
//!
//! Two pending events are coalescing candidates when their [cookies](crate::cookie::EventCookie)
//! are equal, i.e. they share target, event name, and [`Event::coalescing_key`].
//! The dispatcher then asks the incoming event which of the two survives via
//! [`Event::coalesce`]. The default keeps the event with the larger timestamp and lets the
//! incoming event win ties, so among equal timestamps the later arrival wins.
//!
//! Events that must never merge (touch start/end/cancel, pointer down/up, clicks) return
//! `false` from [`Event::can_coalesce`]; they reach the consumer exactly once each.
//!
//! ## Disposal
//!
//! [`Event::dispose`] consumes the event, so disposing twice does not compile.
//! Pooled implementations return themselves to their [`EventPool`](crate::pool::EventPool)
//! there; a pool still detects duplicated leases (see [`PoolError`](crate::PoolError)).

use core::fmt::Debug;

use crate::types::{Coalesced, EventCategory, EventData, EventHeader, SurfaceId, TargetId};

/// A unit of UI-originated data relayed to the consumer.
///
/// Implementors provide the header, name, and payload; everything else has defaults
/// matching the common case of a coalescable, latest-wins event.
pub trait Event: Send + Debug {
    /// Identity and timing of the event.
    fn header(&self) -> &EventHeader;

    /// Name the consumer registers handlers under, e.g. `topTouchMove`.
    fn event_name(&self) -> &str;

    /// Payload delivered to the consumer.
    fn event_data(&self) -> EventData;

    /// Scheduling category forwarded to the consumer.
    fn category(&self) -> EventCategory {
        EventCategory::Unspecified
    }

    /// Whether pending events with the same cookie may be merged with this one.
    fn can_coalesce(&self) -> bool {
        true
    }

    /// Sub-grouping key; only events with equal keys may merge. `0` means no sub-grouping.
    fn coalescing_key(&self) -> i16 {
        0
    }

    /// Decide which of `self` (incoming) and `incumbent` survives a merge.
    fn coalesce(&self, incumbent: &dyn Event) -> Coalesced {
        latest_wins(self.header(), incumbent.header())
    }

    /// Release payload resources. Pooled events return themselves to their pool.
    fn dispose(self: Box<Self>) {}

    /// Surface of the target view.
    fn surface_id(&self) -> SurfaceId {
        self.header().surface_id()
    }

    /// Target view.
    fn target(&self) -> TargetId {
        self.header().target()
    }

    /// Monotonic timestamp in milliseconds.
    fn timestamp_ms(&self) -> u64 {
        self.header().timestamp_ms()
    }

    /// Process-unique id of this event instance.
    fn unique_id(&self) -> u64 {
        self.header().unique_id()
    }

    /// Whether the header was initialized; dispatching an uninitialized event is a bug.
    fn is_initialized(&self) -> bool {
        self.header().is_initialized()
    }
}

/// Default coalescing policy: the larger timestamp wins, ties go to the incoming event.
pub fn latest_wins(incoming: &EventHeader, incumbent: &EventHeader) -> Coalesced {
    if incoming.timestamp_ms() >= incumbent.timestamp_ms() {
        Coalesced::Incoming
    } else {
        Coalesced::Incumbent
    }
}
