// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Event: the event model behind batched UI event dispatch.
//!
//! ## Overview
//!
//! UI systems produce events (touches, pointer motion, layout changes, view-specific events)
//! far faster than a scripting consumer can handle them. This crate defines what an event is
//! from the point of view of a dispatcher that buffers, merges and delivers them:
//!
//! - [`Event`]: identity, timestamp, payload, and the coalescing contract
//!   ([`Event::can_coalesce`], [`Event::coalescing_key`], [`Event::coalesce`]).
//! - [`EventCookie`](cookie::EventCookie): the packed `(target, type, key)` identity that
//!   decides which pending events are merge candidates, with a per-dispatcher
//!   [`EventTypeRegistry`](cookie::EventTypeRegistry) for type ids.
//! - [`EventPool`](pool::EventPool): fixed-capacity free lists for high-frequency event kinds,
//!   with double-release detection.
//! - Concrete kinds: [`TouchEvent`](touch::TouchEvent), [`PointerEvent`](pointer::PointerEvent),
//!   [`LayoutEvent`](layout::LayoutEvent), [`CustomEvent`](custom::CustomEvent).
//!
//! Dispatching lives in `understory_dispatch`.
//!
//! ## Example
//!
//! ```
//! use kurbo::Rect;
//! use understory_event::layout::LayoutEvent;
//! use understory_event::{Coalesced, Event, SurfaceId, TargetId};
//!
//! let first = LayoutEvent::new(SurfaceId(1), TargetId(7), 10, Rect::new(0., 0., 50., 20.));
//! let second = LayoutEvent::new(SurfaceId(1), TargetId(7), 12, Rect::new(0., 0., 60., 20.));
//!
//! // Same target, same name, same key: candidates for merging, and the newer one wins.
//! assert_eq!(second.coalesce(&first), Coalesced::Incoming);
//! ```

pub mod coalescing;
pub mod cookie;
pub mod custom;
pub mod error;
pub mod event;
pub mod layout;
pub mod pointer;
pub mod pool;
pub mod touch;
pub mod types;

pub use error::{CoalescingKeyError, PoolError};
pub use event::{Event, latest_wins};
pub use types::{
    Coalesced, EventCategory, EventData, EventHeader, SurfaceId, TargetId, monotonic_ms,
};
