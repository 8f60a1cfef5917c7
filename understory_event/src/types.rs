// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core event types: identifiers, categories, headers, and payloads.
//!
//! ## Overview
//!
//! These types are shared by every [`Event`](crate::event::Event) implementation and by the
//! emitter contract in downstream dispatch crates.
//! An [`EventHeader`] carries the fields the dispatcher indexes unconditionally, so it must be
//! initialized before an event is handed over for dispatch.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use kurbo::Rect;

use crate::pointer::PointerData;
use crate::touch::TouchData;

/// Identifier of the surface (root view) an event belongs to.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SurfaceId(pub i32);

/// Identifier of the view an event targets.
///
/// Only the low 32 bits participate in [cookies](crate::cookie::EventCookie).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TargetId(pub i32);

/// Scheduling category of an event, forwarded to the consumer with every delivery.
///
/// Consumers use the category to pick a priority for the handler invocation:
/// discrete events (clicks, key presses) are urgent, continuous streams can be batched.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum EventCategory {
    /// First event of a continuous stream, e.g. a touch start.
    ContinuousStart,
    /// Last event of a continuous stream, e.g. a touch end or cancel.
    ContinuousEnd,
    /// No category information; the consumer picks a default.
    #[default]
    Unspecified,
    /// A standalone event such as a click.
    Discrete,
    /// An event inside a continuous stream, e.g. a touch move.
    Continuous,
}

/// Outcome of [`Event::coalesce`](crate::event::Event::coalesce).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Coalesced {
    /// The incoming event replaces the incumbent.
    Incoming,
    /// The incumbent stays; the incoming event is discarded.
    Incumbent,
}

static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity and timing shared by every event.
///
/// A header starts out uninitialized (see [`EventHeader::uninit`]), which is the state pooled
/// instances sit in while they wait in a pool. [`EventHeader::init`] assigns a fresh
/// process-unique id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventHeader {
    surface_id: SurfaceId,
    target: TargetId,
    timestamp_ms: u64,
    unique_id: u64,
    initialized: bool,
}

impl Default for EventHeader {
    fn default() -> Self {
        Self::uninit()
    }
}

impl EventHeader {
    /// A header that fails [`is_initialized`](Self::is_initialized).
    pub const fn uninit() -> Self {
        Self {
            surface_id: SurfaceId(-1),
            target: TargetId(-1),
            timestamp_ms: 0,
            unique_id: 0,
            initialized: false,
        }
    }

    /// Create an initialized header.
    pub fn new(surface_id: SurfaceId, target: TargetId, timestamp_ms: u64) -> Self {
        let mut header = Self::uninit();
        header.init(surface_id, target, timestamp_ms);
        header
    }

    /// (Re)initialize the header, assigning a new unique id.
    pub fn init(&mut self, surface_id: SurfaceId, target: TargetId, timestamp_ms: u64) {
        self.surface_id = surface_id;
        self.target = target;
        self.timestamp_ms = timestamp_ms;
        self.unique_id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        self.initialized = true;
    }

    /// Return the header to its uninitialized state.
    pub fn reset(&mut self) {
        *self = Self::uninit();
    }

    /// Surface the target view lives on.
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Target view.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Monotonic timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Process-unique id assigned by the last [`init`](Self::init); `0` while uninitialized.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// True once [`init`](Self::init) ran and the header has not been reset since.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Payload handed to the consumer with each delivered event.
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// No payload.
    None,
    /// Touch points of a touch event.
    Touch(TouchData),
    /// Pointer state of a pointer event.
    Pointer(PointerData),
    /// Layout metrics in the parent's coordinate space.
    Layout(Rect),
    /// Free-form payload of a custom event.
    Custom(serde_json::Value),
}

/// Milliseconds elapsed on a process-wide monotonic clock.
///
/// The epoch is the first call in the process, so values are only comparable within one process.
pub fn monotonic_ms() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
