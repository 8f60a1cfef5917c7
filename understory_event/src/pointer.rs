// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer events (W3C-style pointer stream).
//!
//! Unlike touch events, pointer events take their coalescing key from the producer.
//! A producer keeps one [`PointerCoalescingKey`] and bumps it whenever the stream changes
//! meaning: on every down and up, and whenever the hovered path changes. Moves recorded
//! between two bumps share a key and may merge; moves on opposite sides of a bump never do.

use kurbo::Point;

use crate::event::Event;
use crate::pool::{EventPool, PoolLease, Poolable};
use crate::types::{EventCategory, EventData, EventHeader, SurfaceId, TargetId};

bitflags::bitflags! {
    /// Pressed pointer buttons.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u8 {
        /// Primary button (left mouse button, touch contact, pen contact).
        const PRIMARY   = 0b0000_0001;
        /// Secondary button (right mouse button, pen barrel).
        const SECONDARY = 0b0000_0010;
        /// Auxiliary button (middle mouse button).
        const AUXILIARY = 0b0000_0100;
        /// Back button.
        const BACK      = 0b0000_1000;
        /// Forward button.
        const FORWARD   = 0b0001_0000;
    }
}

/// Device class of a pointer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PointerType {
    /// Mouse or trackpad.
    #[default]
    Mouse,
    /// Finger on a touch screen.
    Touch,
    /// Stylus.
    Pen,
}

/// Pointer event kinds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PointerEventKind {
    /// A button was pressed or contact started.
    Down,
    /// A button was released or contact ended.
    Up,
    /// The pointer moved.
    #[default]
    Move,
    /// The stream was aborted.
    Cancel,
    /// The pointer entered a view (does not bubble).
    Enter,
    /// The pointer left a view (does not bubble).
    Leave,
    /// The pointer moved over a view.
    Over,
    /// The pointer moved out of a view.
    Out,
}

impl PointerEventKind {
    /// Event name registered by the consumer.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Down => "topPointerDown",
            Self::Up => "topPointerUp",
            Self::Move => "topPointerMove",
            Self::Cancel => "topPointerCancel",
            Self::Enter => "topPointerEnter",
            Self::Leave => "topPointerLeave",
            Self::Over => "topPointerOver",
            Self::Out => "topPointerOut",
        }
    }

    /// Scheduling category.
    pub fn category(self) -> EventCategory {
        match self {
            Self::Down => EventCategory::ContinuousStart,
            Self::Up | Self::Cancel => EventCategory::ContinuousEnd,
            Self::Move => EventCategory::Continuous,
            Self::Enter | Self::Leave | Self::Over | Self::Out => EventCategory::Discrete,
        }
    }
}

/// Pointer payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerData {
    /// Platform pointer id.
    pub pointer_id: i32,
    /// Device class.
    pub pointer_type: PointerType,
    /// Position relative to the surface.
    pub client: Point,
    /// Position relative to the target view.
    pub offset: Point,
    /// Buttons held down.
    pub buttons: PointerButtons,
    /// Normalized pressure in `0.0..=1.0`.
    pub pressure: f64,
    /// Whether this is the primary pointer of its type.
    pub is_primary: bool,
}

/// A platform pointer sample used to initialize a [`PointerEvent`].
#[derive(Clone, Debug)]
pub struct PointerSample {
    /// Surface the pointer is over.
    pub surface_id: SurfaceId,
    /// View the event targets.
    pub target: TargetId,
    /// What happened.
    pub kind: PointerEventKind,
    /// Time of this sample.
    pub timestamp_ms: u64,
    /// Key from the producer's [`PointerCoalescingKey`].
    pub coalescing_key: i16,
    /// Pointer state.
    pub data: PointerData,
}

/// A pooled pointer event.
#[derive(Clone, Debug, Default)]
pub struct PointerEvent {
    header: EventHeader,
    kind: PointerEventKind,
    coalescing_key: i16,
    data: PointerData,
    lease: Option<PoolLease<Self>>,
}

impl Poolable for PointerEvent {
    fn reset(&mut self) {
        self.header.reset();
        self.kind = PointerEventKind::default();
        self.coalescing_key = 0;
        self.data = PointerData::default();
        self.lease = None;
    }
}

impl PointerEvent {
    /// Obtain an event from `pool` and initialize it from `sample`.
    pub fn obtain(pool: &EventPool<Self>, sample: PointerSample) -> Box<Self> {
        let (mut event, lease) = pool.obtain();
        event
            .header
            .init(sample.surface_id, sample.target, sample.timestamp_ms);
        event.kind = sample.kind;
        event.coalescing_key = sample.coalescing_key;
        event.data = sample.data;
        event.lease = Some(lease);
        event
    }

    /// Pointer event kind.
    pub fn kind(&self) -> PointerEventKind {
        self.kind
    }

    /// Pointer payload.
    pub fn data(&self) -> &PointerData {
        &self.data
    }
}

impl Event for PointerEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn event_name(&self) -> &str {
        self.kind.event_name()
    }

    fn event_data(&self) -> EventData {
        EventData::Pointer(self.data.clone())
    }

    fn category(&self) -> EventCategory {
        self.kind.category()
    }

    fn can_coalesce(&self) -> bool {
        self.kind == PointerEventKind::Move
    }

    fn coalescing_key(&self) -> i16 {
        self.coalescing_key
    }

    fn dispose(mut self: Box<Self>) {
        if let Some(lease) = self.lease.take() {
            lease.recycle(self);
        }
    }
}

/// Producer-side coalescing key for a pointer stream.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PointerCoalescingKey {
    counter: u32,
}

impl PointerCoalescingKey {
    /// Start at key `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new coalescing span.
    pub fn increment(&mut self) {
        self.counter = (self.counter + 1) % i32::MAX as u32;
    }

    /// Key for events in the current span (low 16 bits of the counter).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Cookies only carry 16 bits of coalescing key."
    )]
    pub fn current(&self) -> i16 {
        (self.counter & 0xffff) as u16 as i16
    }
}
