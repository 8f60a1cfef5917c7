// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producer-defined events with a JSON payload.
//!
//! Views that emit their own events (scroll, text input, gesture recognizers) build a
//! [`CustomEvent`] and choose its coalescing behavior up front:
//!
//! ```
//! use serde_json::json;
//! use understory_event::custom::CustomEvent;
//! use understory_event::{Event, EventCategory, SurfaceId, TargetId};
//!
//! let scroll = CustomEvent::new(SurfaceId(1), TargetId(12), 40, "topScroll", json!({ "y": 120.0 }))
//!     .with_category(EventCategory::Continuous);
//! assert!(scroll.can_coalesce());
//!
//! let submit = CustomEvent::new(SurfaceId(1), TargetId(12), 41, "topSubmitEditing", json!({}))
//!     .with_coalescing(false)
//!     .with_category(EventCategory::Discrete);
//! assert!(!submit.can_coalesce());
//! ```

use serde_json::Value;

use crate::event::Event;
use crate::types::{EventCategory, EventData, EventHeader, SurfaceId, TargetId};

/// An event with a producer-chosen name, payload and coalescing behavior.
///
/// Defaults: coalescable, key `0`, [`EventCategory::Unspecified`].
#[derive(Clone, Debug, PartialEq)]
pub struct CustomEvent {
    header: EventHeader,
    name: String,
    payload: Value,
    can_coalesce: bool,
    coalescing_key: i16,
    category: EventCategory,
}

impl CustomEvent {
    /// Create a custom event.
    pub fn new(
        surface_id: SurfaceId,
        target: TargetId,
        timestamp_ms: u64,
        name: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            header: EventHeader::new(surface_id, target, timestamp_ms),
            name: name.into(),
            payload,
            can_coalesce: true,
            coalescing_key: 0,
            category: EventCategory::Unspecified,
        }
    }

    /// Set whether pending events of this name and target may merge.
    #[must_use]
    pub fn with_coalescing(mut self, can_coalesce: bool) -> Self {
        self.can_coalesce = can_coalesce;
        self
    }

    /// Set the sub-grouping key.
    #[must_use]
    pub fn with_coalescing_key(mut self, key: i16) -> Self {
        self.coalescing_key = key;
        self
    }

    /// Set the scheduling category.
    #[must_use]
    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    /// Payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl Event for CustomEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn event_name(&self) -> &str {
        &self.name
    }

    fn event_data(&self) -> EventData {
        EventData::Custom(self.payload.clone())
    }

    fn category(&self) -> EventCategory {
        self.category
    }

    fn can_coalesce(&self) -> bool {
        self.can_coalesce
    }

    fn coalescing_key(&self) -> i16 {
        self.coalescing_key
    }
}
