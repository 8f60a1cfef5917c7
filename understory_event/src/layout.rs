// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout change notifications.

use kurbo::Rect;

use crate::event::Event;
use crate::types::{EventData, EventHeader, SurfaceId, TargetId};

/// Name of layout events.
pub const LAYOUT_EVENT_NAME: &str = "topLayout";

/// A view's frame changed.
///
/// Layout events coalesce with the default policy: only the latest frame of a view reaches
/// the consumer in any one delivery turn.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEvent {
    header: EventHeader,
    frame: Rect,
}

impl LayoutEvent {
    /// Create a layout event for `target` with its new frame in parent coordinates.
    pub fn new(surface_id: SurfaceId, target: TargetId, timestamp_ms: u64, frame: Rect) -> Self {
        Self {
            header: EventHeader::new(surface_id, target, timestamp_ms),
            frame,
        }
    }

    /// New frame of the view.
    pub fn frame(&self) -> Rect {
        self.frame
    }
}

impl Event for LayoutEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn event_name(&self) -> &str {
        LAYOUT_EVENT_NAME
    }

    fn event_data(&self) -> EventData {
        EventData::Layout(self.frame)
    }
}
