// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch events.
//!
//! ## Overview
//!
//! A [`TouchEvent`] is built from one platform motion sample ([`TouchSample`]).
//! The motion action decides the touch type, and the per-gesture
//! [`CoalescingKeyHelper`] is updated along the way:
//!
//! | action        | touch type | helper        | coalesces |
//! |---------------|------------|---------------|-----------|
//! | `Down`        | start      | add gesture   | no        |
//! | `PointerDown` | start      | bump key      | no        |
//! | `Move`        | move       | read key      | yes       |
//! | `PointerUp`   | end        | bump key      | no        |
//! | `Up`          | end        | remove        | no        |
//! | `Cancel`      | cancel     | remove        | no        |
//!
//! Only moves coalesce, and only with moves that carry the same key, so a move recorded
//! before a second finger lands never swallows one recorded after.
//!
//! Instances come from an [`EventPool`]; disposing a touch event returns it to its pool.

use kurbo::Point;

use crate::coalescing::CoalescingKeyHelper;
use crate::error::CoalescingKeyError;
use crate::event::Event;
use crate::pool::{EventPool, PoolLease, Poolable};
use crate::types::{EventCategory, EventData, EventHeader, SurfaceId, TargetId};

/// Platform motion action that produced a touch sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MotionAction {
    /// First pointer of a gesture went down.
    Down,
    /// Last pointer of a gesture went up.
    Up,
    /// An additional pointer went down.
    PointerDown,
    /// A pointer other than the last went up.
    PointerUp,
    /// One or more pointers moved.
    Move,
    /// The gesture was aborted.
    Cancel,
}

/// Touch event types as seen by the consumer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TouchEventType {
    /// A pointer went down.
    #[default]
    Start,
    /// A pointer went up.
    End,
    /// Pointers moved.
    Move,
    /// The gesture was aborted.
    Cancel,
}

impl TouchEventType {
    /// Touch type for a motion action.
    pub fn from_action(action: MotionAction) -> Self {
        match action {
            MotionAction::Down | MotionAction::PointerDown => Self::Start,
            MotionAction::Up | MotionAction::PointerUp => Self::End,
            MotionAction::Move => Self::Move,
            MotionAction::Cancel => Self::Cancel,
        }
    }

    /// Event name registered by the consumer.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Start => "topTouchStart",
            Self::End => "topTouchEnd",
            Self::Move => "topTouchMove",
            Self::Cancel => "topTouchCancel",
        }
    }

    /// Scheduling category.
    pub fn category(self) -> EventCategory {
        match self {
            Self::Start => EventCategory::ContinuousStart,
            Self::End | Self::Cancel => EventCategory::ContinuousEnd,
            Self::Move => EventCategory::Continuous,
        }
    }
}

/// One active pointer in a touch event.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchPoint {
    /// Platform pointer id, stable for the lifetime of the pointer.
    pub identifier: i32,
    /// View the pointer went down on.
    pub target: TargetId,
    /// Position relative to `target`.
    pub location: Point,
    /// Position relative to the surface.
    pub page: Point,
}

/// Touch payload: all active pointers plus which of them changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchData {
    /// All pointers active in the sample.
    pub touches: Vec<TouchPoint>,
    /// Indices into `touches` of the pointers this event is about.
    pub changed_indices: Vec<usize>,
}

/// A platform motion sample used to initialize a [`TouchEvent`].
#[derive(Clone, Debug)]
pub struct TouchSample {
    /// Surface the gesture happens on.
    pub surface_id: SurfaceId,
    /// View the gesture targets.
    pub target: TargetId,
    /// What happened.
    pub action: MotionAction,
    /// Index in `touches` of the pointer that went down or up.
    pub action_index: usize,
    /// Time the gesture started; identifies the gesture for coalescing.
    pub gesture_start_ms: u64,
    /// Time of this sample.
    pub timestamp_ms: u64,
    /// All active pointers.
    pub touches: Vec<TouchPoint>,
}

/// A pooled touch event.
#[derive(Clone, Debug, Default)]
pub struct TouchEvent {
    header: EventHeader,
    kind: TouchEventType,
    coalescing_key: i16,
    gesture_start_ms: u64,
    data: TouchData,
    lease: Option<PoolLease<Self>>,
}

impl Poolable for TouchEvent {
    fn reset(&mut self) {
        self.header.reset();
        self.kind = TouchEventType::default();
        self.coalescing_key = 0;
        self.gesture_start_ms = 0;
        self.data.touches.clear();
        self.data.changed_indices.clear();
        self.lease = None;
    }
}

impl TouchEvent {
    /// Obtain an event from `pool` and initialize it from `sample`.
    ///
    /// Fails when the sample continues a gesture that `keys` never saw start,
    /// which means the producer lost track of the gesture.
    pub fn obtain(
        pool: &EventPool<Self>,
        sample: TouchSample,
        keys: &mut CoalescingKeyHelper,
    ) -> Result<Box<Self>, CoalescingKeyError> {
        let gesture = sample.gesture_start_ms;
        let coalescing_key = match sample.action {
            MotionAction::Down => {
                keys.add(gesture);
                0
            }
            MotionAction::Up | MotionAction::Cancel => {
                keys.remove(gesture);
                0
            }
            MotionAction::PointerDown | MotionAction::PointerUp => {
                keys.increment(gesture)?;
                0
            }
            MotionAction::Move => keys.get(gesture)?,
        };

        let kind = TouchEventType::from_action(sample.action);
        let (mut event, lease) = pool.obtain();
        event
            .header
            .init(sample.surface_id, sample.target, sample.timestamp_ms);
        event.kind = kind;
        event.coalescing_key = coalescing_key;
        event.gesture_start_ms = gesture;
        event.data.touches = sample.touches;
        event.data.changed_indices = match kind {
            TouchEventType::Start | TouchEventType::End => {
                if sample.action_index < event.data.touches.len() {
                    vec![sample.action_index]
                } else {
                    Vec::new()
                }
            }
            TouchEventType::Move | TouchEventType::Cancel => {
                (0..event.data.touches.len()).collect()
            }
        };
        event.lease = Some(lease);
        Ok(event)
    }

    /// Touch type.
    pub fn kind(&self) -> TouchEventType {
        self.kind
    }

    /// Start time of the gesture this event belongs to.
    pub fn gesture_start_ms(&self) -> u64 {
        self.gesture_start_ms
    }

    /// Touch payload.
    pub fn data(&self) -> &TouchData {
        &self.data
    }
}

impl Event for TouchEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn event_name(&self) -> &str {
        self.kind.event_name()
    }

    fn event_data(&self) -> EventData {
        EventData::Touch(self.data.clone())
    }

    fn category(&self) -> EventCategory {
        self.kind.category()
    }

    fn can_coalesce(&self) -> bool {
        self.kind == TouchEventType::Move
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::TOUCH_EVENT_POOL_CAPACITY;

    fn point(id: i32, x: f64, y: f64) -> TouchPoint {
        TouchPoint {
            identifier: id,
            target: TargetId(5),
            location: Point::new(x, y),
            page: Point::new(x, y),
        }
    }

    fn sample(action: MotionAction, t: u64, touches: Vec<TouchPoint>) -> TouchSample {
        TouchSample {
            surface_id: SurfaceId(1),
            target: TargetId(5),
            action,
            action_index: 0,
            gesture_start_ms: 100,
            timestamp_ms: t,
            touches,
        }
    }

    fn pool() -> EventPool<TouchEvent> {
        EventPool::new("TouchEvent", TOUCH_EVENT_POOL_CAPACITY)
    }

    #[test]
    fn only_moves_coalesce() {
        let pool = pool();
        let mut keys = CoalescingKeyHelper::new();
        let start =
            TouchEvent::obtain(&pool, sample(MotionAction::Down, 1, vec![point(0, 1., 1.)]), &mut keys)
                .unwrap();
        let moved =
            TouchEvent::obtain(&pool, sample(MotionAction::Move, 2, vec![point(0, 1., 2.)]), &mut keys)
                .unwrap();
        let end =
            TouchEvent::obtain(&pool, sample(MotionAction::Up, 3, vec![point(0, 1., 2.)]), &mut keys)
                .unwrap();
        assert!(!start.can_coalesce(), "start must not coalesce");
        assert!(moved.can_coalesce(), "move must coalesce");
        assert!(!end.can_coalesce(), "end must not coalesce");
        assert_eq!(start.event_name(), "topTouchStart");
        assert_eq!(moved.category(), EventCategory::Continuous);
        assert_eq!(end.category(), EventCategory::ContinuousEnd);
        assert!(!keys.has(100), "up ends gesture tracking");
    }

    #[test]
    fn secondary_pointer_changes_the_move_key() {
        let pool = pool();
        let mut keys = CoalescingKeyHelper::new();
        let one = vec![point(0, 0., 0.)];
        let two = vec![point(0, 0., 0.), point(1, 5., 5.)];
        let _down = TouchEvent::obtain(&pool, sample(MotionAction::Down, 1, one.clone()), &mut keys).unwrap();
        let before = TouchEvent::obtain(&pool, sample(MotionAction::Move, 2, one), &mut keys).unwrap();
        let mut second = sample(MotionAction::PointerDown, 3, two.clone());
        second.action_index = 1;
        let pointer_down = TouchEvent::obtain(&pool, second, &mut keys).unwrap();
        let after = TouchEvent::obtain(&pool, sample(MotionAction::Move, 4, two), &mut keys).unwrap();
        assert_eq!(before.coalescing_key(), 0);
        assert_eq!(after.coalescing_key(), 1);
        assert_eq!(pointer_down.kind(), TouchEventType::Start);
        assert_eq!(pointer_down.data().changed_indices, vec![1]);
        assert_eq!(after.data().changed_indices, vec![0, 1]);
    }

    #[test]
    fn move_without_down_is_rejected() {
        let pool = pool();
        let mut keys = CoalescingKeyHelper::new();
        let err = TouchEvent::obtain(&pool, sample(MotionAction::Move, 2, vec![]), &mut keys)
            .unwrap_err();
        assert_eq!(err, CoalescingKeyError::UnknownGesture { gesture: 100 });
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn dispose_returns_the_instance_to_the_pool() {
        let pool = pool();
        let mut keys = CoalescingKeyHelper::new();
        let e = TouchEvent::obtain(&pool, sample(MotionAction::Down, 1, vec![point(0, 0., 0.)]), &mut keys)
            .unwrap();
        assert_eq!(pool.outstanding(), 1);
        e.dispose();
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);
        let (reused, _lease) = pool.obtain();
        assert!(!reused.is_initialized(), "recycled events come back uninitialized");
        assert!(reused.data().touches.is_empty(), "recycled payload is cleared");
    }

    #[test]
    fn disposing_a_clone_twice_is_caught_by_the_pool() {
        let pool = pool();
        let mut keys = CoalescingKeyHelper::new();
        let e = TouchEvent::obtain(&pool, sample(MotionAction::Down, 1, vec![]), &mut keys).unwrap();
        let copy = e.clone();
        e.dispose();
        copy.dispose();
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);
    }
}
