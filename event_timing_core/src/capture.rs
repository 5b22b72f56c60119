// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event capture and interaction id assignment.
//!
//! [`EventCapturer::init`] attaches one capture-phase listener per
//! [`EventKind::TRACKED`] entry, once. For every dispatched event the host
//! then hands a [`RawEvent`] to the observer, which passes it to
//! [`EventCapturer::capture`] to stamp it and assign its interaction.

use crate::event::EventKind;
use crate::host::Host;
use crate::measure::{InteractionId, InteractionMeasure};
use crate::time::HostTime;

/// An input event as delivered by the host's listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent<T> {
    /// The event type.
    pub kind: EventKind,
    /// The event's own timestamp (`Event.timeStamp`).
    pub event_time: HostTime,
    /// The event's target.
    pub target: T,
}

/// Result of capturing one event.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome<T> {
    /// The event was assigned to an open interaction.
    Accepted(InteractionMeasure<T>),
    /// The event belongs to an interaction that was already flushed.
    Dropped {
        /// The event type.
        kind: EventKind,
        /// The retired interaction it would have joined.
        interaction_id: InteractionId,
    },
}

/// Assigns interaction ids and builds measures.
#[derive(Clone, Debug, Default)]
pub struct EventCapturer {
    initialized: bool,
    active: InteractionId,
}

impl EventCapturer {
    /// Creates a capturer with no listeners attached.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initialized: false,
            active: InteractionId(0),
        }
    }

    /// Attaches the capture listeners and the inert click listener.
    ///
    /// Only the first call does anything; returns `true` if it was this one.
    /// Listeners are never detached.
    pub fn init<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        for kind in EventKind::TRACKED {
            host.listen(kind);
        }
        host.force_click_dispatch();
        true
    }

    /// Returns `true` once [`init`](Self::init) has run.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the id the next non-starting event would join.
    #[must_use]
    pub const fn active_interaction_id(&self) -> InteractionId {
        self.active
    }

    /// Stamps `event` as captured at `start` and assigns its interaction.
    ///
    /// Starting events open a new interaction before the measure is built.
    /// If the resulting id is already retired according to `is_flushed`, the
    /// event is dropped.
    pub fn capture<T>(
        &mut self,
        event: RawEvent<T>,
        start: HostTime,
        is_flushed: impl FnOnce(InteractionId) -> bool,
    ) -> CaptureOutcome<T> {
        if event.kind.starts_interaction() {
            self.active = InteractionId(self.active.0 + 1);
        }
        if is_flushed(self.active) {
            return CaptureOutcome::Dropped {
                kind: event.kind,
                interaction_id: self.active,
            };
        }
        CaptureOutcome::Accepted(InteractionMeasure::new(
            event.kind,
            self.active,
            start,
            event.event_time,
            event.target,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CallbackId, TimerId};
    use crate::time::Duration;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct ListenerLog {
        listened: Vec<EventKind>,
        inert_clicks: u32,
    }

    impl Host for ListenerLog {
        type Target = ();
        fn now(&self) -> HostTime {
            HostTime::ZERO
        }
        fn listen(&mut self, kind: EventKind) {
            self.listened.push(kind);
        }
        fn force_click_dispatch(&mut self) {
            self.inert_clicks += 1;
        }
        fn post_message(&mut self, _id: CallbackId) {}
        fn set_timeout(&mut self, _id: TimerId, _delay: Duration) {}
        fn clear_timeout(&mut self, _id: TimerId) {}
    }

    fn raw(kind: EventKind, ms: f64) -> RawEvent<()> {
        RawEvent {
            kind,
            event_time: HostTime::from_millis(ms),
            target: (),
        }
    }

    #[test]
    fn init_is_idempotent() {
        let mut host = ListenerLog::default();
        let mut capturer = EventCapturer::new();
        assert!(capturer.init(&mut host));
        assert!(!capturer.init(&mut host));
        assert_eq!(host.listened, EventKind::TRACKED);
        assert_eq!(host.inert_clicks, 1);
        assert!(capturer.is_initialized());
    }

    #[test]
    fn starting_events_increment_before_measure() {
        let mut capturer = EventCapturer::new();
        let ids: Vec<_> = [
            EventKind::PointerDown,
            EventKind::PointerUp,
            EventKind::Click,
            EventKind::KeyDown,
            EventKind::KeyUp,
        ]
        .into_iter()
        .map(|kind| match capturer.capture(raw(kind, 1.0), HostTime(1_200), |_| false) {
            CaptureOutcome::Accepted(m) => m.interaction_id.0,
            CaptureOutcome::Dropped { .. } => panic!("nothing is flushed"),
        })
        .collect();
        assert_eq!(ids, [1, 1, 1, 2, 2]);
    }

    #[test]
    fn measure_is_stamped() {
        let mut capturer = EventCapturer::new();
        let CaptureOutcome::Accepted(m) =
            capturer.capture(raw(EventKind::KeyDown, 4.0), HostTime(4_750), |_| false)
        else {
            panic!("expected a measure");
        };
        assert_eq!(m.start_time, HostTime(4_750));
        assert_eq!(m.event_time, HostTime(4_000));
        assert_eq!(m.input_delay, Duration(750));
        assert_eq!(m.event_type, EventKind::KeyDown);
    }

    #[test]
    fn events_for_flushed_interaction_are_dropped() {
        let mut capturer = EventCapturer::new();
        capturer.capture(raw(EventKind::PointerDown, 0.0), HostTime(0), |_| false);
        let outcome = capturer.capture(raw(EventKind::ContextMenu, 9.0), HostTime(9_000), |id| {
            id == InteractionId(1)
        });
        assert_eq!(
            outcome,
            CaptureOutcome::Dropped {
                kind: EventKind::ContextMenu,
                interaction_id: InteractionId(1),
            }
        );

        // A new starting event opens a fresh id.
        let next = capturer.capture(raw(EventKind::PointerDown, 20.0), HostTime(20_000), |id| {
            id == InteractionId(1)
        });
        assert!(matches!(next, CaptureOutcome::Accepted(m) if m.interaction_id == InteractionId(2)));
    }
}
