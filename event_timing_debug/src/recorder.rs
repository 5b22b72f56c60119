// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event to a
//! buffer shared with a [`Recording`] handle. The sink is usually boxed into
//! an observer, so the handle is how the recorded events are read back.

use std::cell::RefCell;
use std::rc::Rc;

use event_timing_core::trace::{
    CaptureEvent, DropEvent, FlushEvent, FrameSettledEvent, TickEvent, TraceSink,
};

/// One recorded trace event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_capture`].
    Capture(CaptureEvent),
    /// See [`TraceSink::on_drop`].
    Drop(DropEvent),
    /// See [`TraceSink::on_tick`].
    Tick(TickEvent),
    /// See [`TraceSink::on_frame_settled`].
    FrameSettled(FrameSettledEvent),
    /// See [`TraceSink::on_flush`].
    Flush(FlushEvent),
}

/// Read handle for the events a [`RecorderSink`] collected.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl Recording {
    /// Returns a copy of every event recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// A [`TraceSink`] that appends events to a shared [`Recording`].
#[derive(Debug, Default)]
pub struct RecorderSink {
    recording: Recording,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that observes this recorder's events.
    #[must_use]
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    fn push(&mut self, event: RecordedEvent) {
        self.recording.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_capture(&mut self, e: &CaptureEvent) {
        self.push(RecordedEvent::Capture(*e));
    }

    fn on_drop(&mut self, e: &DropEvent) {
        self.push(RecordedEvent::Drop(*e));
    }

    fn on_tick(&mut self, e: &TickEvent) {
        self.push(RecordedEvent::Tick(*e));
    }

    fn on_frame_settled(&mut self, e: &FrameSettledEvent) {
        self.push(RecordedEvent::FrameSettled(*e));
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.push(RecordedEvent::Flush(*e));
    }
}
