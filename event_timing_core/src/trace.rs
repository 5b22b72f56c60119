// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline instrumentation.
//!
//! This module provides a [`TraceSink`] trait with one method per pipeline
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installing a sink
//! has no effect. When **on**, each method performs a single `Option` branch
//! before dispatching.

use alloc::boxed::Box;

use crate::event::EventKind;
use crate::measure::InteractionId;
use crate::time::{Duration, HostTime};
use crate::timing::TickSource;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an event is captured and assigned to an interaction.
#[derive(Clone, Copy, Debug)]
pub struct CaptureEvent {
    /// The event type.
    pub kind: EventKind,
    /// Interaction the event joined.
    pub interaction_id: InteractionId,
    /// When the listener ran.
    pub start_time: HostTime,
    /// The event's own timestamp.
    pub event_time: HostTime,
    /// Start of the frame current at capture.
    pub frame_start: HostTime,
}

/// Emitted when an event for an already-flushed interaction is discarded.
#[derive(Clone, Copy, Debug)]
pub struct DropEvent {
    /// The event type.
    pub kind: EventKind,
    /// The retired interaction.
    pub interaction_id: InteractionId,
    /// When the listener ran.
    pub at: HostTime,
}

/// What a settled tick was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPurposeKind {
    /// End of an event's synchronous processing.
    Processing,
    /// Settle point of a frame bucket.
    FrameSettle,
}

/// Emitted when a tick race is won.
#[derive(Clone, Copy, Debug)]
pub struct TickEvent {
    /// What the tick was for.
    pub purpose: TickPurposeKind,
    /// Winning signal.
    pub source: TickSource,
    /// Reference timestamp.
    pub timestamp: HostTime,
}

/// Emitted when a frame bucket's presentation delay is broadcast.
#[derive(Clone, Copy, Debug)]
pub struct FrameSettledEvent {
    /// Bucket key.
    pub frame_start: HostTime,
    /// Settle timestamp.
    pub settle: HostTime,
    /// Delay shared by the bucket's measures.
    pub delay: Duration,
    /// Number of measures in the bucket.
    pub measures: usize,
}

/// Emitted after every flush attempt that had pending measures.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// When the flush ran.
    pub at: HostTime,
    /// Groups handed to subscribers.
    pub groups: usize,
    /// Measures across those groups.
    pub measures: usize,
    /// The retry budget ran out.
    pub forced: bool,
    /// Consecutive empty flushes so far.
    pub retries: u32,
    /// Another flush was scheduled.
    pub rescheduled: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an event is captured.
    fn on_capture(&mut self, e: &CaptureEvent) {
        _ = e;
    }

    /// Called when a late event is dropped.
    fn on_drop(&mut self, e: &DropEvent) {
        _ = e;
    }

    /// Called when a tick settles.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when a frame bucket settles.
    fn on_frame_settled(&mut self, e: &FrameSettledEvent) {
        _ = e;
    }

    /// Called after a flush attempt.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Optional owned [`TraceSink`].
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (&$self, $e);
        }
    }};
}

impl Tracer {
    /// Creates a tracer with no sink.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Installs `sink`, replacing any previous one.
    #[inline]
    pub fn set_sink(&mut self, sink: Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            self.sink = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
        }
    }

    /// Emits a [`CaptureEvent`].
    #[inline]
    pub fn capture(&mut self, e: &CaptureEvent) {
        dispatch!(self, on_capture, e);
    }

    /// Emits a [`DropEvent`].
    #[inline]
    pub fn drop_event(&mut self, e: &DropEvent) {
        dispatch!(self, on_drop, e);
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick(&mut self, e: &TickEvent) {
        dispatch!(self, on_tick, e);
    }

    /// Emits a [`FrameSettledEvent`].
    #[inline]
    pub fn frame_settled(&mut self, e: &FrameSettledEvent) {
        dispatch!(self, on_frame_settled, e);
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        dispatch!(self, on_flush, e);
    }
}
