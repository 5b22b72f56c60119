// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use event_timing_core::time::{Duration, HostTime};
use event_timing_core::trace::{
    CaptureEvent, DropEvent, FlushEvent, FrameSettledEvent, TickEvent, TickPurposeKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.as_millis()
}

fn span_ms(d: Duration) -> f64 {
    d.as_millis()
}

fn purpose_name(purpose: TickPurposeKind) -> &'static str {
    match purpose {
        TickPurposeKind::Processing => "processing",
        TickPurposeKind::FrameSettle => "frame",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_capture(&mut self, e: &CaptureEvent) {
        let _ = writeln!(
            self.writer,
            "[capture] {} interaction={} at {:.3}ms event={:.3}ms frame={:.3}ms",
            e.kind,
            e.interaction_id.0,
            ms(e.start_time),
            ms(e.event_time),
            ms(e.frame_start),
        );
    }

    fn on_drop(&mut self, e: &DropEvent) {
        let _ = writeln!(
            self.writer,
            "[drop] {} interaction={} at {:.3}ms (already flushed)",
            e.kind,
            e.interaction_id.0,
            ms(e.at),
        );
    }

    fn on_tick(&mut self, e: &TickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] {} via {} at {:.3}ms",
            purpose_name(e.purpose),
            e.source.as_str(),
            ms(e.timestamp),
        );
    }

    fn on_frame_settled(&mut self, e: &FrameSettledEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] start={:.3}ms settle={:.3}ms delay={:.3}ms measures={}",
            ms(e.frame_start),
            ms(e.settle),
            span_ms(e.delay),
            e.measures,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let forced = if e.forced { " FORCED" } else { "" };
        let _ = writeln!(
            self.writer,
            "[flush] at {:.3}ms groups={} measures={} retries={} reschedule={}{forced}",
            ms(e.at),
            e.groups,
            e.measures,
            e.retries,
            e.rescheduled,
        );
    }
}
