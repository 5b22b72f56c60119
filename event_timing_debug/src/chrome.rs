// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes [Chrome Trace Event Format][spec] JSON for flushed
//! interaction groups and, optionally, the pipeline events a
//! [`RecorderSink`](super::recorder::RecorderSink) collected.
//!
//! Each measure becomes three complete (`X`) slices on a track per
//! interaction: input delay, processing and presentation delay.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use event_timing_core::InteractionGroup;
use event_timing_core::time::{Duration, HostTime};

use crate::recorder::RecordedEvent;

/// Exports interaction groups and recorded events as Chrome Trace Event
/// Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are in microseconds.
pub fn export<T>(
    groups: &[InteractionGroup<T>],
    recorded: &[RecordedEvent],
    writer: &mut dyn Write,
) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for group in groups {
        let tid = group.id.0;
        for m in &group.measures {
            let processing_end = m.processing_end();
            let args = json!({
                "interactionId": group.id.0,
                "eventType": m.event_type.name(),
                "duration": m.duration.as_millis(),
            });
            events.push(slice("inputDelay", m.event_time, m.input_delay, tid, &args));
            events.push(slice(
                "processing",
                m.start_time,
                m.processing_duration,
                tid,
                &args,
            ));
            let frame_start = m
                .paint_end
                .map_or(processing_end, |end| HostTime(end.0.saturating_sub(m.presentation_delay.0)));
            events.push(slice(
                "presentationDelay",
                frame_start,
                m.presentation_delay,
                tid,
                &args,
            ));
        }
    }

    for recorded in recorded {
        match recorded {
            RecordedEvent::Capture(e) => events.push(json!({
                "ph": "i",
                "name": format!("capture {}", e.kind),
                "cat": "Capture",
                "ts": e.start_time.micros(),
                "pid": 0,
                "tid": e.interaction_id.0,
                "s": "t",
                "args": { "frameStart": e.frame_start.micros() }
            })),
            RecordedEvent::Drop(e) => events.push(json!({
                "ph": "i",
                "name": format!("drop {}", e.kind),
                "cat": "Capture",
                "ts": e.at.micros(),
                "pid": 0,
                "tid": e.interaction_id.0,
                "s": "t",
            })),
            RecordedEvent::Tick(e) => events.push(json!({
                "ph": "i",
                "name": "Tick",
                "cat": "Tick",
                "ts": e.timestamp.micros(),
                "pid": 0,
                "tid": 0,
                "s": "p",
                "args": {
                    "purpose": format!("{:?}", e.purpose),
                    "source": e.source.as_str(),
                }
            })),
            RecordedEvent::FrameSettled(e) => events.push(json!({
                "ph": "X",
                "name": "FrameSettle",
                "cat": "Frame",
                "ts": e.frame_start.micros(),
                "dur": e.delay.micros(),
                "pid": 0,
                "tid": 0,
                "args": { "measures": e.measures }
            })),
            RecordedEvent::Flush(e) => events.push(json!({
                "ph": "i",
                "name": "Flush",
                "cat": "Aggregator",
                "ts": e.at.micros(),
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "groups": e.groups,
                    "measures": e.measures,
                    "forced": e.forced,
                    "retries": e.retries,
                }
            })),
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn slice(name: &str, start: HostTime, dur: Duration, tid: u64, args: &Value) -> Value {
    json!({
        "ph": "X",
        "name": name,
        "cat": "Interaction",
        "ts": start.micros(),
        "dur": dur.micros(),
        "pid": 1,
        "tid": tid,
        "args": args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_timing_core::trace::FrameSettledEvent;
    use event_timing_core::{EventKind, InteractionId, InteractionMeasure};

    fn group() -> InteractionGroup<()> {
        let mut m = InteractionMeasure::new(
            EventKind::KeyDown,
            InteractionId(1),
            HostTime(1_000),
            HostTime(0),
            (),
        );
        m.resolve_processing(HostTime(3_000));
        m.resolve_presentation(HostTime(0), HostTime(16_000));
        InteractionGroup {
            id: InteractionId(1),
            measures: vec![m],
        }
    }

    #[test]
    fn export_produces_valid_json() {
        let recorded = [RecordedEvent::FrameSettled(FrameSettledEvent {
            frame_start: HostTime(0),
            settle: HostTime(16_000),
            delay: Duration(16_000),
            measures: 1,
        })];
        let mut out = Vec::new();
        export(&[group()], &recorded, &mut out).unwrap();

        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0]["name"], "inputDelay");
        assert_eq!(parsed[0]["dur"], 1_000);
        assert_eq!(parsed[1]["dur"], 2_000);
        assert_eq!(parsed[2]["ts"], 0);
        assert_eq!(parsed[2]["dur"], 16_000);
        assert_eq!(parsed[3]["name"], "FrameSettle");
    }

    #[test]
    fn export_empty() {
        let mut out = Vec::new();
        export::<()>(&[], &[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
