// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated interaction session that exercises the diagnostics pipeline.
//!
//! Plays a short scripted session (a click, a key press, a late
//! `contextmenu`, a stalled message loop and a tap that never completes)
//! through the simulated host, printing every pipeline event with a
//! [`PrettyPrintSink`](event_timing_debug::pretty::PrettyPrintSink) while a
//! [`RecorderSink`](event_timing_debug::recorder::RecorderSink) records them,
//! then exports a Chrome trace JSON file.
//!
//! Set `RUST_LOG=debug` to also see the pipeline's own log output.

use std::fs::File;
use std::io::BufWriter;

use event_timing_core::trace::{
    CaptureEvent, DropEvent, FlushEvent, FrameSettledEvent, TickEvent, TraceSink,
};
use event_timing_core::{EventKind, ObserverConfig};
use event_timing_debug::pretty::PrettyPrintSink;
use event_timing_debug::recorder::RecorderSink;
use event_timing_harness::Simulation;

/// Forwards every event to two sinks.
struct Fanout<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Fanout<A, B> {
    fn on_capture(&mut self, e: &CaptureEvent) {
        self.0.on_capture(e);
        self.1.on_capture(e);
    }

    fn on_drop(&mut self, e: &DropEvent) {
        self.0.on_drop(e);
        self.1.on_drop(e);
    }

    fn on_tick(&mut self, e: &TickEvent) {
        self.0.on_tick(e);
        self.1.on_tick(e);
    }

    fn on_frame_settled(&mut self, e: &FrameSettledEvent) {
        self.0.on_frame_settled(e);
        self.1.on_frame_settled(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.0.on_flush(e);
        self.1.on_flush(e);
    }
}

const BUTTON: u32 = 1;
const INPUT: u32 = 2;

fn main() -> std::io::Result<()> {
    env_logger::init();

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let recorder = RecorderSink::new();
    let recording = recorder.recording();

    // -- simulation --------------------------------------------------------
    let mut sim = Simulation::new(ObserverConfig::default());
    sim.observer_mut()
        .set_trace_sink(Box::new(Fanout(pretty, recorder)));
    sim.init();
    let groups = sim.collect_groups();

    // 1. Mouse click within one frame.
    sim.advance_to_ms(3);
    sim.dispatch(EventKind::PointerDown, BUTTON);
    sim.dispatch(EventKind::MouseDown, BUTTON);
    sim.advance_to_ms(9);
    sim.dispatch(EventKind::PointerUp, BUTTON);
    sim.dispatch(EventKind::MouseUp, BUTTON);
    sim.dispatch(EventKind::Click, BUTTON);

    // 2. Key press spanning two frames.
    sim.advance_to_ms(100);
    sim.dispatch(EventKind::KeyDown, INPUT);
    sim.dispatch(EventKind::KeyPress, INPUT);
    sim.advance_to_ms(140);
    sim.dispatch(EventKind::KeyUp, INPUT);

    // 3. Right click cancelled, then a late contextmenu.
    sim.advance_to_ms(250);
    sim.dispatch(EventKind::PointerDown, BUTTON);
    sim.dispatch(EventKind::PointerCancel, BUTTON);
    sim.advance_to_ms(330);
    sim.dispatch(EventKind::ContextMenu, BUTTON);

    // 4. Busy message loop: frames settle processing instead.
    sim.advance_to_ms(400);
    sim.hold_messages(true);
    sim.dispatch(EventKind::KeyDown, INPUT);
    sim.advance_to_ms(420);
    sim.hold_messages(false);
    sim.dispatch(EventKind::KeyUp, INPUT);

    // 5. Long press: the group stays open until the button is released.
    sim.advance_to_ms(600);
    sim.dispatch(EventKind::PointerDown, BUTTON);
    sim.advance_to_ms(900);
    sim.dispatch(EventKind::PointerUp, BUTTON);
    sim.dispatch(EventKind::Click, BUTTON);

    // 6. A press with no release is flushed once the next interaction starts.
    sim.advance_to_ms(1_000);
    sim.dispatch(EventKind::PointerDown, BUTTON);
    sim.advance_to_ms(1_100);
    sim.dispatch(EventKind::KeyDown, INPUT);
    sim.dispatch(EventKind::KeyUp, INPUT);
    sim.advance_to_ms(1_400);

    // -- report ------------------------------------------------------------
    println!();
    for group in groups.borrow().iter() {
        println!("interaction {}:", group.id.0);
        for m in &group.measures {
            println!(
                "  {:<13} input={:>6.2}ms processing={:>6.2}ms presentation={:>6.2}ms duration={:>3.0}ms",
                m.event_type.name(),
                m.input_delay.as_millis(),
                m.processing_duration.as_millis(),
                m.presentation_delay.as_millis(),
                m.duration.as_millis(),
            );
        }
    }
    log::info!("{} events recorded", recording.len());

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    event_timing_debug::chrome::export(&groups.borrow(), &recording.events(), &mut writer)?;
    println!("Wrote {path} ({} interactions)", groups.borrow().len());
    Ok(())
}
