// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behaviour of the pipeline under the simulated event loop.

use event_timing_core::aggregate::CompletionPolicy;
use event_timing_core::measure::DurationRounding;
use event_timing_core::tick::TickResolver;
use event_timing_core::time::{Duration, HostTime};
use event_timing_core::timing::TickSource;
use event_timing_core::{EventKind, InteractionId, ObserverConfig};
use event_timing_harness::{SimHost, Simulation};

fn started() -> Simulation {
    let mut sim = Simulation::new(ObserverConfig::default());
    assert!(sim.init());
    sim
}

const fn ms(v: u64) -> Duration {
    Duration::from_millis_u64(v)
}

#[test]
fn pointer_sequence_in_one_frame_is_one_group() {
    for offsets in [[0, 0, 0], [1, 2, 3], [0, 7, 15]] {
        let mut sim = started();
        let groups = sim.collect_groups();

        for (kind, at) in [EventKind::PointerDown, EventKind::PointerUp, EventKind::Click]
            .into_iter()
            .zip(offsets)
        {
            sim.advance_to_ms(at);
            sim.dispatch(kind, 7);
        }
        sim.advance_to_ms(200);

        let groups = groups.borrow();
        assert_eq!(groups.len(), 1, "offsets {offsets:?}");
        let g = &groups[0];
        assert_eq!(
            g.event_types().collect::<Vec<_>>(),
            [EventKind::PointerDown, EventKind::PointerUp, EventKind::Click]
        );
        let delay = g.measures[0].presentation_delay;
        assert!(g.measures.iter().all(|m| m.presentation_delay == delay));
        assert!(g.measures.iter().all(|m| m.target == 7));
    }
}

#[test]
fn keyboard_end_to_end() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::KeyDown, 1);
    sim.advance_to_ms(5);
    sim.dispatch(EventKind::KeyUp, 1);
    sim.advance_to_ms(100);

    let groups = groups.borrow();
    assert_eq!(groups.len(), 1);
    let g = &groups[0];
    assert_eq!(g.id, InteractionId(1));
    assert_eq!(g.measures.len(), 2);
    for m in &g.measures {
        assert_eq!(m.interaction_id, InteractionId(1));
        assert_eq!(m.presentation_delay, ms(16));
        assert_eq!(m.input_delay, Duration::ZERO);
        assert_eq!(m.paint_end, Some(HostTime(16_000)));
    }
    assert_eq!(g.measures[1].start_time, HostTime(5_000));
}

#[test]
fn interaction_ids_strictly_increase() {
    let mut sim = started();
    let groups = sim.collect_groups();

    let mut t = 0;
    for round in 0..4 {
        sim.advance_to_ms(t);
        if round % 2 == 0 {
            sim.dispatch(EventKind::PointerDown, round);
            sim.dispatch(EventKind::PointerUp, round);
            sim.dispatch(EventKind::Click, round);
        } else {
            sim.dispatch(EventKind::KeyDown, round);
            sim.dispatch(EventKind::KeyUp, round);
        }
        // Late event for the interaction just flushed.
        sim.advance_to_ms(t + 80);
        sim.dispatch(EventKind::ContextMenu, round);
        t += 160;
    }
    sim.advance_to_ms(t + 200);

    let ids: Vec<_> = groups.borrow().iter().map(|g| g.id.0).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn contextmenu_after_flush_is_dropped() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::PointerDown, 3);
    sim.dispatch(EventKind::PointerCancel, 3);
    sim.advance_to_ms(60);
    assert_eq!(groups.borrow().len(), 1);

    sim.dispatch(EventKind::ContextMenu, 3);
    sim.advance_to_ms(500);
    assert_eq!(groups.borrow().len(), 1);
    assert_eq!(sim.observer().pending_len(), 0);
}

#[test]
fn message_before_frame_wins() {
    let mut host = SimHost::new();
    let mut ticks = TickResolver::new();
    let id = ticks.request('m', 0, &mut host);

    let settled = ticks.on_message(id, HostTime(2_000));
    assert_eq!(settled.map(|(_, s)| s.source), Some(TickSource::ChannelMessage));
    assert_eq!(settled.map(|(_, s)| s.timestamp), Some(HostTime(2_000)));
    assert!(ticks.on_frame(1, HostTime(16_000)).is_empty());
}

#[test]
fn frame_before_message_wins() {
    let mut host = SimHost::new();
    let mut ticks = TickResolver::new();
    let id = ticks.request('f', 0, &mut host);

    let settled = ticks.on_frame(1, HostTime(16_000));
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].1.source, TickSource::AnimationFrame);
    assert_eq!(settled[0].1.timestamp, HostTime(16_000));
    assert_eq!(ticks.on_message(id, HostTime(17_000)), None);
}

#[test]
fn held_message_loses_to_frame_end_to_end() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.hold_messages(true);
    sim.dispatch(EventKind::KeyDown, 1);
    sim.advance_to_ms(16);
    sim.hold_messages(false);
    sim.dispatch(EventKind::KeyUp, 1);
    sim.advance_to_ms(200);

    let groups = groups.borrow();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].measures[0].processing_duration, ms(16));
}

#[test]
fn init_twice_captures_once() {
    let mut sim = started();
    assert!(!sim.init());
    assert_eq!(sim.observer().host().listener_count(EventKind::Click), 1);
    assert_eq!(sim.observer().host().inert_click_listeners(), 1);

    sim.dispatch(EventKind::Click, 1);
    assert_eq!(sim.captures(), 1);
}

#[test]
fn long_press_is_one_group() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::PointerDown, 1);
    sim.advance_to_ms(250);
    assert!(groups.borrow().is_empty());
    assert_eq!(sim.observer().pending_len(), 1);
    assert!(!sim.observer().flush_scheduled(), "idle while the button is held");

    sim.advance_to_ms(300);
    sim.dispatch(EventKind::PointerUp, 1);
    sim.dispatch(EventKind::Click, 1);
    sim.advance_to_ms(1_000);

    let groups = groups.borrow();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].event_types().collect::<Vec<_>>(),
        [EventKind::PointerDown, EventKind::PointerUp, EventKind::Click]
    );
    assert_eq!(groups[0].measures[0].presentation_delay, ms(16));
}

#[test]
fn held_key_keeps_its_keyup() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::KeyDown, 1);
    sim.advance_to_ms(200);
    sim.dispatch(EventKind::KeyUp, 1);
    sim.advance_to_ms(500);

    let groups = groups.borrow();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, InteractionId(1));
    assert_eq!(
        groups[0].event_types().collect::<Vec<_>>(),
        [EventKind::KeyDown, EventKind::KeyUp]
    );
}

#[test]
fn unreleased_press_flushes_when_next_interaction_starts() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::PointerDown, 1);
    sim.advance_to_ms(100);
    sim.dispatch(EventKind::KeyDown, 2);
    sim.dispatch(EventKind::KeyUp, 2);
    sim.advance_to_ms(300);

    let groups = groups.borrow();
    let ids: Vec<_> = groups.iter().map(|g| g.id).collect();
    assert_eq!(ids, [InteractionId(1), InteractionId(2)]);
    assert_eq!(
        groups[0].event_types().collect::<Vec<_>>(),
        [EventKind::PointerDown]
    );
    assert_eq!(sim.observer().pending_len(), 0);
}

#[test]
fn full_sequence_policy_waits_for_keyup() {
    let config = ObserverConfig {
        rounding: DurationRounding::EightMilliseconds,
        ..ObserverConfig::conservative()
    };
    assert_eq!(config.completion, CompletionPolicy::FullSequence);
    let mut sim = Simulation::new(config);
    sim.init();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::KeyDown, 1);
    sim.dispatch(EventKind::KeyPress, 1);
    sim.advance_to_ms(150);
    assert!(groups.borrow().is_empty());

    sim.dispatch(EventKind::KeyUp, 1);
    sim.advance_to_ms(400);
    let groups = groups.borrow();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].measures.len(), 3);
    assert!(groups[0].measures.iter().all(|m| m.duration.0 % 8_000 == 0));
}

#[test]
fn reset_continues_numbering() {
    let mut sim = started();
    let groups = sim.collect_groups();

    sim.dispatch(EventKind::KeyDown, 1);
    sim.dispatch(EventKind::KeyUp, 1);
    sim.advance_to_ms(100);
    sim.observer_mut().reset();

    sim.dispatch(EventKind::KeyDown, 2);
    sim.dispatch(EventKind::KeyUp, 2);
    sim.advance_to_ms(200);

    let ids: Vec<_> = groups.borrow().iter().map(|g| g.id).collect();
    assert_eq!(ids, [InteractionId(1), InteractionId(2)]);
}
