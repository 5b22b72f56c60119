// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic virtual-clock host for the event timing pipeline.
//!
//! [`SimHost`] implements [`Host`] on a virtual clock: messages and timers are
//! queued instead of delivered, and listeners are only counted. [`Simulation`]
//! owns an [`InteractionObserver<SimHost>`] and plays the role of the browser
//! event loop:
//!
//! - [`dispatch`](Simulation::dispatch) runs every registered listener for an
//!   event, then drains the message queue (unless messages are held).
//! - [`advance_to`](Simulation::advance_to) moves the clock forward, running
//!   animation frames at a fixed interval and expiring timers in time order.
//!   Frames win ties with timers.
//!
//! ```
//! use event_timing_core::{EventKind, ObserverConfig};
//! use event_timing_harness::Simulation;
//!
//! let mut sim = Simulation::new(ObserverConfig::default());
//! sim.init();
//! let groups = sim.collect_groups();
//!
//! sim.dispatch(EventKind::KeyDown, 1);
//! sim.advance_to_ms(5);
//! sim.dispatch(EventKind::KeyUp, 1);
//! sim.advance_to_ms(100);
//!
//! assert_eq!(groups.borrow().len(), 1);
//! ```

#![no_std]

extern crate alloc;

use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use event_timing_core::capture::RawEvent;
use event_timing_core::host::{CallbackId, TimerId};
use event_timing_core::time::{Duration, HostTime};
use event_timing_core::timing::FrameTick;
use event_timing_core::{EventKind, Host, InteractionGroup, InteractionObserver, ObserverConfig};

/// Identifies a simulated event target.
pub type ElementId = u32;

/// Default frame interval of the simulated display.
pub const FRAME_INTERVAL: Duration = Duration::from_millis_u64(16);

/// A [`Host`] on a virtual clock.
#[derive(Debug, Default)]
pub struct SimHost {
    now: HostTime,
    listeners: Vec<EventKind>,
    inert_click_listeners: u32,
    messages: VecDeque<CallbackId>,
    timers: BTreeMap<TimerId, HostTime>,
}

impl SimHost {
    /// Creates a host with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many listeners are attached for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|&&k| k == kind).count()
    }

    /// Returns how many inert `click` listeners were installed.
    #[must_use]
    pub fn inert_click_listeners(&self) -> u32 {
        self.inert_click_listeners
    }

    /// Returns the number of undelivered messages.
    #[must_use]
    pub fn queued_messages(&self) -> usize {
        self.messages.len()
    }

    /// Returns the number of armed timers.
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    fn pop_message(&mut self) -> Option<CallbackId> {
        self.messages.pop_front()
    }

    /// Earliest armed timer, ties broken by id.
    fn next_timer(&self) -> Option<(TimerId, HostTime)> {
        self.timers
            .iter()
            .map(|(&id, &due)| (id, due))
            .min_by_key(|&(id, due)| (due, id))
    }
}

impl Host for SimHost {
    type Target = ElementId;

    fn now(&self) -> HostTime {
        self.now
    }

    fn listen(&mut self, kind: EventKind) {
        self.listeners.push(kind);
    }

    fn force_click_dispatch(&mut self) {
        self.inert_click_listeners += 1;
    }

    fn post_message(&mut self, id: CallbackId) {
        self.messages.push_back(id);
    }

    fn set_timeout(&mut self, id: TimerId, delay: Duration) {
        self.timers.insert(id, self.now + delay);
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

/// Shared list of flushed groups, filled by [`Simulation::collect_groups`].
pub type Collected = Rc<RefCell<Vec<InteractionGroup<ElementId>>>>;

/// Drives an [`InteractionObserver`] the way a browser event loop would.
#[derive(Debug)]
pub struct Simulation {
    observer: InteractionObserver<SimHost>,
    frame_interval: Duration,
    next_frame: HostTime,
    hold_messages: bool,
    captures: u64,
}

impl Simulation {
    /// Creates a simulation at time zero with a 16 ms frame interval.
    #[must_use]
    pub fn new(config: ObserverConfig) -> Self {
        Self::with_frame_interval(config, FRAME_INTERVAL)
    }

    /// Creates a simulation with a custom frame interval.
    #[must_use]
    pub fn with_frame_interval(config: ObserverConfig, frame_interval: Duration) -> Self {
        Self {
            observer: InteractionObserver::new(SimHost::new(), config),
            frame_interval,
            next_frame: HostTime::ZERO + frame_interval,
            hold_messages: false,
            captures: 0,
        }
    }

    /// Runs the observer's one-time setup. Returns `true` on the first call.
    pub fn init(&mut self) -> bool {
        self.observer.init()
    }

    /// Registers a subscriber that collects every flushed group.
    pub fn collect_groups(&mut self) -> Collected {
        let collected: Collected = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&collected);
        self.observer
            .on_interaction(move |group| sink.borrow_mut().push(group.clone()));
        collected
    }

    /// Returns the observer.
    #[must_use]
    pub fn observer(&self) -> &InteractionObserver<SimHost> {
        &self.observer
    }

    /// Returns the observer mutably.
    pub fn observer_mut(&mut self) -> &mut InteractionObserver<SimHost> {
        &mut self.observer
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.observer.host().now
    }

    /// Returns how many listener invocations reached the observer.
    #[must_use]
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// While `true`, posted messages stay queued until
    /// [`release_messages`](Self::release_messages) or a call with `false`.
    pub fn hold_messages(&mut self, hold: bool) {
        self.hold_messages = hold;
        if !hold {
            self.release_messages();
        }
    }

    /// Delivers every queued message at the current time.
    pub fn release_messages(&mut self) {
        while let Some(id) = self.observer.host_mut().pop_message() {
            let now = self.now();
            self.observer.on_message(id, now);
        }
    }

    /// Dispatches an event of `kind` on `target` at the current time.
    ///
    /// Every attached listener for `kind` runs; with none attached nothing is
    /// captured.
    pub fn dispatch(&mut self, kind: EventKind, target: ElementId) {
        let listeners = self.observer.host().listener_count(kind);
        let event_time = self.now();
        for _ in 0..listeners {
            self.captures += 1;
            self.observer.capture(RawEvent {
                kind,
                event_time,
                target,
            });
        }
        if !self.hold_messages {
            self.release_messages();
        }
    }

    /// Advances the clock to `target`, running frames and timers on the way.
    ///
    /// Moving backwards is a no-op.
    pub fn advance_to(&mut self, target: HostTime) {
        loop {
            let timer = self.observer.host().next_timer();
            let frame_due = self.next_frame <= target;
            match timer {
                Some((_, due)) if due <= target && (!frame_due || due < self.next_frame) => {
                    self.run_timers_at(due);
                }
                _ if frame_due => self.run_frame(),
                _ => break,
            }
        }
        if target > self.now() {
            self.set_now(target);
        }
    }

    /// Advances the clock to `ms` milliseconds.
    pub fn advance_to_ms(&mut self, ms: u64) {
        self.advance_to(HostTime::ZERO + Duration::from_millis_u64(ms));
    }

    /// Advances the clock by `by`.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    fn set_now(&mut self, t: HostTime) {
        self.observer.host_mut().now = t;
    }

    fn run_frame(&mut self) {
        let at = self.next_frame;
        self.set_now(at);
        self.next_frame = at + self.frame_interval;
        log::trace!("frame at {at:?}");
        self.observer.on_frame(FrameTick {
            timestamp: at,
            now: at,
        });
        if !self.hold_messages {
            self.release_messages();
        }
    }

    fn run_timers_at(&mut self, due: HostTime) {
        self.set_now(due);
        while let Some((id, at)) = self.observer.host().next_timer()
            && at <= due
        {
            self.observer.host_mut().timers.remove(&id);
            self.observer.on_timer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_time_order_between_frames() {
        let mut host = SimHost::new();
        host.set_timeout(TimerId(1), Duration::from_millis_u64(30));
        host.set_timeout(TimerId(2), Duration::from_millis_u64(10));
        assert_eq!(
            host.next_timer(),
            Some((TimerId(2), HostTime(10_000)))
        );
        host.clear_timeout(TimerId(2));
        assert_eq!(
            host.next_timer(),
            Some((TimerId(1), HostTime(30_000)))
        );
    }

    #[test]
    fn dispatch_without_listeners_captures_nothing() {
        let mut sim = Simulation::new(ObserverConfig::default());
        sim.dispatch(EventKind::Click, 1);
        assert_eq!(sim.captures(), 0);
    }

    #[test]
    fn advance_runs_frames_at_interval() {
        let mut sim = Simulation::new(ObserverConfig::default());
        sim.init();
        sim.dispatch(EventKind::PointerDown, 1);
        sim.advance_to_ms(15);
        assert_eq!(sim.observer().host().armed_timers(), 0);
        sim.advance_to_ms(16);
        // The frame at 16 ms settled the bucket and armed a flush.
        assert_eq!(sim.observer().host().armed_timers(), 1);
        assert_eq!(sim.now(), HostTime(16_000));
    }

    #[test]
    fn held_messages_stay_queued() {
        let mut sim = Simulation::new(ObserverConfig::default());
        sim.init();
        sim.hold_messages(true);
        sim.dispatch(EventKind::KeyDown, 1);
        assert_eq!(sim.observer().host().queued_messages(), 1);
        assert_eq!(sim.observer().pending_len(), 0);
        sim.hold_messages(false);
        assert_eq!(sim.observer().host().queued_messages(), 0);
        assert_eq!(sim.observer().pending_len(), 1);
    }
}
