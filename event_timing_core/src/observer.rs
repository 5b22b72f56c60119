// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The assembled pipeline.
//!
//! [`InteractionObserver`] owns one instance of every component and exposes
//! the host entry points:
//!
//! | Entry point                                   | Host primitive                      |
//! |-----------------------------------------------|-------------------------------------|
//! | [`capture`](InteractionObserver::capture)     | capture-phase DOM listener          |
//! | [`on_frame`](InteractionObserver::on_frame)   | `requestAnimationFrame` loop        |
//! | [`on_message`](InteractionObserver::on_message) | `MessageChannel` port delivery    |
//! | [`on_timer`](InteractionObserver::on_timer)   | `setTimeout` expiry                 |
//!
//! Every entry point runs to completion; the host must not call back into the
//! observer re-entrantly.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::aggregate::{Aggregator, FlushParams, MeasureId};
use crate::capture::{CaptureOutcome, EventCapturer, RawEvent};
use crate::host::{CallbackId, Host, TimerId};
use crate::measure::{DurationFormula, DurationRounding, InteractionGroup, InteractionId};
use crate::presentation::PresentationResolver;
use crate::processing::ProcessingResolver;
use crate::tick::TickResolver;
use crate::time::{Duration, HostTime};
use crate::timing::{FrameTick, Settlement, TimestampSource};
use crate::trace::{
    CaptureEvent, DropEvent, FlushEvent, FrameSettledEvent, TickEvent, TickPurposeKind, TraceSink,
    Tracer,
};

pub use crate::aggregate::CompletionPolicy;

/// Observer tuning.
///
/// Use one of the presets and override individual fields as needed:
///
/// ```
/// use event_timing_core::ObserverConfig;
/// use event_timing_core::time::Duration;
///
/// let config = ObserverConfig {
///     flush_delay: Duration::from_millis_u64(50),
///     ..ObserverConfig::low_latency()
/// };
/// assert_eq!(config.max_flush_retries, 5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserverConfig {
    /// When an interaction group counts as complete.
    pub completion: CompletionPolicy,
    /// Delay between a frame settling and the flush attempt it schedules.
    pub flush_delay: Duration,
    /// Consecutive flush attempts with nothing complete that reschedule
    /// themselves. Past this, [`CompletionPolicy::FullSequence`] force-flushes
    /// and [`CompletionPolicy::TerminalEvent`] waits for the next frame.
    pub max_flush_retries: u32,
    /// Which clock stamps captures, frames and messages.
    pub timestamps: TimestampSource,
    /// How the reported duration is derived.
    pub duration: DurationFormula,
    /// Granularity of the reported duration.
    pub rounding: DurationRounding,
}

impl ObserverConfig {
    /// 20 ms flushes gated on terminal events.
    #[must_use]
    pub const fn low_latency() -> Self {
        Self {
            completion: CompletionPolicy::TerminalEvent,
            flush_delay: Duration::from_millis_u64(20),
            max_flush_retries: 5,
            timestamps: TimestampSource::Host,
            duration: DurationFormula::Sum,
            rounding: DurationRounding::Millisecond,
        }
    }

    /// 100 ms flushes gated on full pointer or keyboard sequences.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            completion: CompletionPolicy::FullSequence,
            flush_delay: Duration::from_millis_u64(100),
            ..Self::low_latency()
        }
    }

    const fn flush_params(&self) -> FlushParams {
        FlushParams {
            policy: self.completion,
            max_retries: self.max_flush_retries,
            formula: self.duration,
            rounding: self.rounding,
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self::low_latency()
    }
}

/// What an outstanding tick is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPurpose {
    /// Processing end of a captured measure.
    Processing(MeasureId),
    /// Settle point of the frame bucket with this start.
    FrameSettle(HostTime),
}

impl TickPurpose {
    const fn kind(self) -> TickPurposeKind {
        match self {
            Self::Processing(_) => TickPurposeKind::Processing,
            Self::FrameSettle(_) => TickPurposeKind::FrameSettle,
        }
    }
}

type Subscriber<T> = Box<dyn FnMut(&InteractionGroup<T>)>;

/// Event timing pipeline driven by a [`Host`].
pub struct InteractionObserver<H: Host> {
    host: H,
    config: ObserverConfig,
    capturer: EventCapturer,
    ticks: TickResolver<TickPurpose>,
    processing: ProcessingResolver,
    presentation: PresentationResolver<MeasureId>,
    aggregator: Aggregator<H::Target>,
    subscribers: Vec<Subscriber<H::Target>>,
    frame_index: u64,
    current_frame_start: HostTime,
    flush_timer: Option<TimerId>,
    next_timer: u64,
    tracer: Tracer,
}

impl<H: Host + fmt::Debug> fmt::Debug for InteractionObserver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionObserver")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("active_interaction_id", &self.capturer.active_interaction_id())
            .field("frame_index", &self.frame_index)
            .field("current_frame_start", &self.current_frame_start)
            .field("pending", &self.aggregator.pending_len())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> InteractionObserver<H> {
    /// Creates an observer. Nothing is attached until [`init`](Self::init).
    ///
    /// The host clock at construction is taken as the start of the current
    /// frame until the first [`on_frame`](Self::on_frame).
    pub fn new(host: H, config: ObserverConfig) -> Self {
        let current_frame_start = host.now();
        Self {
            host,
            config,
            capturer: EventCapturer::new(),
            ticks: TickResolver::new(),
            processing: ProcessingResolver::new(),
            presentation: PresentationResolver::new(),
            aggregator: Aggregator::new(),
            subscribers: Vec::new(),
            frame_index: 0,
            current_frame_start,
            flush_timer: None,
            next_timer: 0,
            tracer: Tracer::none(),
        }
    }

    /// Attaches the capture listeners. Only the first call has any effect;
    /// returns `true` if it was this one.
    pub fn init(&mut self) -> bool {
        let attached = self.capturer.init(&mut self.host);
        if attached {
            log::debug!("event timing listeners attached");
        }
        attached
    }

    /// Returns `true` once [`init`](Self::init) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.capturer.is_initialized()
    }

    /// Registers a subscriber called once per flushed interaction group.
    ///
    /// Subscribers are additive and cannot be removed.
    pub fn on_interaction(&mut self, subscriber: impl FnMut(&InteractionGroup<H::Target>) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Installs a trace sink. Has no effect without the `trace` feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer.set_sink(sink);
    }

    /// Handles one listener invocation.
    pub fn capture(&mut self, event: RawEvent<H::Target>) {
        let start = self.host.now();
        let signal = self.config.timestamps.pick(start, event.event_time);

        if let Some((purpose, settlement)) = self.processing.force_previous(&mut self.ticks, signal)
        {
            self.settle(purpose, settlement);
        }
        for (purpose, settlement) in self.ticks.on_event(signal) {
            self.settle(purpose, settlement);
        }

        let aggregator = &self.aggregator;
        let measure = match self
            .capturer
            .capture(event, start, |id| aggregator.is_flushed(id))
        {
            CaptureOutcome::Accepted(measure) => measure,
            CaptureOutcome::Dropped {
                kind,
                interaction_id,
            } => {
                log::trace!("dropping {kind} for flushed {interaction_id:?}");
                self.tracer.drop_event(&DropEvent {
                    kind,
                    interaction_id,
                    at: start,
                });
                return;
            }
        };

        self.tracer.capture(&CaptureEvent {
            kind: measure.event_type,
            interaction_id: measure.interaction_id,
            start_time: measure.start_time,
            event_time: measure.event_time,
            frame_start: self.current_frame_start,
        });

        self.aggregator.reset_retries();
        let id = self.aggregator.insert(measure);
        self.processing.begin(
            TickPurpose::Processing(id),
            self.frame_index,
            &mut self.ticks,
            &mut self.host,
        );
        self.presentation
            .add(self.current_frame_start, id, self.frame_index);
    }

    /// Handles one animation frame.
    pub fn on_frame(&mut self, tick: FrameTick) {
        self.frame_index += 1;
        self.current_frame_start = self.config.timestamps.pick(tick.now, tick.timestamp);

        for (purpose, settlement) in self.ticks.on_frame(self.frame_index, self.current_frame_start) {
            self.settle(purpose, settlement);
        }
        for frame_start in self.presentation.on_frame(self.frame_index) {
            self.ticks.request(
                TickPurpose::FrameSettle(frame_start),
                self.frame_index,
                &mut self.host,
            );
        }
    }

    /// Handles delivery of the message posted for `id`.
    ///
    /// `native` is the timestamp the host attached to the message.
    pub fn on_message(&mut self, id: CallbackId, native: HostTime) {
        let timestamp = self.config.timestamps.pick(self.host.now(), native);
        if let Some((purpose, settlement)) = self.ticks.on_message(id, timestamp) {
            self.settle(purpose, settlement);
        }
    }

    /// Handles expiry of a flush timer. Cancelled or superseded timers are
    /// ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.flush_timer != Some(id) {
            log::trace!("ignoring stale {id:?}");
            return;
        }
        self.flush_timer = None;

        let had_pending = self.aggregator.pending_len() > 0;
        let outcome = self
            .aggregator
            .flush(&self.config.flush_params(), self.capturer.active_interaction_id());
        if had_pending {
            self.tracer.flush(&FlushEvent {
                at: self.host.now(),
                groups: outcome.groups.len(),
                measures: outcome.groups.iter().map(|g| g.measures.len()).sum(),
                forced: outcome.forced,
                retries: outcome.retries,
                rescheduled: outcome.reschedule,
            });
        }

        for group in &outcome.groups {
            for subscriber in &mut self.subscribers {
                subscriber(group);
            }
        }
        if outcome.reschedule {
            self.schedule_flush();
        }
    }

    /// Drops all in-flight state.
    ///
    /// Interaction numbering continues where it left off, so ids are never
    /// reused. Subscribers and listeners stay attached. Messages and timers already
    /// handed to the host are ignored when they arrive.
    pub fn reset(&mut self) {
        if let Some(timer) = self.flush_timer.take() {
            self.host.clear_timeout(timer);
        }
        self.ticks.clear();
        self.processing.reset();
        self.presentation.clear();
        self.aggregator.clear();
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Returns the id of the interaction currently accepting events.
    #[must_use]
    pub fn active_interaction_id(&self) -> InteractionId {
        self.capturer.active_interaction_id()
    }

    /// Returns the number of processed measures awaiting a flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.aggregator.pending_len()
    }

    /// Returns the number of tick requests that have not settled.
    #[must_use]
    pub fn outstanding_ticks(&self) -> usize {
        self.ticks.outstanding()
    }

    /// Returns `true` while a flush timer is armed.
    #[must_use]
    pub fn flush_scheduled(&self) -> bool {
        self.flush_timer.is_some()
    }

    fn settle(&mut self, purpose: TickPurpose, settlement: Settlement) {
        self.tracer.tick(&TickEvent {
            purpose: purpose.kind(),
            source: settlement.source,
            timestamp: settlement.timestamp,
        });
        match purpose {
            TickPurpose::Processing(id) => {
                if !self.aggregator.mark_processed(id, settlement.timestamp) {
                    log::trace!("discarding {id:?}: interaction already flushed");
                }
            }
            TickPurpose::FrameSettle(frame_start) => {
                let Some(settled) = self.presentation.settle(frame_start, settlement.timestamp)
                else {
                    return;
                };
                for &member in &settled.members {
                    self.aggregator
                        .mark_presented(member, settled.frame_start, settled.settle);
                }
                self.tracer.frame_settled(&FrameSettledEvent {
                    frame_start: settled.frame_start,
                    settle: settled.settle,
                    delay: settled.delay,
                    measures: settled.members.len(),
                });
                self.schedule_flush();
            }
        }
    }

    /// Replaces any armed flush timer with a fresh one.
    fn schedule_flush(&mut self) {
        if let Some(previous) = self.flush_timer.take() {
            self.host.clear_timeout(previous);
        }
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.host.set_timeout(id, self.config.flush_delay);
        self.flush_timer = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    /// Host that records every request and lets the test drive delivery.
    #[derive(Debug, Default)]
    struct ManualHost {
        now: HostTime,
        listened: Vec<EventKind>,
        messages: Vec<CallbackId>,
        timers: Vec<(TimerId, Duration)>,
        cleared: Vec<TimerId>,
    }

    impl Host for ManualHost {
        type Target = &'static str;
        fn now(&self) -> HostTime {
            self.now
        }
        fn listen(&mut self, kind: EventKind) {
            self.listened.push(kind);
        }
        fn force_click_dispatch(&mut self) {}
        fn post_message(&mut self, id: CallbackId) {
            self.messages.push(id);
        }
        fn set_timeout(&mut self, id: TimerId, delay: Duration) {
            self.timers.push((id, delay));
        }
        fn clear_timeout(&mut self, id: TimerId) {
            self.cleared.push(id);
        }
    }

    fn observer() -> InteractionObserver<ManualHost> {
        let mut o = InteractionObserver::new(ManualHost::default(), ObserverConfig::default());
        o.init();
        o
    }

    fn at(o: &mut InteractionObserver<ManualHost>, ms: u64) {
        o.host_mut().now = HostTime(ms * 1_000);
    }

    fn dispatch(o: &mut InteractionObserver<ManualHost>, kind: EventKind) {
        let event_time = o.host().now;
        o.capture(RawEvent {
            kind,
            event_time,
            target: "button",
        });
    }

    fn deliver_messages(o: &mut InteractionObserver<ManualHost>) {
        let now = o.host().now;
        for id in core::mem::take(&mut o.host_mut().messages) {
            o.on_message(id, now);
        }
    }

    fn frame(o: &mut InteractionObserver<ManualHost>) {
        let now = o.host().now;
        o.on_frame(FrameTick {
            timestamp: now,
            now,
        });
    }

    fn last_timer(o: &InteractionObserver<ManualHost>) -> TimerId {
        o.host().timers.last().map(|(id, _)| *id).unwrap()
    }

    fn collect(o: &mut InteractionObserver<ManualHost>) -> Rc<RefCell<Vec<InteractionGroup<&'static str>>>> {
        let out = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&out);
        o.on_interaction(move |g| sink.borrow_mut().push(g.clone()));
        out
    }

    #[test]
    fn presets() {
        assert_eq!(ObserverConfig::default(), ObserverConfig::low_latency());
        let c = ObserverConfig::conservative();
        assert_eq!(c.completion, CompletionPolicy::FullSequence);
        assert_eq!(c.flush_delay, Duration::from_millis_u64(100));
        assert_eq!(c.max_flush_retries, 5);
    }

    #[test]
    fn init_attaches_once() {
        let mut o = observer();
        assert!(!o.init());
        assert_eq!(o.host().listened.len(), EventKind::TRACKED.len());
    }

    #[test]
    fn keyboard_interaction_end_to_end() {
        let mut o = observer();
        let groups = collect(&mut o);

        dispatch(&mut o, EventKind::KeyDown);
        deliver_messages(&mut o);
        at(&mut o, 5);
        dispatch(&mut o, EventKind::KeyUp);
        deliver_messages(&mut o);
        assert_eq!(o.pending_len(), 2);

        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);
        assert!(o.flush_scheduled());
        assert_eq!(o.host().timers[0].1, Duration::from_millis_u64(20));

        at(&mut o, 36);
        let timer = last_timer(&o);
        o.on_timer(timer);

        let groups = groups.borrow();
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.id, InteractionId(1));
        assert_eq!(
            g.event_types().collect::<Vec<_>>(),
            [EventKind::KeyDown, EventKind::KeyUp]
        );
        for m in &g.measures {
            assert_eq!(m.presentation_delay, Duration::from_millis_u64(16));
            assert_eq!(m.input_delay, Duration::ZERO);
            assert_eq!(m.paint_end, Some(HostTime(16_000)));
        }
        assert_eq!(g.measures[0].duration, Duration::from_millis_u64(16));
        assert_eq!(o.pending_len(), 0);
        assert!(!o.flush_scheduled());
    }

    #[test]
    fn next_event_ends_previous_processing() {
        let mut o = observer();
        let groups = collect(&mut o);

        dispatch(&mut o, EventKind::PointerDown);
        // The message is never delivered; the next event settles it.
        at(&mut o, 3);
        dispatch(&mut o, EventKind::PointerUp);
        assert_eq!(o.pending_len(), 1);
        at(&mut o, 4);
        dispatch(&mut o, EventKind::Click);
        assert_eq!(o.pending_len(), 2);
        deliver_messages(&mut o);
        assert_eq!(o.pending_len(), 3);

        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);
        let timer = last_timer(&o);
        o.on_timer(timer);

        let groups = groups.borrow();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].measures[0].processing_duration,
            Duration::from_millis_u64(3)
        );
    }

    #[test]
    fn frame_settles_stuck_processing() {
        let mut o = observer();
        dispatch(&mut o, EventKind::KeyDown);
        assert_eq!(o.outstanding_ticks(), 1);

        at(&mut o, 16);
        frame(&mut o);
        // Processing settled by the frame; the bucket's settle tick is new.
        assert_eq!(o.pending_len(), 1);
        assert_eq!(o.outstanding_ticks(), 1);
    }

    #[test]
    fn late_contextmenu_is_dropped() {
        let mut o = observer();
        let groups = collect(&mut o);

        dispatch(&mut o, EventKind::PointerDown);
        deliver_messages(&mut o);
        dispatch(&mut o, EventKind::PointerCancel);
        deliver_messages(&mut o);
        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);
        let timer = last_timer(&o);
        o.on_timer(timer);
        assert_eq!(groups.borrow().len(), 1);

        at(&mut o, 20);
        dispatch(&mut o, EventKind::ContextMenu);
        assert!(o.host().messages.is_empty());
        assert_eq!(o.pending_len(), 0);
        assert_eq!(o.outstanding_ticks(), 0);
        assert_eq!(o.active_interaction_id(), InteractionId(1));
    }

    #[test]
    fn new_frame_settle_supersedes_flush_timer() {
        let mut o = observer();
        dispatch(&mut o, EventKind::PointerDown);
        deliver_messages(&mut o);
        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);
        let first = last_timer(&o);

        dispatch(&mut o, EventKind::PointerUp);
        deliver_messages(&mut o);
        at(&mut o, 32);
        frame(&mut o);
        deliver_messages(&mut o);

        assert_eq!(o.host().cleared, vec![first]);
        let pending = o.pending_len();
        o.on_timer(first);
        assert_eq!(o.pending_len(), pending, "stale timer is ignored");
    }

    #[test]
    fn reset_keeps_subscribers_and_listeners() {
        let mut o = observer();
        let groups = collect(&mut o);
        dispatch(&mut o, EventKind::KeyDown);
        deliver_messages(&mut o);
        o.reset();
        assert_eq!(o.pending_len(), 0);
        assert_eq!(o.outstanding_ticks(), 0);
        assert_eq!(o.active_interaction_id(), InteractionId(1));
        assert!(o.is_initialized());

        dispatch(&mut o, EventKind::KeyDown);
        deliver_messages(&mut o);
        dispatch(&mut o, EventKind::KeyUp);
        deliver_messages(&mut o);
        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);
        let timer = last_timer(&o);
        o.on_timer(timer);

        let groups = groups.borrow();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, InteractionId(2));
    }

    #[test]
    fn held_key_waits_for_keyup() {
        let mut o = observer();
        let groups = collect(&mut o);

        dispatch(&mut o, EventKind::KeyDown);
        deliver_messages(&mut o);
        at(&mut o, 16);
        frame(&mut o);
        deliver_messages(&mut o);

        let mut ms = 16;
        while o.flush_scheduled() {
            ms += 20;
            at(&mut o, ms);
            let timer = last_timer(&o);
            o.on_timer(timer);
        }
        assert!(groups.borrow().is_empty());
        assert_eq!(o.pending_len(), 1);

        at(&mut o, 400);
        dispatch(&mut o, EventKind::KeyUp);
        deliver_messages(&mut o);
        at(&mut o, 416);
        frame(&mut o);
        deliver_messages(&mut o);
        at(&mut o, 436);
        let timer = last_timer(&o);
        o.on_timer(timer);

        let groups = groups.borrow();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].event_types().collect::<Vec<_>>(),
            [EventKind::KeyDown, EventKind::KeyUp]
        );
    }
}
