// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-event measurements and interaction groups.
//!
//! An [`InteractionMeasure`] is created when an event is captured and filled
//! in by two independent resolvers: the processing resolver sets
//! [`end_time`](InteractionMeasure::end_time) and
//! [`processing_duration`](InteractionMeasure::processing_duration), and the
//! presentation resolver sets
//! [`presentation_delay`](InteractionMeasure::presentation_delay) and
//! [`paint_end`](InteractionMeasure::paint_end). Either may finish first.
//! The total [`duration`](InteractionMeasure::duration) is computed once both
//! have, using a [`DurationFormula`] and [`DurationRounding`].

use alloc::vec::Vec;
use core::fmt;

use crate::event::EventKind;
use crate::time::{Duration, HostTime};

/// Groups the events of one logical interaction.
///
/// Ids increase monotonically and are never reused. Id `0` collects events
/// captured before the first interaction-starting event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InteractionId(pub u64);

impl fmt::Debug for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InteractionId({})", self.0)
    }
}

/// How the reported total duration is derived from the phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DurationFormula {
    /// `input_delay + processing_duration + presentation_delay`.
    #[default]
    Sum,
    /// `(end_time + presentation_delay) - event_time`.
    Span,
}

/// Granularity applied to the reported total duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DurationRounding {
    /// Keep microsecond precision.
    Exact,
    /// Round to the nearest millisecond.
    #[default]
    Millisecond,
    /// Round to the nearest multiple of 8 ms, the granularity native
    /// implementations expose.
    EightMilliseconds,
}

impl DurationRounding {
    /// Applies this rounding to `d`.
    #[must_use]
    pub const fn apply(self, d: Duration) -> Duration {
        match self {
            Self::Exact => d,
            Self::Millisecond => d.round_to(Duration::from_millis_u64(1)),
            Self::EightMilliseconds => d.round_to(Duration::from_millis_u64(8)),
        }
    }
}

/// Timing record for one captured event.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionMeasure<T> {
    /// When the listener ran (processing start).
    pub start_time: HostTime,
    /// The event's own timestamp.
    pub event_time: HostTime,
    /// The event type.
    pub event_type: EventKind,
    /// The interaction this event belongs to.
    pub interaction_id: InteractionId,
    /// `start_time - event_time`.
    pub input_delay: Duration,
    /// Time from capture until synchronous handling finished.
    pub processing_duration: Duration,
    /// When synchronous handling finished, once resolved.
    pub end_time: Option<HostTime>,
    /// Time from the owning frame's start until that frame settled. Shared by
    /// every measure captured in the same frame.
    pub presentation_delay: Duration,
    /// When the owning frame settled, once resolved.
    pub paint_end: Option<HostTime>,
    /// Reported total, computed when the measure is flushed.
    pub duration: Duration,
    /// The event's target.
    pub target: T,
}

impl<T> InteractionMeasure<T> {
    /// Creates an unresolved measure for an event captured at `start_time`.
    #[must_use]
    pub fn new(
        event_type: EventKind,
        interaction_id: InteractionId,
        start_time: HostTime,
        event_time: HostTime,
        target: T,
    ) -> Self {
        Self {
            start_time,
            event_time,
            event_type,
            interaction_id,
            input_delay: start_time - event_time,
            processing_duration: Duration::ZERO,
            end_time: None,
            presentation_delay: Duration::ZERO,
            paint_end: None,
            duration: Duration::ZERO,
            target,
        }
    }

    /// Records the end of synchronous processing.
    pub fn resolve_processing(&mut self, end: HostTime) {
        self.processing_duration = end - self.start_time;
        self.end_time = Some(end);
    }

    /// Records the owning frame's settle point.
    pub fn resolve_presentation(&mut self, frame_start: HostTime, settle: HostTime) {
        self.presentation_delay = settle - frame_start;
        self.paint_end = Some(settle);
    }

    /// Returns `true` once the processing end is known.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Returns `true` once the presentation delay is known.
    #[must_use]
    pub const fn is_presented(&self) -> bool {
        self.paint_end.is_some()
    }

    /// Returns `true` once both resolvers have reported.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.is_processed() && self.is_presented()
    }

    /// Processing end, falling back to `start_time + processing_duration`.
    #[must_use]
    pub fn processing_end(&self) -> HostTime {
        self.end_time
            .unwrap_or(self.start_time + self.processing_duration)
    }

    /// Computes and stores the total [`duration`](Self::duration).
    pub fn finalize(&mut self, formula: DurationFormula, rounding: DurationRounding) {
        let raw = match formula {
            DurationFormula::Sum => {
                self.input_delay + self.processing_duration + self.presentation_delay
            }
            DurationFormula::Span => {
                (self.processing_end() + self.presentation_delay) - self.event_time
            }
        };
        self.duration = rounding.apply(raw);
    }
}

/// All measures sharing one [`InteractionId`], in capture order.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionGroup<T> {
    /// The shared interaction id.
    pub id: InteractionId,
    /// The group's measures.
    pub measures: Vec<InteractionMeasure<T>>,
}

impl<T> InteractionGroup<T> {
    /// Returns the type of each measure, in order.
    pub fn event_types(&self) -> impl Iterator<Item = EventKind> + Clone + '_ {
        self.measures.iter().map(|m| m.event_type)
    }

    /// Returns the latest paint end across the group, if any measure has one.
    #[must_use]
    pub fn paint_end(&self) -> Option<HostTime> {
        self.measures.iter().filter_map(|m| m.paint_end).max()
    }
}
