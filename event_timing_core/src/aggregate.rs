// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction grouping and flush.
//!
//! The [`Aggregator`] owns every live [`InteractionMeasure`] until it is
//! flushed. A measure enters the *pending* sequence once its processing end
//! is known; flushes group the pending sequence by [`InteractionId`], decide
//! which groups are complete under the configured [`CompletionPolicy`], and
//! move those groups out.
//!
//! Each interaction id moves through three states:
//!
//! ```text
//!   Open ──(policy satisfied, or FullSequence retries exhausted)──► Complete ──► Flushed
//! ```
//!
//! A flush that finds nothing complete asks to be rescheduled, up to
//! [`FlushParams::max_retries`] times in a row. Only [`CompletionPolicy::FullSequence`]
//! then forces pending groups out. [`CompletionPolicy::TerminalEvent`] never
//! drops a group that may still receive events; it stops rescheduling and
//! waits for the next frame settle to arm another flush.
//!
//! Flushed ids are remembered for the lifetime of the aggregator so that late
//! events for them are dropped instead of opening a stale group.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use crate::event::INTERACTION_EVENTS;
use crate::measure::{
    DurationFormula, DurationRounding, InteractionGroup, InteractionId, InteractionMeasure,
};
use crate::time::HostTime;

/// Handle to a measure owned by the [`Aggregator`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MeasureId(pub u64);

impl fmt::Debug for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeasureId({})", self.0)
    }
}

/// Decides when an interaction group is complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompletionPolicy {
    /// Complete when the group's most recently processed measure is a
    /// terminal event (`click`, `auxclick`, `keyup`, `pointercancel`,
    /// `contextmenu`) whose presentation delay has been resolved.
    ///
    /// A group older than the active interaction can receive no more events,
    /// so it is also complete once all its measures are presented.
    #[default]
    TerminalEvent,
    /// Complete when the group's event types include the full pointer
    /// sequence (`pointerdown`, `pointerup`, `click`) or the full keyboard
    /// sequence (`keydown`, `keyup`).
    ///
    /// Pending groups are force-flushed once the retry budget is spent.
    FullSequence,
}

/// Parameters for one [`Aggregator::flush`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushParams {
    /// Completion rule.
    pub policy: CompletionPolicy,
    /// Consecutive flushes with no complete group that still ask to be
    /// rescheduled. See [`CompletionPolicy`] for what happens after.
    pub max_retries: u32,
    /// Formula for each flushed measure's total duration.
    pub formula: DurationFormula,
    /// Rounding for each flushed measure's total duration.
    pub rounding: DurationRounding,
}

/// What a flush did.
#[derive(Clone, Debug, PartialEq)]
pub struct FlushOutcome<T> {
    /// Groups moved out, in order of their first pending measure.
    pub groups: Vec<InteractionGroup<T>>,
    /// Groups were force-flushed because the [`CompletionPolicy::FullSequence`]
    /// retry budget ran out.
    pub forced: bool,
    /// Measures are still pending; the caller should schedule another flush.
    pub reschedule: bool,
    /// Consecutive flushes that found nothing complete.
    pub retries: u32,
}

/// Owns live measures and flushes complete interaction groups.
#[derive(Clone, Debug)]
pub struct Aggregator<T> {
    next_id: u64,
    measures: BTreeMap<MeasureId, InteractionMeasure<T>>,
    pending: Vec<MeasureId>,
    flushed: BTreeSet<InteractionId>,
    retries: u32,
}

impl<T> Default for Aggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Aggregator<T> {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            measures: BTreeMap::new(),
            pending: Vec::new(),
            flushed: BTreeSet::new(),
            retries: 0,
        }
    }

    /// Takes ownership of a freshly captured measure.
    pub fn insert(&mut self, measure: InteractionMeasure<T>) -> MeasureId {
        let id = MeasureId(self.next_id);
        self.next_id += 1;
        self.measures.insert(id, measure);
        id
    }

    /// Records the processing end of a measure and appends it to the pending
    /// sequence.
    ///
    /// Returns `false` if the measure is gone, or if its interaction was
    /// flushed in the meantime (the measure is discarded).
    pub fn mark_processed(&mut self, id: MeasureId, end: HostTime) -> bool {
        let Some(measure) = self.measures.get_mut(&id) else {
            return false;
        };
        if self.flushed.contains(&measure.interaction_id) {
            self.measures.remove(&id);
            return false;
        }
        measure.resolve_processing(end);
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
        true
    }

    /// Records the frame a measure was presented in.
    ///
    /// Returns `false` if the measure was already flushed.
    pub fn mark_presented(&mut self, id: MeasureId, frame_start: HostTime, settle: HostTime) -> bool {
        match self.measures.get_mut(&id) {
            Some(measure) => {
                measure.resolve_presentation(frame_start, settle);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `id` has been flushed.
    #[must_use]
    pub fn is_flushed(&self, id: InteractionId) -> bool {
        self.flushed.contains(&id)
    }

    /// Returns the number of measures waiting to be flushed.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of measures owned, pending or not.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.measures.len()
    }

    /// Returns the number of consecutive flushes that found nothing complete.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Restarts the retry budget. Called for every captured event.
    pub fn reset_retries(&mut self) {
        self.retries = 0;
    }

    /// Drops all measures and forgets flushed ids.
    pub fn clear(&mut self) {
        self.measures.clear();
        self.pending.clear();
        self.flushed.clear();
        self.retries = 0;
    }

    /// Flushes every complete group.
    ///
    /// `active` is the interaction currently accepting events. With nothing
    /// pending this is a no-op. If nothing is complete, the retry counter is
    /// bumped and a reschedule requested until it reaches
    /// `params.max_retries`; past that point the policy decides between
    /// forcing everything out and going idle.
    pub fn flush(&mut self, params: &FlushParams, active: InteractionId) -> FlushOutcome<T> {
        if self.pending.is_empty() {
            return self.nothing_flushed(false);
        }

        let grouped = self.group_pending();
        let mut complete: Vec<bool> = grouped
            .iter()
            .map(|(interaction, members)| {
                self.is_complete(*interaction, members, params.policy, active)
            })
            .collect();

        let mut forced = false;
        if !complete.contains(&true) {
            if self.retries < params.max_retries {
                self.retries += 1;
                return self.nothing_flushed(true);
            }
            match params.policy {
                CompletionPolicy::TerminalEvent => {
                    log::trace!(
                        "{} interactions still open after {} retries; waiting for input",
                        grouped.len(),
                        self.retries
                    );
                    return self.nothing_flushed(false);
                }
                CompletionPolicy::FullSequence => {
                    forced = true;
                    complete.fill(true);
                    log::debug!(
                        "force-flushing {} incomplete interactions after {} retries",
                        grouped.len(),
                        self.retries
                    );
                }
            }
        }

        let mut groups = Vec::new();
        for ((interaction, members), done) in grouped.into_iter().zip(complete) {
            if !done {
                continue;
            }
            self.pending.retain(|id| !members.contains(id));
            let measures = members
                .iter()
                .filter_map(|id| self.measures.remove(id))
                .map(|mut m| {
                    m.finalize(params.formula, params.rounding);
                    m
                })
                .collect();
            self.flushed.insert(interaction);
            groups.push(InteractionGroup {
                id: interaction,
                measures,
            });
        }
        self.retries = 0;

        FlushOutcome {
            groups,
            forced,
            reschedule: !self.pending.is_empty(),
            retries: 0,
        }
    }

    fn nothing_flushed(&self, reschedule: bool) -> FlushOutcome<T> {
        FlushOutcome {
            groups: Vec::new(),
            forced: false,
            reschedule,
            retries: self.retries,
        }
    }

    /// Groups the pending sequence by interaction, preserving first
    /// appearance and insertion order.
    fn group_pending(&self) -> Vec<(InteractionId, Vec<MeasureId>)> {
        let mut grouped: Vec<(InteractionId, Vec<MeasureId>)> = Vec::new();
        for &id in &self.pending {
            let Some(measure) = self.measures.get(&id) else {
                continue;
            };
            match grouped
                .iter_mut()
                .find(|(interaction, _)| *interaction == measure.interaction_id)
            {
                Some((_, members)) => members.push(id),
                None => grouped.push((measure.interaction_id, alloc::vec![id])),
            }
        }
        grouped
    }

    fn is_complete(
        &self,
        interaction: InteractionId,
        members: &[MeasureId],
        policy: CompletionPolicy,
        active: InteractionId,
    ) -> bool {
        match policy {
            CompletionPolicy::TerminalEvent => {
                let mut measures = members.iter().filter_map(|id| self.measures.get(id));
                if interaction < active {
                    measures.all(|m| m.is_presented())
                } else {
                    measures
                        .next_back()
                        .is_some_and(|m| m.event_type.is_terminal() && m.is_presented())
                }
            }
            CompletionPolicy::FullSequence => INTERACTION_EVENTS.is_full_sequence(
                members
                    .iter()
                    .filter_map(|id| self.measures.get(id))
                    .map(|m| m.event_type),
            ),
        }
    }
}
