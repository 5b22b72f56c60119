// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! First-signal-wins tick resolution.
//!
//! No single browser primitive reports "the work queued by this task has
//! settled" on every engine. [`TickResolver`] approximates it by racing three
//! signals for each request and settling with whichever arrives first:
//!
//! 1. the next animation frame ([`TickSource::AnimationFrame`]),
//! 2. a message-loop round trip posted at request time
//!    ([`TickSource::ChannelMessage`]),
//! 3. the next captured input event ([`TickSource::EventFired`]).
//!
//! Each request owns a [`Oneshot`] and is registered under its [`CallbackId`]
//! until the first signal fires it. Signals that arrive later, including a
//! message that is never delivered at all, find no entry and are ignored.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::host::{CallbackId, Host};
use crate::oneshot::Oneshot;
use crate::time::HostTime;
use crate::timing::{Settlement, TickSource};

#[derive(Debug)]
struct PendingTick<P> {
    purpose: P,
    /// Frame index current when the request was made. Only a later frame can
    /// settle it.
    armed_frame: u64,
    outcome: Oneshot<Settlement>,
}

/// Races tick signals for a set of outstanding requests.
///
/// `P` is the caller's payload identifying what each request is for; it is
/// returned together with the [`Settlement`] of the winning signal.
#[derive(Debug)]
pub struct TickResolver<P> {
    next_id: u64,
    pending: BTreeMap<CallbackId, PendingTick<P>>,
}

impl<P: Copy> Default for TickResolver<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy> TickResolver<P> {
    /// Creates a resolver with no outstanding requests.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Registers a request and posts its message-loop signal through `host`.
    ///
    /// `frame_index` is the index of the frame current at request time.
    pub fn request<H: Host + ?Sized>(
        &mut self,
        purpose: P,
        frame_index: u64,
        host: &mut H,
    ) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            PendingTick {
                purpose,
                armed_frame: frame_index,
                outcome: Oneshot::new(),
            },
        );
        host.post_message(id);
        id
    }

    /// Delivers the message-loop signal for `id`.
    ///
    /// Returns its payload if the message won the race; messages for
    /// requests already settled by another signal are ignored.
    pub fn on_message(&mut self, id: CallbackId, timestamp: HostTime) -> Option<(P, Settlement)> {
        self.settle(
            id,
            Settlement {
                timestamp,
                source: TickSource::ChannelMessage,
            },
        )
    }

    /// Delivers an animation frame. Settles every request armed before
    /// `frame_index`, in request order.
    pub fn on_frame(&mut self, frame_index: u64, timestamp: HostTime) -> Vec<(P, Settlement)> {
        self.settle_where(
            |tick| tick.armed_frame < frame_index,
            Settlement {
                timestamp,
                source: TickSource::AnimationFrame,
            },
        )
    }

    /// Delivers a captured-event signal. Settles every outstanding request.
    pub fn on_event(&mut self, timestamp: HostTime) -> Vec<(P, Settlement)> {
        self.settle_where(
            |_| true,
            Settlement {
                timestamp,
                source: TickSource::EventFired,
            },
        )
    }

    /// Settles one request with a captured-event signal, if it is still
    /// outstanding.
    pub fn settle_by_event(&mut self, id: CallbackId, timestamp: HostTime) -> Option<(P, Settlement)> {
        self.settle(
            id,
            Settlement {
                timestamp,
                source: TickSource::EventFired,
            },
        )
    }

    /// Returns the number of requests that have not settled yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if `id` is registered and unsettled.
    #[must_use]
    pub fn is_outstanding(&self, id: CallbackId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Forgets every request. Messages still in flight are ignored on
    /// delivery.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn settle(&mut self, id: CallbackId, settlement: Settlement) -> Option<(P, Settlement)> {
        let mut tick = self.pending.remove(&id)?;
        if !tick.outcome.fire(settlement) {
            return None;
        }
        tick.outcome.take().map(|s| (tick.purpose, s))
    }

    fn settle_where(
        &mut self,
        eligible: impl Fn(&PendingTick<P>) -> bool,
        settlement: Settlement,
    ) -> Vec<(P, Settlement)> {
        let due: Vec<CallbackId> = self
            .pending
            .iter()
            .filter(|&(_, tick)| eligible(tick))
            .map(|(id, _)| *id)
            .collect();
        due.into_iter()
            .filter_map(|id| self.settle(id, settlement))
            .collect()
    }
}
