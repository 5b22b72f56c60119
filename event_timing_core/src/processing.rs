// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Processing-end resolution.
//!
//! The pipeline cannot observe when the page's own listeners for an event
//! return. [`ProcessingResolver`] requests a tick when the event is captured
//! and treats the tick's reference timestamp as the end of synchronous
//! processing.
//!
//! Processing of one event cannot outlast the dispatch of the next, so before
//! a new request is made the previous one is settled with the new event's
//! timestamp if it is still outstanding.

use crate::host::{CallbackId, Host};
use crate::tick::TickResolver;
use crate::time::HostTime;
use crate::timing::Settlement;

/// Tracks the most recent processing-end request.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessingResolver {
    latest: Option<CallbackId>,
}

impl ProcessingResolver {
    /// Creates a resolver with no request in flight.
    #[must_use]
    pub const fn new() -> Self {
        Self { latest: None }
    }

    /// Settles the previous request at `event_time` if it is still
    /// outstanding. Returns its payload and settlement when it was.
    pub fn force_previous<P: Copy>(
        &mut self,
        ticks: &mut TickResolver<P>,
        event_time: HostTime,
    ) -> Option<(P, Settlement)> {
        let previous = self.latest.take()?;
        ticks.settle_by_event(previous, event_time)
    }

    /// Requests the processing-end tick for a freshly captured measure.
    pub fn begin<P: Copy, H: Host + ?Sized>(
        &mut self,
        purpose: P,
        frame_index: u64,
        ticks: &mut TickResolver<P>,
        host: &mut H,
    ) -> CallbackId {
        let id = ticks.request(purpose, frame_index, host);
        self.latest = Some(id);
        id
    }

    /// Forgets the in-flight request.
    pub fn reset(&mut self) {
        self.latest = None;
    }
}
