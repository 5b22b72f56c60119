// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing signals exchanged between the host and the pipeline.
//!
//! - [`FrameTick`] — an animation frame delivered by the host's frame loop
//! - [`TickSource`] — which of the three racing signals settled a tick
//! - [`Settlement`] — the reference timestamp a tick settled with
//! - [`TimestampSource`] — whether to trust host-read or browser-attached
//!   timestamps

use crate::time::HostTime;

/// An animation frame delivered by the host.
///
/// Hosts deliver one tick per frame for the lifetime of the page. The
/// pipeline uses it both to track the start of the current frame and as one
/// of the signals that settle pending ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Timestamp the browser passed to the `requestAnimationFrame` callback.
    pub timestamp: HostTime,
    /// Host clock read when the callback ran.
    pub now: HostTime,
}

/// Which signal won a tick race.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickSource {
    /// The next animation frame callback.
    AnimationFrame,
    /// A message-loop round trip posted when the tick was requested.
    ChannelMessage,
    /// The next captured input event.
    EventFired,
}

impl TickSource {
    /// Returns the tag reported alongside the settled timestamp.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnimationFrame => "animationFrame",
            Self::ChannelMessage => "channelMessage",
            Self::EventFired => "eventFired",
        }
    }
}

/// The outcome of a tick race: a reference timestamp and the signal that
/// produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Settlement {
    /// Reference timestamp ("the current task queue has drained").
    pub timestamp: HostTime,
    /// Signal that fired first.
    pub source: TickSource,
}

/// Chooses between the host clock and browser-attached timestamps.
///
/// Browser-attached timestamps (`Event.timeStamp`, the `rAF` argument,
/// `MessageEvent.timeStamp`) are coarser and on some engines taken before the
/// handler starts, which yields negative processing times. [`Host`] is
/// therefore the default.
///
/// [`Host`]: TimestampSource::Host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimestampSource {
    /// Read the host clock when the signal is observed.
    #[default]
    Host,
    /// Use the timestamp the browser attached to the signal.
    Native,
}

impl TimestampSource {
    /// Picks the timestamp to use for a signal observed at `host_now` that the
    /// browser stamped with `native`.
    #[inline]
    #[must_use]
    pub const fn pick(self, host_now: HostTime, native: HostTime) -> HostTime {
        match self {
            Self::Host => host_now,
            Self::Native => native,
        }
    }
}
