// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for environment integrations.
//!
//! The pipeline is single-threaded and push-based: it never blocks, and it
//! never calls a browser API itself. Every asynchronous primitive it needs is
//! requested through [`Host`], and the host reports completion by calling the
//! matching entry point on
//! [`InteractionObserver`](crate::observer::InteractionObserver):
//!
//! | Request                        | Completion                      |
//! |--------------------------------|---------------------------------|
//! | [`Host::listen`]               | `capture()` per dispatched event |
//! | (continuous frame loop)        | `on_frame()` every frame        |
//! | [`Host::post_message`]         | `on_message()` with the same id |
//! | [`Host::set_timeout`]          | `on_timer()` with the same id   |
//!
//! Hosts must not call back into the observer from inside a `Host` method;
//! every completion is delivered from a later task.
//!
//! # Crate boundaries
//!
//! `event_timing_core` owns the data model and the pipeline.
//! `event_timing_backend_web` implements [`Host`] on top of `web-sys`, and
//! `event_timing_harness` implements it on a virtual clock for tests.

use core::fmt;

use crate::event::EventKind;
use crate::time::{Duration, HostTime};

/// Correlation id for one message-loop round trip.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CallbackId(pub u64);

impl fmt::Debug for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackId({})", self.0)
    }
}

/// Identifies a timer requested with [`Host::set_timeout`].
///
/// Ids are allocated by the pipeline, not by the host, so that the host can
/// pass them back when the timer fires.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimerId(pub u64);

impl fmt::Debug for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerId({})", self.0)
    }
}

/// Capabilities the pipeline needs from its environment.
///
/// Both the browser host and the simulated host implement this trait,
/// enabling deterministic tests of the full pipeline.
pub trait Host {
    /// Opaque reference to an event's target. Carried through to
    /// subscribers untouched.
    type Target: Clone;

    /// Reads the monotonic clock.
    fn now(&self) -> HostTime;

    /// Attaches one capture-phase listener for `kind`.
    fn listen(&mut self, kind: EventKind);

    /// Installs an inert `click` listener on the document.
    ///
    /// Some engines do not dispatch `click` at all unless a listener exists
    /// on the document or one of its descendants.
    fn force_click_dispatch(&mut self);

    /// Posts a message-loop round trip carrying `id`.
    fn post_message(&mut self, id: CallbackId);

    /// Schedules `id` to fire after `delay`.
    fn set_timeout(&mut self, id: TimerId, delay: Duration);

    /// Cancels a timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&mut self, id: TimerId);
}
