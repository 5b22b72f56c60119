// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-synchronized interaction timing for the Event Timing polyfill.
//!
//! `event_timing_core` reconstructs `PerformanceEventTiming` measurements on
//! engines without native support. It observes raw input events, derives the
//! three timing phases a native implementation would report (input delay,
//! processing duration, presentation delay), groups events into interactions
//! and hands completed groups to subscribers. It is `no_std` compatible (with
//! `alloc`) and never touches a browser API directly.
//!
//! # Architecture
//!
//! The pipeline is sans-IO. The embedding [`Host`](host::Host) supplies time,
//! listeners, message round-trips and timers, and calls back into the
//! [`InteractionObserver`](observer::InteractionObserver) when they fire:
//!
//! ```text
//!   Host listener ──► capture() ──► EventCapturer ──► InteractionMeasure
//!                                        │
//!                  ┌─────────────────────┴──────────────────────┐
//!                  ▼                                            ▼
//!         ProcessingResolver                          PresentationResolver
//!        (processing end via tick)               (frame bucket ─► settle tick)
//!                  │                                            │
//!                  └──────────► TickResolver ◄──────────────────┘
//!                               ▲    ▲    ▲
//!                 on_frame() ───┘    │    └─── next capture()
//!                          on_message()
//!                                        │
//!                                        ▼
//!   on_timer() ──► Aggregator::flush() ──► InteractionGroup ──► subscribers
//! ```
//!
//! **[`tick`]** — First-signal-wins resolution of a "reference timestamp"
//! from the next animation frame, a message-loop round trip, or the next
//! captured event.
//!
//! **[`oneshot`]** — The single-assignment slot with a fired guard that the
//! tick race is built on.
//!
//! **[`capture`]** — Interaction id assignment and measure construction.
//!
//! **[`processing`]** and **[`presentation`]** — The two asynchronous
//! resolvers that complete a measure, in either order.
//!
//! **[`aggregate`]** — Interaction grouping, completion policies and flush.
//!
//! **[`observer`]** — Wires the components together behind the host entry
//! points.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) instrumentation.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables dispatch to an installed
//!   [`TraceSink`](trace::TraceSink). Without it every trace call compiles to
//!   nothing.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod aggregate;
pub mod capture;
pub mod event;
pub mod host;
pub mod measure;
pub mod observer;
pub mod oneshot;
pub mod presentation;
pub mod processing;
pub mod tick;
pub mod time;
pub mod timing;
pub mod trace;

pub use event::{EventKind, INTERACTION_EVENTS, InteractionEvents};
pub use host::Host;
pub use measure::{InteractionGroup, InteractionId, InteractionMeasure};
pub use observer::{CompletionPolicy, InteractionObserver, ObserverConfig};
