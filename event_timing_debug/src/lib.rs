// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for event timing
//! diagnostics.
//!
//! This crate provides [`TraceSink`](event_timing_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — in-memory recording with a shared
//!   [`recorder::Recording`] handle for later inspection.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from flushed
//!   interaction groups and recorded pipeline events.

pub mod chrome;
pub mod pretty;
pub mod recorder;
