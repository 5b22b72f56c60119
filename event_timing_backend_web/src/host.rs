// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Host`] implementation on top of `web-sys`.
//!
//! - listeners: one capture-phase listener on `window` per tracked event,
//!   all sharing a single closure
//! - message round trips: `MessageChannel`, posting on `port2` and receiving
//!   on `port1`, with the [`CallbackId`] as the message payload
//! - timers: `setTimeout` with the [`TimerId`] passed as the callback argument
//!
//! All three closures forward into the process-wide observer. Failures of
//! browser calls after setup are logged and swallowed.

use std::collections::HashMap;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, MessageChannel, MessageEvent, MessagePort, Window};

use event_timing_core::capture::RawEvent;
use event_timing_core::host::{CallbackId, TimerId};
use event_timing_core::time::{Duration, HostTime};
use event_timing_core::{EventKind, Host};

use crate::InitError;
use crate::raf::performance_now;

type EventClosure = Closure<dyn FnMut(Event)>;

/// Browser-backed [`Host`].
pub struct WebHost {
    window: Window,
    document: Document,
    port: MessagePort,
    timers: HashMap<TimerId, i32>,
    listener: EventClosure,
    inert_click: Option<Closure<dyn FnMut()>>,
    // Kept alive for as long as `port1.onmessage` refers to it.
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    on_timeout: Closure<dyn FnMut(JsValue)>,
}

impl std::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebHost")
            .field("armed_timers", &self.timers.len())
            .field("inert_click", &self.inert_click.is_some())
            .finish_non_exhaustive()
    }
}

impl WebHost {
    /// Binds to the global `window` and opens the message channel.
    pub fn new() -> Result<Self, InitError> {
        let window = web_sys::window().ok_or(InitError::NoWindow)?;
        let document = window.document().ok_or(InitError::NoDocument)?;
        let channel = MessageChannel::new().map_err(|e| InitError::MessageChannel(describe(&e)))?;

        let on_message = Closure::wrap(Box::new(|e: MessageEvent| {
            let Some(id) = callback_id(&e.data()) else {
                log::warn!("unexpected message payload on event timing channel");
                return;
            };
            let native = HostTime::from_millis(e.time_stamp());
            crate::with_observer(|observer| observer.on_message(id, native));
        }) as Box<dyn FnMut(MessageEvent)>);
        channel
            .port1()
            .set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let listener = Closure::wrap(Box::new(|e: Event| {
            let Some(kind) = EventKind::from_name(&e.type_()) else {
                return;
            };
            let event = RawEvent {
                kind,
                event_time: HostTime::from_millis(e.time_stamp()),
                target: e.target().map_or(JsValue::NULL, JsValue::from),
            };
            crate::with_observer(|observer| observer.capture(event));
        }) as Box<dyn FnMut(Event)>);

        let on_timeout = Closure::wrap(Box::new(|id: JsValue| {
            let Some(id) = timer_id(&id) else {
                return;
            };
            crate::with_observer(|observer| {
                observer.host_mut().timers.remove(&id);
                observer.on_timer(id);
            });
        }) as Box<dyn FnMut(JsValue)>);

        Ok(Self {
            window,
            document,
            port: channel.port2(),
            timers: HashMap::new(),
            listener,
            inert_click: None,
            _on_message: on_message,
            on_timeout,
        })
    }
}

impl Host for WebHost {
    type Target = JsValue;

    fn now(&self) -> HostTime {
        HostTime::from_millis(performance_now())
    }

    fn listen(&mut self, kind: EventKind) {
        if let Err(e) = self.window.add_event_listener_with_callback_and_bool(
            kind.name(),
            self.listener.as_ref().unchecked_ref(),
            true,
        ) {
            log::warn!("failed to listen for {kind}: {}", describe(&e));
        }
    }

    fn force_click_dispatch(&mut self) {
        let noop = Closure::wrap(Box::new(|| {}) as Box<dyn FnMut()>);
        if let Err(e) = self.document.add_event_listener_with_callback_and_bool(
            "click",
            noop.as_ref().unchecked_ref(),
            true,
        ) {
            log::warn!("failed to install inert click listener: {}", describe(&e));
        }
        self.inert_click = Some(noop);
    }

    fn post_message(&mut self, id: CallbackId) {
        if let Err(e) = self.port.post_message(&id_to_js(id.0)) {
            log::warn!("postMessage failed for {id:?}: {}", describe(&e));
        }
    }

    fn set_timeout(&mut self, id: TimerId, delay: Duration) {
        let ms = i32::try_from(delay.micros().div_ceil(1_000)).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_1(
                self.on_timeout.as_ref().unchecked_ref(),
                ms,
                &id_to_js(id.0),
            ) {
            Ok(handle) => {
                self.timers.insert(id, handle);
            }
            Err(e) => log::warn!("setTimeout failed for {id:?}: {}", describe(&e)),
        }
    }

    fn clear_timeout(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

// Ids stay far below 2^53 within one page.
fn id_to_js(id: u64) -> JsValue {
    JsValue::from_f64(id as f64)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "payload was produced by `id_to_js`"
)]
fn id_from_js(value: &JsValue) -> Option<u64> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

fn callback_id(value: &JsValue) -> Option<CallbackId> {
    id_from_js(value).map(CallbackId)
}

fn timer_id(value: &JsValue) -> Option<TimerId> {
    id_from_js(value).map(TimerId)
}

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}
