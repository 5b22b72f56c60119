// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for the Event Timing polyfill.
//!
//! This crate binds [`event_timing_core`] to browser APIs:
//!
//! - [`WebHost`]: capture-phase listeners, `MessageChannel` round trips and
//!   `setTimeout` flush timers
//! - [`RafLoop`]: the `requestAnimationFrame` loop that tracks frame starts
//!
//! The page has a single observer. It lives in a thread-local slot, is
//! created by the first call to [`init_observer`] or [`on_interaction`], and
//! is never torn down.
//!
//! # JavaScript exports
//!
//! | Export              | Rust                     |
//! |---------------------|--------------------------|
//! | `initObserver()`    | [`init_observer`]        |
//! | `onInteraction(cb)` | [`on_interaction`]       |
//! | `interactionEvents` | [`interaction_events`]   |
//! | `installPolyfill()` | [`install`]              |

mod convert;
mod host;
mod raf;

pub use host::WebHost;
pub use raf::RafLoop;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use event_timing_core::{INTERACTION_EVENTS, InteractionObserver, ObserverConfig};

use crate::host::describe;

/// Setup failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// There is no global `window` (e.g. inside a worker).
    #[error("no global `window`")]
    NoWindow,
    /// The window has no `document`.
    #[error("window has no `document`")]
    NoDocument,
    /// `new MessageChannel()` threw.
    #[error("failed to create MessageChannel: {0}")]
    MessageChannel(String),
    /// Called from inside an observer callback.
    #[error("observer is busy; call again outside interaction callbacks")]
    Reentrant,
}

impl From<InitError> for JsValue {
    fn from(e: InitError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}

/// What the current environment offers.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Support {
    /// No `PerformanceObserver`; the polyfill stays inactive.
    Unsupported,
    /// Event timing with `interactionId` is implemented natively.
    Native,
    /// `PerformanceObserver` exists but event timing does not.
    Polyfill,
}

struct Polyfill {
    observer: InteractionObserver<WebHost>,
    frames: Option<RafLoop>,
}

thread_local! {
    static POLYFILL: RefCell<Option<Polyfill>> = const { RefCell::new(None) };
}

/// Runs `f` on the page's observer if it exists and is not already in use.
pub(crate) fn with_observer<R>(
    f: impl FnOnce(&mut InteractionObserver<WebHost>) -> R,
) -> Option<R> {
    POLYFILL.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            log::warn!("event timing observer re-entered; signal dropped");
            return None;
        };
        slot.as_mut().map(|p| f(&mut p.observer))
    })
}

/// Creates the observer if needed, then runs `f` on the slot.
fn with_polyfill<R>(f: impl FnOnce(&mut Polyfill) -> R) -> Result<R, InitError> {
    POLYFILL.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| InitError::Reentrant)?;
        let polyfill = match slot.take() {
            Some(existing) => existing,
            None => Polyfill {
                observer: InteractionObserver::new(WebHost::new()?, ObserverConfig::default()),
                frames: None,
            },
        };
        Ok(f(slot.insert(polyfill)))
    })
}

/// Attaches listeners and starts the frame loop. Safe to call repeatedly.
pub fn init() -> Result<(), InitError> {
    with_polyfill(|polyfill| {
        if !polyfill.observer.init() {
            return;
        }
        let frames = RafLoop::new(|tick| {
            with_observer(|observer| observer.on_frame(tick));
        });
        frames.start();
        polyfill.frames = Some(frames);
    })
}

/// `initObserver()`: idempotent setup entry point.
#[wasm_bindgen(js_name = initObserver)]
pub fn init_observer() -> Result<(), JsValue> {
    init().map_err(Into::into)
}

/// `onInteraction(cb)`: registers `callback` to receive an array of measure
/// objects per flushed interaction. Registrations are additive.
#[wasm_bindgen(js_name = onInteraction)]
pub fn on_interaction(callback: js_sys::Function) -> Result<(), JsValue> {
    with_polyfill(|polyfill| {
        polyfill.observer.on_interaction(move |group| {
            let entries = convert::group_to_js(group);
            if let Err(e) = callback.call1(&JsValue::NULL, &entries) {
                log::warn!("interaction callback threw: {}", describe(&e));
            }
        });
    })
    .map_err(Into::into)
}

/// `interactionEvents`: `{ pointer: [...], keyboard: [...] }`.
#[wasm_bindgen(js_name = interactionEvents)]
pub fn interaction_events() -> JsValue {
    convert::interaction_events_to_js(&INTERACTION_EVENTS).into()
}

fn global_has(target: &JsValue, key: &str) -> bool {
    js_sys::Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
}

fn global_get(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined())
}

/// Probes the global scope for `PerformanceObserver` and native event timing.
#[must_use]
pub fn detect_support() -> Support {
    let global: JsValue = js_sys::global().into();
    if !global_has(&global, "PerformanceObserver") {
        return Support::Unsupported;
    }
    let native = global_get(&global, "PerformanceEventTiming")
        .and_then(|ctor| global_get(&ctor, "prototype"))
        .is_some_and(|proto| global_has(&proto, "interactionId"));
    if native {
        Support::Native
    } else {
        Support::Polyfill
    }
}

/// Returns `true` when the page set `window.forceEventTimingPolyfill`.
#[must_use]
pub fn polyfill_forced() -> bool {
    let global: JsValue = js_sys::global().into();
    global_get(&global, "forceEventTimingPolyfill").is_some_and(|v| v.is_truthy())
}

/// Starts the observer unless the environment makes it pointless.
///
/// Without `PerformanceObserver` nothing happens. With native support the
/// polyfill yields unless [`polyfill_forced`]. Returns what was detected.
pub fn install() -> Result<Support, InitError> {
    let support = detect_support();
    match support {
        Support::Unsupported => {
            log::debug!("PerformanceObserver missing; event timing polyfill inactive");
        }
        Support::Native if !polyfill_forced() => {
            log::debug!("native event timing present; polyfill yields");
        }
        Support::Native | Support::Polyfill => init()?,
    }
    Ok(support)
}

/// `installPolyfill()`: see [`install`].
#[wasm_bindgen(js_name = installPolyfill)]
pub fn install_polyfill() -> Result<Support, JsValue> {
    install().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_error_messages() {
        assert_eq!(InitError::NoWindow.to_string(), "no global `window`");
        assert_eq!(
            InitError::MessageChannel("denied".into()).to_string(),
            "failed to create MessageChannel: denied"
        );
    }
}
