// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame loop.
//!
//! [`RafLoop`] runs for the lifetime of the page and hands every animation
//! frame to the observer as a [`FrameTick`]. Each callback receives a
//! [`DOMHighResTimeStamp`][mdn] (milliseconds on the `performance.now()`
//! timeline), which is converted to microsecond [`HostTime`] ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`FrameTick`]: event_timing_core::timing::FrameTick
//! [`HostTime`]: event_timing_core::time::HostTime

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use event_timing_core::time::HostTime;
use event_timing_core::timing::FrameTick;

// Direct global bindings instead of `web_sys::Window` methods, so nothing has
// to be fetched (and unwrapped) on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A `requestAnimationFrame` loop that emits [`FrameTick`] events.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start) to begin
/// receiving callbacks. The loop re-registers itself each frame until
/// [`stop`](Self::stop) is called or the `RafLoop` is dropped.
///
/// [`FrameTick`]: event_timing_core::timing::FrameTick
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Stored in its own `RefCell` so it can be set once in `start()` and
    /// referenced from inside itself without conflicting with `callback`.
    closure: RefCell<Option<RafClosure>>,

    /// Receives one [`FrameTick`] per frame.
    callback: RefCell<Box<dyn FnMut(FrameTick)>>,

    running: Cell<bool>,

    /// The ID returned by the most recent `requestAnimationFrame` call.
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(FrameTick) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let inner = Rc::downgrade(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            if !inner.running.get() {
                return;
            }

            let tick = FrameTick {
                timestamp: HostTime::from_millis(timestamp_ms),
                now: HostTime::from_millis(performance_now()),
            };

            // Scoped so it doesn't overlap with the `closure` borrow below.
            inner.callback.borrow_mut()(tick);

            if inner.running.get()
                && let Some(ref closure) = *inner.closure.borrow()
            {
                let id = request_animation_frame(closure.as_ref().unchecked_ref());
                inner.raf_id.set(id);
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Stops the loop and cancels the pending callback. Can be restarted
    /// with [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .finish()
    }
}
