//! One-shot and repeating timer guards over the browser event loop.
//!
//! Timed choreography is expressed as explicit `(delay, action)` steps on a
//! [`Sequence`] instead of hand-nested callbacks, so a whole routine can be
//! cancelled as a unit (dropping the guard clears every pending handle).
//! Intervals get the same treatment via [`Interval`]: the repeating callback
//! is cleared and dropped with its guard, which is what prevents a flight
//! animation from leaking a forever-firing trail emitter.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::window;

/// A cancellable bundle of scheduled one-shot steps. All delays are relative
/// to the moment the step is registered.
#[derive(Default)]
pub struct Sequence {
    timeouts: Rc<RefCell<Vec<i32>>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run once after `delay_ms`. Cancelled handles that
    /// already fired are harmless to clear later.
    pub fn at(&mut self, delay_ms: i32, action: impl FnOnce() + 'static) {
        let Some(win) = window() else {
            log::warn!("no window; dropping scheduled step");
            return;
        };
        let cb = Closure::once_into_js(action);
        match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.unchecked_ref(),
            delay_ms,
        ) {
            Ok(id) => self.timeouts.borrow_mut().push(id),
            Err(e) => log::warn!("setTimeout failed: {e:?}"),
        }
    }

    /// Clear every still-pending step.
    pub fn cancel(&mut self) {
        if let Some(win) = window() {
            for id in self.timeouts.borrow_mut().drain(..) {
                win.clear_timeout_with_handle(id);
            }
        }
    }
}

impl Drop for Sequence {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A repeating callback that is cleared when the guard is dropped.
pub struct Interval {
    id: i32,
    _cb: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn every(period_ms: i32, action: impl FnMut() + 'static) -> Option<Self> {
        let win = window()?;
        let cb = Closure::wrap(Box::new(action) as Box<dyn FnMut()>);
        match win.set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            period_ms,
        ) {
            Ok(id) => Some(Self { id, _cb: cb }),
            Err(e) => {
                log::warn!("setInterval failed: {e:?}");
                None
            }
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(win) = window() {
            win.clear_interval_with_handle(self.id);
        }
    }
}
