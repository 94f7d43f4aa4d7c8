use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::error;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use crate::error::EffectError;
use crate::schedule::{CancellationToken, FrameControl};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A `requestAnimationFrame` loop that can be stopped from outside or by the
/// frame itself. Dropping the loop cancels it.
pub(super) struct AnimationLoop {
    window: Window,
    token: CancellationToken,
    pending: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl AnimationLoop {
    pub fn start<F>(mut frame: F) -> Result<Self, EffectError>
    where
        F: FnMut(f64) -> FrameControl + 'static,
    {
        let window = web_sys::window().ok_or(EffectError::MissingElement("window"))?;
        let token = CancellationToken::new();
        let pending = Rc::new(Cell::new(None));
        // `callback` holds the frame closure so it can re-request itself. The
        // closure keeps a clone of the Rc; the cycle is broken by taking it
        // out on the last frame or on cancel.
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        let (loop_window, loop_token, loop_pending, loop_callback) =
            (window.clone(), token.clone(), pending.clone(), callback.clone());
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            loop_pending.set(None);
            if loop_token.is_cancelled() || frame(timestamp) == FrameControl::Stop {
                loop_token.cancel();
                let _ = loop_callback.borrow_mut().take();
                return;
            }
            if let Err(err) = request(&loop_window, &loop_callback, &loop_pending) {
                error!("animation loop stopped: {err}");
                loop_token.cancel();
                let _ = loop_callback.borrow_mut().take();
            }
        }) as Box<dyn FnMut(f64)>));

        request(&window, &callback, &pending)?;
        Ok(Self {
            window,
            token,
            pending,
            callback,
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(id) = self.pending.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                error!("cancelAnimationFrame failed: {err:?}");
            }
        }
        let _ = self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn request(window: &Window, callback: &FrameCallback, pending: &Cell<Option<i32>>) -> Result<(), EffectError> {
    let callback = callback.borrow();
    let Some(closure) = callback.as_ref() else {
        return Ok(());
    };
    let id = window.request_animation_frame(closure.as_ref().unchecked_ref())?;
    pending.set(Some(id));
    Ok(())
}
