#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod config;
pub mod controller;
pub mod error;
pub mod fit;
pub mod flow;
pub mod input;
pub mod schedule;
pub mod velocity;

pub use config::{EffectConfig, FlowmapConfig};
pub use controller::{EffectController, EffectState, ImageInfo};
pub use error::EffectError;
pub use fit::{compute_fit, ContainerSize, FitScale, FitVector};
pub use flow::{FlowField, NormalizedPointer, RenderPipeline, Vec2};
pub use input::InputSource;
pub use schedule::{CancellationToken, FrameControl};
pub use velocity::{VelocityState, VelocityTracker, MIN_DELTA_MS};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use log::{debug, info, Level};
    use wasm_bindgen::prelude::*;

    mod animation;
    mod flowmap;
    mod gl;
    mod mount;
    mod render;

    pub use mount::{mount, EffectHandle};

    /// Attribute on `<body>` that turns on debug logging.
    const DEBUG_ATTRIBUTE: &str = "data-distortion-debug";

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let debug = document
            .body()
            .is_some_and(|body| body.has_attribute(DEBUG_ATTRIBUTE));
        console_log::init_with_level(if debug { Level::Debug } else { Level::Info }).ok();

        let started = mount::mount_all(&document)?;
        if started == 0 {
            debug!("no .distortion-container on this page");
        } else {
            info!("distortion effects mounted: {started}");
        }
        Ok(())
    }
}
