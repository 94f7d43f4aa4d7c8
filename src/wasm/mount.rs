//! Binding one effect to one DOM container.
//!
//! Every callback (image load, pointer, resize, animation frame) holds a
//! strong handle to the shared [`Mount`], which keeps an auto-mounted effect
//! alive without anything on the JavaScript side referencing it. Disposal
//! drops those callbacks and with them the cycle.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    MouseEvent, Performance, ResizeObserver, TouchEvent, WebGl2RenderingContext as GL,
};

use super::animation::AnimationLoop;
use super::flowmap::GpuFlowmap;
use super::render::{create_context, DistortionPipeline};
use crate::config::EffectConfig;
use crate::controller::{EffectController, EffectState, ImageInfo};
use crate::error::EffectError;
use crate::fit::ContainerSize;
use crate::input::InputSource;
use crate::schedule::FrameControl;

const CONTAINER_SELECTOR: &str = ".distortion-container";
const IMAGE_SELECTOR: &str = ".distortion-img";
const CANVAS_STYLE: &str = "display:block;width:100%;height:100%;";

type Shared = Rc<RefCell<Mount>>;

/// Mount every container on the page. Containers that cannot be mounted are
/// skipped; returns how many started loading.
pub(super) fn mount_all(document: &Document) -> Result<usize, JsValue> {
    let containers = document.query_selector_all(CONTAINER_SELECTOR)?;
    let mut started = 0;
    for index in 0..containers.length() {
        let Some(container) = containers
            .item(index)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        match Mount::start(container) {
            Ok(_) => started += 1,
            Err(err) => warn!("skipping distortion container: {err}"),
        }
    }
    Ok(started)
}

/// Mount an effect on `container`, which must hold a `.distortion-img` child.
#[wasm_bindgen]
pub fn mount(container: HtmlElement) -> Result<EffectHandle, JsValue> {
    let mount = Mount::start(container)?;
    Ok(EffectHandle { mount })
}

/// JavaScript-side handle to a mounted effect. Dropping it leaves the effect
/// running; call `dispose` to tear it down.
#[wasm_bindgen]
pub struct EffectHandle {
    mount: Shared,
}

#[wasm_bindgen]
impl EffectHandle {
    pub fn dispose(&self) {
        match self.mount.try_borrow_mut() {
            Ok(mut mount) => mount.dispose(),
            Err(_) => warn!("dispose called re-entrantly, ignored"),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.mount.try_borrow() {
            Ok(mount) => format!("{:?}", mount.controller.state()).to_lowercase(),
            Err(_) => "busy".to_string(),
        }
    }
}

struct PendingImage {
    element: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        self.element.set_onload(None);
        self.element.set_onerror(None);
    }
}

struct Listeners {
    container: HtmlElement,
    source: InputSource,
    pointer: Closure<dyn FnMut(Event)>,
    observer: ResizeObserver,
    _resize: Closure<dyn FnMut(js_sys::Array)>,
}

impl Listeners {
    fn attach(this: &Shared, container: &HtmlElement, source: InputSource) -> Result<Self, EffectError> {
        let pointer_mount = this.clone();
        let pointer = Closure::wrap(Box::new(move |event: Event| {
            if let Ok(mut mount) = pointer_mount.try_borrow_mut() {
                mount.on_pointer(source, &event);
            }
        }) as Box<dyn FnMut(Event)>);

        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        container.add_event_listener_with_callback_and_add_event_listener_options(
            source.event_name(),
            pointer.as_ref().unchecked_ref(),
            &options,
        )?;

        let resize_mount = this.clone();
        let resize = Closure::wrap(Box::new(move |_entries: js_sys::Array| {
            if let Ok(mut mount) = resize_mount.try_borrow_mut() {
                mount.on_resize();
            }
        }) as Box<dyn FnMut(js_sys::Array)>);
        let observer = match ResizeObserver::new(resize.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                if let Err(err) = container
                    .remove_event_listener_with_callback(source.event_name(), pointer.as_ref().unchecked_ref())
                {
                    warn!("failed to remove pointer listener: {err:?}");
                }
                return Err(err.into());
            }
        };
        observer.observe(container);

        Ok(Self {
            container: container.clone(),
            source,
            pointer,
            observer,
            _resize: resize,
        })
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.observer.disconnect();
        if let Err(err) = self.container.remove_event_listener_with_callback(
            self.source.event_name(),
            self.pointer.as_ref().unchecked_ref(),
        ) {
            warn!("failed to remove pointer listener: {err:?}");
        }
    }
}

struct Mount {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    gl: GL,
    performance: Performance,
    controller: EffectController<DistortionPipeline>,
    image: Option<PendingImage>,
    listeners: Option<Listeners>,
    animation: Option<AnimationLoop>,
}

impl Mount {
    fn start(container: HtmlElement) -> Result<Shared, EffectError> {
        let src = image_source(&container)?;
        let config = container_config(&container);

        let window = web_sys::window().ok_or(EffectError::MissingElement("window"))?;
        let performance = window
            .performance()
            .ok_or(EffectError::MissingElement("performance"))?;
        let document = container
            .owner_document()
            .ok_or(EffectError::MissingElement("document"))?;
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| EffectError::Allocation("canvas"))?;
        canvas.set_attribute("style", CANVAS_STYLE)?;
        let gl = create_context(&canvas)?;
        container.append_child(&canvas)?;

        let mut controller = EffectController::new(config);
        let rect = container.get_bounding_client_rect();
        controller.on_resize(rect.width(), rect.height());

        let this = Rc::new(RefCell::new(Mount {
            container,
            canvas,
            gl,
            performance,
            controller,
            image: None,
            listeners: None,
            animation: None,
        }));

        if let Err(err) = Mount::load_image(&this, &src) {
            this.borrow_mut().fail(&err);
            return Err(err);
        }
        debug!("loading {src}");
        Ok(this)
    }

    fn load_image(this: &Shared, src: &str) -> Result<(), EffectError> {
        let element = HtmlImageElement::new()?;

        let load_mount = this.clone();
        let onload = Closure::wrap(Box::new(move || {
            if let Err(err) = Mount::ready(&load_mount) {
                if let Ok(mut mount) = load_mount.try_borrow_mut() {
                    mount.fail(&err);
                }
            }
        }) as Box<dyn FnMut()>);

        let error_mount = this.clone();
        let error_src = src.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            if let Ok(mut mount) = error_mount.try_borrow_mut() {
                mount.fail(&EffectError::ImageDecode {
                    src: error_src.clone(),
                });
            }
        }) as Box<dyn FnMut()>);

        element.set_onload(Some(onload.as_ref().unchecked_ref()));
        element.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        element.set_src(src);

        this.borrow_mut().image = Some(PendingImage {
            element,
            _onload: onload,
            _onerror: onerror,
        });
        Ok(())
    }

    /// Image decoded: build the GPU side, size it, bind events, start the loop.
    fn ready(this: &Shared) -> Result<(), EffectError> {
        let mut mount = this.try_borrow_mut().map_err(|_| EffectError::Js("mount busy".into()))?;
        let Some(pending) = mount.image.take() else {
            return Ok(());
        };
        if mount.controller.state() != EffectState::Loading {
            return Ok(());
        }
        if !mount.container.is_connected() {
            debug!("container detached while loading");
            mount.dispose();
            return Ok(());
        }

        let element = &pending.element;
        let info = ImageInfo {
            width: element.natural_width(),
            height: element.natural_height(),
        };
        let pipeline = DistortionPipeline::new(
            &mount.gl,
            mount.canvas.clone(),
            element,
            mount.controller.config(),
        )?;
        let flow = GpuFlowmap::new(&mount.gl, &mount.controller.config().flowmap)?;
        drop(pending);

        mount.controller.on_image_loaded(info, pipeline, flow);
        mount.on_resize();

        let window = web_sys::window().ok_or(EffectError::MissingElement("window"))?;
        let touch = js_sys::Reflect::has(&window, &JsValue::from_str("ontouchstart")).unwrap_or(false);
        let source = InputSource::from_touch_support(touch);
        let container = mount.container.clone();
        mount.listeners = Some(Listeners::attach(this, &container, source)?);

        let frame_mount = this.clone();
        mount.animation = Some(AnimationLoop::start(move |_timestamp| Mount::frame(&frame_mount))?);
        debug!("listening for {}", source.event_name());
        Ok(())
    }

    fn frame(this: &Shared) -> FrameControl {
        let Ok(mut mount) = this.try_borrow_mut() else {
            return FrameControl::Continue;
        };
        if !mount.container.is_connected() {
            debug!("container detached");
            mount.dispose();
            return FrameControl::Stop;
        }
        mount.controller.tick()
    }

    fn on_pointer(&mut self, source: InputSource, event: &Event) {
        let Some((client_x, client_y)) = client_position(source, event) else {
            return;
        };
        let rect = self.container.get_bounding_client_rect();
        self.controller.on_pointer_move(
            client_x - rect.left(),
            client_y - rect.top(),
            ContainerSize::new(rect.width(), rect.height()),
            self.performance.now(),
        );
    }

    fn on_resize(&mut self) {
        let rect = self.container.get_bounding_client_rect();
        self.controller.on_resize(rect.width(), rect.height());
    }

    fn fail(&mut self, err: &EffectError) {
        self.controller.fail(err);
        self.teardown();
    }

    fn dispose(&mut self) {
        if self.controller.dispose() {
            self.teardown();
        }
    }

    fn teardown(&mut self) {
        self.animation = None;
        self.listeners = None;
        self.image = None;
        self.canvas.remove();
    }
}

fn client_position(source: InputSource, event: &Event) -> Option<(f64, f64)> {
    match source {
        InputSource::Mouse => event
            .dyn_ref::<MouseEvent>()
            .map(|event| (event.client_x() as f64, event.client_y() as f64)),
        InputSource::Touch => event
            .dyn_ref::<TouchEvent>()
            .and_then(|event| event.changed_touches().get(0))
            .map(|touch| (touch.client_x() as f64, touch.client_y() as f64)),
    }
}

fn image_source(container: &HtmlElement) -> Result<String, EffectError> {
    let element = container
        .query_selector(IMAGE_SELECTOR)?
        .ok_or(EffectError::MissingElement(IMAGE_SELECTOR))?;
    // Prefer the resolved URL of a real <img>.
    let src = match element.dyn_ref::<HtmlImageElement>() {
        Some(image) => image.src(),
        None => element.get_attribute("src").unwrap_or_default(),
    };
    if src.is_empty() {
        return Err(EffectError::MissingElement("image src"));
    }
    Ok(src)
}

fn container_config(container: &HtmlElement) -> EffectConfig {
    let overrides: Vec<(&str, String)> = EffectConfig::OVERRIDE_KEYS
        .iter()
        .filter_map(|key| {
            container
                .get_attribute(&format!("data-{key}"))
                .map(|value| (*key, value))
        })
        .collect();

    let mut config = EffectConfig::default();
    let applied = config.apply_overrides(overrides.iter().map(|(key, value)| (*key, value.as_str())));
    if applied > 0 {
        debug!("{applied} setting(s) overridden");
    }
    config
}
