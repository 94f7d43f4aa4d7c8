//! Effect lifecycle.
//!
//! `EffectController` owns everything one mounted effect mutates: the velocity
//! tracker, the normalized pointer, the fit vector and, once the image has
//! decoded, the render pipeline with its flow field. Event handlers only write
//! into it; drawing happens exclusively from [`EffectController::tick`].

use log::{debug, error};

use crate::config::EffectConfig;
use crate::error::EffectError;
use crate::fit::{compute_fit, ContainerSize, FitVector};
use crate::flow::{blend_velocity, FlowField, NormalizedPointer, RenderPipeline, Vec2};
use crate::schedule::FrameControl;
use crate::velocity::VelocityTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectState {
    Loading,
    Ready,
    Running,
    Failed,
    Disposed,
}

impl EffectState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EffectState::Failed | EffectState::Disposed)
    }
}

/// Natural size of the decoded source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Height over width; `None` for an empty image.
    pub fn aspect(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.height as f64 / self.width as f64)
    }
}

struct Stage<P: RenderPipeline> {
    pipeline: P,
    flow: P::Flow,
}

pub struct EffectController<P: RenderPipeline> {
    config: EffectConfig,
    state: EffectState,
    stage: Option<Stage<P>>,
    tracker: VelocityTracker,
    pointer: NormalizedPointer,
    target: Vec2,
    container: Option<ContainerSize>,
    image_aspect: Option<f64>,
    fit: Option<FitVector>,
}

impl<P: RenderPipeline> EffectController<P> {
    pub fn new(config: EffectConfig) -> Self {
        let tracker = VelocityTracker::new(config.min_delta_ms);
        Self {
            config,
            state: EffectState::Loading,
            stage: None,
            tracker,
            pointer: NormalizedPointer::INACTIVE,
            target: Vec2::ZERO,
            container: None,
            image_aspect: None,
            fit: None,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn fit(&self) -> Option<FitVector> {
        self.fit
    }

    pub fn pointer(&self) -> NormalizedPointer {
        self.pointer
    }

    /// Velocity the flow field is currently being eased towards.
    pub fn target_velocity(&self) -> Vec2 {
        self.target
    }

    pub fn pipeline(&self) -> Option<&P> {
        self.stage.as_ref().map(|stage| &stage.pipeline)
    }

    pub fn flow(&self) -> Option<&P::Flow> {
        self.stage.as_ref().map(|stage| &stage.flow)
    }

    /// The image decoded and its pipeline was built: take ownership of both
    /// and size them to the last known container.
    ///
    /// Ignored unless the effect is still loading.
    pub fn on_image_loaded(&mut self, image: ImageInfo, pipeline: P, flow: P::Flow) -> bool {
        if self.state != EffectState::Loading {
            debug!("dropping pipeline built while {:?}", self.state);
            return false;
        }
        self.image_aspect = image.aspect();
        self.stage = Some(Stage { pipeline, flow });
        self.state = EffectState::Ready;
        debug!("effect ready ({}x{})", image.width, image.height);

        if let Some(size) = self.container {
            self.on_resize(size.width, size.height);
        }
        true
    }

    /// Image decode or pipeline construction failed. The effect never runs.
    pub fn fail(&mut self, err: &EffectError) {
        if self.state.is_terminal() {
            return;
        }
        error!("distortion effect failed: {err}");
        self.state = EffectState::Failed;
        self.stage = None;
    }

    /// Container box changed. Returns whether a new fit was applied.
    ///
    /// A degenerate box is a no-op that keeps the previous fit.
    pub fn on_resize(&mut self, width: f64, height: f64) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let size = ContainerSize::new(width, height);
        if size.is_degenerate() {
            debug!("ignoring degenerate resize {width}x{height}");
            return false;
        }
        self.container = Some(size);

        let Some(stage) = self.stage.as_mut() else {
            return false;
        };
        let aspect = self.image_aspect.unwrap_or(1.0);
        let Some(scale) = compute_fit(width, height, aspect) else {
            return false;
        };
        let (draw_width, draw_height) = stage.pipeline.set_size(width, height);
        let fit = FitVector::new(draw_width, draw_height, scale);
        stage.pipeline.set_fit(fit);
        self.fit = Some(fit);
        true
    }

    /// Pointer moved to `(x, y)` relative to the container's top-left corner.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, container: ContainerSize, now_ms: f64) {
        if !matches!(self.state, EffectState::Ready | EffectState::Running) || container.is_degenerate() {
            return;
        }
        self.pointer = NormalizedPointer::from_container(x, y, container.width, container.height);
        self.tracker.on_pointer_move(x, y, now_ms);
    }

    /// One animation frame: decay when idle, feed the flow field, advance it
    /// and draw.
    pub fn tick(&mut self) -> FrameControl {
        match self.state {
            EffectState::Ready => {
                debug!("effect running");
                self.state = EffectState::Running;
            }
            EffectState::Running => {}
            EffectState::Loading | EffectState::Failed | EffectState::Disposed => {
                return FrameControl::Stop;
            }
        }

        self.settle_velocity();

        let Some(stage) = self.stage.as_mut() else {
            return FrameControl::Stop;
        };
        stage.flow.set_mouse(self.pointer);
        blend_velocity(
            &mut stage.flow,
            self.target,
            self.config.velocity_attack,
            self.config.velocity_release,
        );
        stage.flow.update();
        stage.pipeline.render(&stage.flow);
        FrameControl::Continue
    }

    fn settle_velocity(&mut self) {
        let velocity = self.tracker.consume();
        if velocity.dirty {
            self.target = Vec2::new(velocity.vx as f32, velocity.vy as f32);
        } else {
            self.pointer = NormalizedPointer::INACTIVE;
            self.target = Vec2::ZERO;
        }
    }

    /// Tear down. GPU objects owned by the stage are released on drop.
    /// Returns `false` if the effect was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.state == EffectState::Disposed {
            return false;
        }
        debug!("disposing effect in state {:?}", self.state);
        self.state = EffectState::Disposed;
        self.stage = None;
        self.tracker.reset();
        self.pointer = NormalizedPointer::INACTIVE;
        self.target = Vec2::ZERO;
        true
    }
}
