//! The flow field seam.
//!
//! A flow field integrates a decaying trail of pointer impulses into a vector
//! texture. The controller only talks to it through [`FlowField`], so the GPU
//! flowmap and test doubles are interchangeable.

use crate::fit::FitVector;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Move `self` towards `target` by `t` of the remaining distance.
    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Pointer position in `[0,1]²` with the origin at the bottom-left, or
/// [`NormalizedPointer::INACTIVE`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPointer(Vec2);

impl NormalizedPointer {
    /// Far enough outside the unit square that no stamp reaches the texture.
    pub const INACTIVE: NormalizedPointer = NormalizedPointer(Vec2 { x: -1.0, y: -1.0 });

    /// Convert a container-relative pixel position. Screen y grows downwards,
    /// texture v grows upwards.
    pub fn from_container(x: f64, y: f64, width: f64, height: f64) -> Self {
        NormalizedPointer(Vec2::new(
            (x / width) as f32,
            (1.0 - y / height) as f32,
        ))
    }

    pub fn as_vec2(&self) -> Vec2 {
        self.0
    }
}

impl Default for NormalizedPointer {
    fn default() -> Self {
        Self::INACTIVE
    }
}

pub trait FlowField {
    fn set_mouse(&mut self, pointer: NormalizedPointer);
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    /// Advance the trail by one simulation tick.
    fn update(&mut self);
}

/// Ease the field's velocity towards `target`. A moving target is followed
/// with `attack`, a resting one is released with the slower `release`.
pub fn blend_velocity<F: FlowField + ?Sized>(flow: &mut F, target: Vec2, attack: f32, release: f32) {
    let factor = if target.length() > 0.0 { attack } else { release };
    let blended = flow.velocity().lerp(target, factor);
    flow.set_velocity(blended);
}

/// Draws the distorted image. `Flow` is the field whose texture the draw
/// samples.
pub trait RenderPipeline {
    type Flow: FlowField;

    /// Resize the drawing surface to the container's CSS size and report the
    /// resulting drawing-buffer size in pixels.
    fn set_size(&mut self, width: f64, height: f64) -> (u32, u32);
    fn set_fit(&mut self, fit: FitVector);
    fn render(&mut self, flow: &Self::Flow);
}
