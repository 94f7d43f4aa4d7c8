//! Aspect-correct image fitting.
//!
//! The distortion shader remaps its sampling coordinate around the texture
//! centre, `(uv - 0.5) * scale + 0.5`, so the factors computed here decide how
//! much of the image is visible along each axis. The image always covers the
//! container; the excess is cropped symmetrically and never stretched.

/// Container size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero-area or non-finite boxes cannot produce an aspect ratio.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitScale {
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Drawing-buffer size plus fit factors, packed the way the shader reads `res`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitVector {
    pub draw_width: u32,
    pub draw_height: u32,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl FitVector {
    pub fn new(draw_width: u32, draw_height: u32, scale: FitScale) -> Self {
        Self {
            draw_width,
            draw_height,
            scale_x: scale.scale_x,
            scale_y: scale.scale_y,
        }
    }

    pub fn as_uniform(&self) -> [f32; 4] {
        [
            self.draw_width as f32,
            self.draw_height as f32,
            self.scale_x as f32,
            self.scale_y as f32,
        ]
    }
}

/// `image_aspect` is `image_height / image_width`.
///
/// Returns `None` for degenerate geometry so the caller can keep its last fit.
pub fn compute_fit(container_width: f64, container_height: f64, image_aspect: f64) -> Option<FitScale> {
    if ContainerSize::new(container_width, container_height).is_degenerate()
        || !image_aspect.is_finite()
        || image_aspect <= 0.0
    {
        return None;
    }

    let container_aspect = container_height / container_width;
    let scale = if container_aspect < image_aspect {
        FitScale {
            scale_x: 1.0,
            scale_y: container_aspect / image_aspect,
        }
    } else {
        FitScale {
            scale_x: (container_width / container_height) * image_aspect,
            scale_y: 1.0,
        }
    };
    Some(scale)
}
