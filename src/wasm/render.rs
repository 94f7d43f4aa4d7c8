use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGl2RenderingContext as GL, WebGlContextAttributes,
    WebGlUniformLocation,
};

use super::flowmap::GpuFlowmap;
use super::gl::{Program, Texture, Triangle, FULLSCREEN_VERTEX};
use crate::config::EffectConfig;
use crate::error::EffectError;
use crate::fit::FitVector;
use crate::flow::RenderPipeline;

const DISTORTION_FRAGMENT: &str = r#"#version 300 es
precision highp float;
uniform sampler2D tWater;
uniform sampler2D tFlow;
uniform vec4 res;
uniform float uStrength;
in vec2 vUv;
out vec4 fragColor;
void main() {
    vec3 flow = texture(tFlow, vUv).rgb;
    vec2 uv = (vUv - 0.5) * res.zw + 0.5;
    uv -= flow.xy * uStrength;
    fragColor = vec4(texture(tWater, uv).rgb, 1.0);
}
"#;

const IMAGE_UNIT: u32 = 0;
const FLOW_UNIT: u32 = 1;

/// WebGL2 context with a transparent backbuffer.
pub(super) fn create_context(canvas: &HtmlCanvasElement) -> Result<GL, EffectError> {
    let attributes = WebGlContextAttributes::new();
    attributes.set_alpha(true);
    attributes.set_premultiplied_alpha(false);
    attributes.set_antialias(false);

    canvas
        .get_context_with_context_options("webgl2", &attributes)?
        .ok_or(EffectError::WebGlUnavailable)?
        .dyn_into::<GL>()
        .map_err(|_| EffectError::WebGlUnavailable)
}

/// Draws the source image through the flow field onto the canvas.
pub(super) struct DistortionPipeline {
    gl: GL,
    canvas: HtmlCanvasElement,
    device_pixel_ratio: f64,
    program: Program,
    triangle: Triangle,
    image: Texture,
    res: WebGlUniformLocation,
}

impl DistortionPipeline {
    pub fn new(
        gl: &GL,
        canvas: HtmlCanvasElement,
        source: &HtmlImageElement,
        config: &EffectConfig,
    ) -> Result<Self, EffectError> {
        let image = Texture::new(gl)?;
        image.upload_image(source)?;

        let program = Program::compile(gl, FULLSCREEN_VERTEX, DISTORTION_FRAGMENT)?;
        program.bind();
        gl.uniform1i(Some(&program.uniform("tWater")?), IMAGE_UNIT as i32);
        gl.uniform1i(Some(&program.uniform("tFlow")?), FLOW_UNIT as i32);
        gl.uniform1f(Some(&program.uniform("uStrength")?), config.strength);
        let res = program.uniform("res")?;
        // Identity fit until the first resize lands.
        gl.uniform4f(Some(&res), 1.0, 1.0, 1.0, 1.0);

        Ok(Self {
            gl: gl.clone(),
            canvas,
            device_pixel_ratio: config.device_pixel_ratio,
            program,
            triangle: Triangle::new(gl)?,
            image,
            res,
        })
    }
}

impl RenderPipeline for DistortionPipeline {
    type Flow = GpuFlowmap;

    fn set_size(&mut self, width: f64, height: f64) -> (u32, u32) {
        self.canvas
            .set_width((width * self.device_pixel_ratio).round() as u32);
        self.canvas
            .set_height((height * self.device_pixel_ratio).round() as u32);
        // The browser may clamp the drawing buffer below the requested size.
        (
            self.gl.drawing_buffer_width().max(0) as u32,
            self.gl.drawing_buffer_height().max(0) as u32,
        )
    }

    fn set_fit(&mut self, fit: FitVector) {
        let [w, h, sx, sy] = fit.as_uniform();
        self.program.bind();
        self.gl.uniform4f(Some(&self.res), w, h, sx, sy);
    }

    fn render(&mut self, flow: &GpuFlowmap) {
        let gl = &self.gl;
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        gl.viewport(0, 0, gl.drawing_buffer_width(), gl.drawing_buffer_height());
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);

        self.program.bind();
        self.image.bind(IMAGE_UNIT);
        flow.texture().bind(FLOW_UNIT);
        self.triangle.draw();
    }
}
