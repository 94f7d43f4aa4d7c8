//! GPU flowmap: a small ping-pong pair of render targets into which the
//! pointer's velocity is stamped every frame while the previous trail fades.
//!
//! Red/green hold the (y-flipped) velocity, blue the stamp intensity.

use log::warn;
use web_sys::{WebGl2RenderingContext as GL, WebGlUniformLocation};

use super::gl::{Program, RenderTarget, Texture, Triangle, FULLSCREEN_VERTEX};
use crate::config::FlowmapConfig;
use crate::error::EffectError;
use crate::flow::{FlowField, NormalizedPointer, Vec2};

const FLOWMAP_FRAGMENT: &str = r#"#version 300 es
precision highp float;
uniform sampler2D tMap;
uniform float uFalloff;
uniform float uAlpha;
uniform float uDissipation;
uniform float uAspect;
uniform vec2 uMouse;
uniform vec2 uVelocity;
in vec2 vUv;
out vec4 fragColor;
void main() {
    vec4 color = texture(tMap, vUv) * uDissipation;
    vec2 cursor = vUv - uMouse;
    cursor.x *= uAspect;
    vec3 stamp = vec3(uVelocity * vec2(1.0, -1.0), 1.0 - pow(1.0 - min(1.0, length(uVelocity)), 3.0));
    float falloff = smoothstep(uFalloff, 0.0, length(cursor)) * uAlpha;
    color.rgb = mix(color.rgb, stamp, vec3(falloff));
    fragColor = color;
}
"#;

struct Uniforms {
    mouse: WebGlUniformLocation,
    velocity: WebGlUniformLocation,
}

pub(super) struct GpuFlowmap {
    gl: GL,
    program: Program,
    triangle: Triangle,
    targets: [RenderTarget; 2],
    read: usize,
    size: i32,
    uniforms: Uniforms,
    mouse: NormalizedPointer,
    velocity: Vec2,
}

impl GpuFlowmap {
    pub fn new(gl: &GL, config: &FlowmapConfig) -> Result<Self, EffectError> {
        let size = config.size as i32;
        let format = target_format(gl);
        let targets = [
            RenderTarget::new(gl, size, format)?,
            RenderTarget::new(gl, size, format)?,
        ];

        let program = Program::compile(gl, FULLSCREEN_VERTEX, FLOWMAP_FRAGMENT)?;
        program.bind();
        gl.uniform1i(Some(&program.uniform("tMap")?), 0);
        gl.uniform1f(Some(&program.uniform("uFalloff")?), config.falloff);
        gl.uniform1f(Some(&program.uniform("uAlpha")?), config.alpha);
        gl.uniform1f(Some(&program.uniform("uDissipation")?), config.dissipation);
        gl.uniform1f(Some(&program.uniform("uAspect")?), config.aspect);
        let uniforms = Uniforms {
            mouse: program.uniform("uMouse")?,
            velocity: program.uniform("uVelocity")?,
        };

        Ok(Self {
            gl: gl.clone(),
            program,
            triangle: Triangle::new(gl)?,
            targets,
            read: 0,
            size,
            uniforms,
            mouse: NormalizedPointer::INACTIVE,
            velocity: Vec2::ZERO,
        })
    }

    /// Latest simulated field.
    pub fn texture(&self) -> &Texture {
        self.targets[self.read].texture()
    }
}

/// Half-float keeps negative velocities; without a renderable float format
/// they clamp to zero and the trail only pushes one way.
fn target_format(gl: &GL) -> u32 {
    match gl.get_extension("EXT_color_buffer_float") {
        Ok(Some(_)) => GL::RGBA16F,
        _ => {
            warn!("EXT_color_buffer_float unavailable, flowmap falls back to RGBA8");
            GL::RGBA8
        }
    }
}

impl FlowField for GpuFlowmap {
    fn set_mouse(&mut self, pointer: NormalizedPointer) {
        self.mouse = pointer;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn update(&mut self) {
        let gl = &self.gl;
        let write = 1 - self.read;

        self.targets[write].bind();
        gl.viewport(0, 0, self.size, self.size);
        self.program.bind();
        self.targets[self.read].texture().bind(0);

        let mouse = self.mouse.as_vec2();
        gl.uniform2f(Some(&self.uniforms.mouse), mouse.x, mouse.y);
        gl.uniform2f(Some(&self.uniforms.velocity), self.velocity.x, self.velocity.y);
        self.triangle.draw();

        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        self.read = write;
    }
}
