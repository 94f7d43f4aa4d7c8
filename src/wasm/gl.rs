//! Thin owning wrappers around raw WebGL2 objects. Each one deletes its GL
//! object on drop so tearing an effect down releases GPU memory.

use js_sys::Float32Array;
use web_sys::{
    HtmlImageElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlFramebuffer, WebGlProgram,
    WebGlShader, WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::error::EffectError;

/// Shared by both passes: a single triangle whose visible part spans the
/// viewport with `vUv` in `[0,1]²`.
pub(super) const FULLSCREEN_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 uv;
out vec2 vUv;
void main() {
    vUv = uv;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

const POSITIONS: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
const UVS: [f32; 6] = [0.0, 0.0, 2.0, 0.0, 0.0, 2.0];

pub(super) struct Program {
    gl: GL,
    program: WebGlProgram,
}

impl Program {
    pub fn compile(gl: &GL, vertex: &str, fragment: &str) -> Result<Self, EffectError> {
        let vs = compile_shader(gl, GL::VERTEX_SHADER, "vertex", vertex)?;
        let fs = match compile_shader(gl, GL::FRAGMENT_SHADER, "fragment", fragment) {
            Ok(fs) => fs,
            Err(err) => {
                gl.delete_shader(Some(&vs));
                return Err(err);
            }
        };

        let program = gl.create_program().ok_or(EffectError::Allocation("program"))?;
        gl.attach_shader(&program, &vs);
        gl.attach_shader(&program, &fs);
        gl.link_program(&program);
        // Linked programs keep their own copy.
        gl.delete_shader(Some(&vs));
        gl.delete_shader(Some(&fs));

        let linked = gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = gl.get_program_info_log(&program).unwrap_or_default();
            gl.delete_program(Some(&program));
            return Err(EffectError::ProgramLink(log));
        }

        Ok(Self {
            gl: gl.clone(),
            program,
        })
    }

    pub fn uniform(&self, name: &'static str) -> Result<WebGlUniformLocation, EffectError> {
        self.gl
            .get_uniform_location(&self.program, name)
            .ok_or(EffectError::MissingUniform(name))
    }

    pub fn bind(&self) {
        self.gl.use_program(Some(&self.program));
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        self.gl.delete_program(Some(&self.program));
    }
}

fn compile_shader(gl: &GL, kind: u32, stage: &'static str, source: &str) -> Result<WebGlShader, EffectError> {
    let shader = gl.create_shader(kind).ok_or(EffectError::Allocation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(EffectError::ShaderCompile { stage, log })
    }
}

/// Full-viewport triangle with `position` at location 0 and `uv` at 1.
pub(super) struct Triangle {
    gl: GL,
    vao: WebGlVertexArrayObject,
    buffers: Vec<WebGlBuffer>,
}

impl Triangle {
    pub fn new(gl: &GL) -> Result<Self, EffectError> {
        let vao = gl
            .create_vertex_array()
            .ok_or(EffectError::Allocation("vertex array"))?;
        let mut triangle = Self {
            gl: gl.clone(),
            vao,
            buffers: Vec::with_capacity(2),
        };

        gl.bind_vertex_array(Some(&triangle.vao));
        for (location, data) in [(0, &POSITIONS), (1, &UVS)] {
            let buffer = match gl.create_buffer() {
                Some(buffer) => buffer,
                None => {
                    gl.bind_vertex_array(None);
                    return Err(EffectError::Allocation("vertex buffer"));
                }
            };
            gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
            let array = Float32Array::from(&data[..]);
            gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::STATIC_DRAW);
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, 2, GL::FLOAT, false, 0, 0);
            triangle.buffers.push(buffer);
        }
        gl.bind_vertex_array(None);
        gl.bind_buffer(GL::ARRAY_BUFFER, None);

        Ok(triangle)
    }

    pub fn draw(&self) {
        self.gl.bind_vertex_array(Some(&self.vao));
        self.gl.draw_arrays(GL::TRIANGLES, 0, 3);
        self.gl.bind_vertex_array(None);
    }
}

impl Drop for Triangle {
    fn drop(&mut self) {
        for buffer in &self.buffers {
            self.gl.delete_buffer(Some(buffer));
        }
        self.gl.delete_vertex_array(Some(&self.vao));
    }
}

/// Linear-filtered, edge-clamped 2D texture.
pub(super) struct Texture {
    gl: GL,
    texture: WebGlTexture,
}

impl Texture {
    pub fn new(gl: &GL) -> Result<Self, EffectError> {
        let texture = gl.create_texture().ok_or(EffectError::Allocation("texture"))?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
        Ok(Self {
            gl: gl.clone(),
            texture,
        })
    }

    /// Upload a decoded image, flipped so `uv (0,0)` is its bottom-left.
    pub fn upload_image(&self, image: &HtmlImageElement) -> Result<(), EffectError> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        let uploaded = gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            image,
        );
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        uploaded.map_err(EffectError::from)
    }

    /// Allocate immutable storage of `size × size` texels.
    pub fn allocate(&self, size: i32, internal_format: u32) {
        self.gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        self.gl
            .tex_storage_2d(GL::TEXTURE_2D, 1, internal_format, size, size);
    }

    pub fn bind(&self, unit: u32) {
        self.gl.active_texture(GL::TEXTURE0 + unit);
        self.gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
    }

    pub fn raw(&self) -> &WebGlTexture {
        &self.texture
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gl.delete_texture(Some(&self.texture));
    }
}

/// Offscreen colour target backed by a [`Texture`].
pub(super) struct RenderTarget {
    gl: GL,
    framebuffer: WebGlFramebuffer,
    texture: Texture,
}

impl RenderTarget {
    pub fn new(gl: &GL, size: i32, internal_format: u32) -> Result<Self, EffectError> {
        let texture = Texture::new(gl)?;
        texture.allocate(size, internal_format);

        let framebuffer = gl
            .create_framebuffer()
            .ok_or(EffectError::Allocation("framebuffer"))?;
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&framebuffer));
        gl.framebuffer_texture_2d(
            GL::FRAMEBUFFER,
            GL::COLOR_ATTACHMENT0,
            GL::TEXTURE_2D,
            Some(texture.raw()),
            0,
        );
        let complete = gl.check_framebuffer_status(GL::FRAMEBUFFER) == GL::FRAMEBUFFER_COMPLETE;
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);

        if !complete {
            gl.delete_framebuffer(Some(&framebuffer));
            return Err(EffectError::Allocation("complete framebuffer"));
        }
        Ok(Self {
            gl: gl.clone(),
            framebuffer,
            texture,
        })
    }

    pub fn bind(&self) {
        self.gl
            .bind_framebuffer(GL::FRAMEBUFFER, Some(&self.framebuffer));
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.gl.delete_framebuffer(Some(&self.framebuffer));
    }
}
