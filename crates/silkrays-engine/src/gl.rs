//! OpenGL implementation of [`GpuBackend`] on top of `glow`.
//!
//! Expects a current 3.3 core context. All calls must happen on the thread
//! that owns the context.

use std::collections::HashMap;
use std::rc::Rc;

use glow::HasContext;

use crate::error::EngineError;
use crate::gpu::GpuBackend;
use crate::uniforms::UniformValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTarget {
    fbo: glow::NativeFramebuffer,
    tex: glow::NativeTexture,
}

/// Empty VAO for the attribute-less fullscreen triangle, deleted with the last backend clone.
struct FullscreenVao {
    gl: Rc<glow::Context>,
    vao: glow::NativeVertexArray,
}

impl Drop for FullscreenVao {
    fn drop(&mut self) {
        // SAFETY: the VAO was created on this context and no clone can bind it any more
        unsafe { self.gl.delete_vertex_array(self.vao) };
        logi!("GL", "fullscreen VAO released");
    }
}

/// Cloning shares the context and the fullscreen VAO.
#[derive(Clone)]
pub struct GlowBackend {
    gl: Rc<glow::Context>,
    quad: Rc<FullscreenVao>,
    locations: HashMap<(glow::NativeProgram, &'static str), Option<glow::NativeUniformLocation>>,
}

impl GlowBackend {
    pub fn new(gl: Rc<glow::Context>) -> Result<Self, EngineError> {
        let v = gl.version();
        if v.is_embedded || (v.major, v.minor) < (3, 3) {
            return Err(EngineError::UnsupportedContext(format!(
                "need OpenGL 3.3 core, got {}.{}{} ({})",
                v.major,
                v.minor,
                if v.is_embedded { " ES" } else { "" },
                v.vendor_info
            )));
        }
        let vao = unsafe {
            gl.create_vertex_array()
                .map_err(|e| EngineError::GlCreate(format!("create_vertex_array failed: {e:?}")))?
        };
        logi!("GL", "context OpenGL {}.{} {}", v.major, v.minor, v.vendor_info);
        Ok(Self {
            quad: Rc::new(FullscreenVao { gl: Rc::clone(&gl), vao }),
            gl,
            locations: HashMap::new(),
        })
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn location(&mut self, program: glow::NativeProgram, name: &'static str) -> Option<glow::NativeUniformLocation> {
        let gl = &self.gl;
        self.locations
            .entry((program, name))
            // SAFETY: program is a live program object created by this backend
            .or_insert_with(|| unsafe { gl.get_uniform_location(program, name) })
            .clone()
    }

    unsafe fn alloc_storage(&self, tex: glow::NativeTexture, width: i32, height: i32) {
        let gl = &self.gl;
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA32F as i32,
            width.max(1),
            height.max(1),
            0,
            glow::RGBA,
            glow::FLOAT,
            glow::PixelUnpackData::Slice(None),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }
}

impl GpuBackend for GlowBackend {
    type Program = glow::NativeProgram;
    type Target = GlTarget;

    fn compile_program(
        &mut self,
        label: &'static str,
        vertex: &str,
        fragment: &str,
    ) -> Result<glow::NativeProgram, EngineError> {
        let gl = &self.gl;
        unsafe {
            let vs = gl
                .create_shader(glow::VERTEX_SHADER)
                .map_err(|e| EngineError::GlCreate(format!("create_shader(VS) failed: {e:?}")))?;
            gl.shader_source(vs, vertex);
            gl.compile_shader(vs);
            if !gl.get_shader_compile_status(vs) {
                let log = gl.get_shader_info_log(vs);
                gl.delete_shader(vs);
                return Err(EngineError::VertexCompile { program: label, log });
            }

            let fs = match gl.create_shader(glow::FRAGMENT_SHADER) {
                Ok(fs) => fs,
                Err(e) => {
                    gl.delete_shader(vs);
                    return Err(EngineError::GlCreate(format!("create_shader(FS) failed: {e:?}")));
                }
            };
            gl.shader_source(fs, fragment);
            gl.compile_shader(fs);
            if !gl.get_shader_compile_status(fs) {
                let log = gl.get_shader_info_log(fs);
                gl.delete_shader(vs);
                gl.delete_shader(fs);
                return Err(EngineError::FragmentCompile { program: label, log });
            }

            let program = match gl.create_program() {
                Ok(p) => p,
                Err(e) => {
                    gl.delete_shader(vs);
                    gl.delete_shader(fs);
                    return Err(EngineError::GlCreate(format!("create_program failed: {e:?}")));
                }
            };
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);

            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(EngineError::Link { program: label, log });
            }

            logi!("GL", "compiled {}", label);
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: glow::NativeProgram) {
        self.locations.retain(|(p, _), _| *p != program);
        unsafe { self.gl.delete_program(program) };
    }

    fn create_float_target(&mut self, width: i32, height: i32) -> Result<GlTarget, EngineError> {
        let gl = Rc::clone(&self.gl);
        unsafe {
            let tex = gl
                .create_texture()
                .map_err(|e| EngineError::GlCreate(format!("create_texture failed: {e:?}")))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(tex));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);
            self.alloc_storage(tex, width, height);

            let fbo = match gl.create_framebuffer() {
                Ok(f) => f,
                Err(e) => {
                    gl.delete_texture(tex);
                    return Err(EngineError::GlCreate(format!("create_framebuffer failed: {e:?}")));
                }
            };
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, Some(tex), 0);
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_texture(tex);
                return Err(EngineError::UnsupportedContext(format!(
                    "float render target incomplete: 0x{status:x}"
                )));
            }

            // start from zero so the first read is defined
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            Ok(GlTarget { fbo, tex })
        }
    }

    fn resize_target(&mut self, target: GlTarget, width: i32, height: i32) {
        unsafe { self.alloc_storage(target.tex, width, height) };
    }

    fn delete_target(&mut self, target: GlTarget) {
        unsafe {
            self.gl.delete_framebuffer(target.fbo);
            self.gl.delete_texture(target.tex);
        }
    }

    fn set_uniform(&mut self, program: glow::NativeProgram, name: &'static str, value: UniformValue) {
        // Uniforms the driver optimized away have no location.
        let Some(loc) = self.location(program, name) else {
            return;
        };
        let gl = &self.gl;
        unsafe {
            gl.use_program(Some(program));
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(Some(&loc), v),
                UniformValue::Int(v) => gl.uniform_1_i32(Some(&loc), v),
                UniformValue::Vec2([x, y]) => gl.uniform_2_f32(Some(&loc), x, y),
                UniformValue::Vec3([x, y, z]) => gl.uniform_3_f32(Some(&loc), x, y, z),
                UniformValue::Vec4([x, y, z, w]) => gl.uniform_4_f32(Some(&loc), x, y, z, w),
            }
        }
    }

    fn draw_fullscreen(
        &mut self,
        program: glow::NativeProgram,
        inputs: &[(u32, GlTarget)],
        output: Option<GlTarget>,
        width: i32,
        height: i32,
    ) {
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, output.map(|t| t.fbo));
            gl.viewport(0, 0, width, height);
            gl.use_program(Some(program));
            for (unit, t) in inputs {
                gl.active_texture(glow::TEXTURE0 + unit);
                gl.bind_texture(glow::TEXTURE_2D, Some(t.tex));
            }
            gl.bind_vertex_array(Some(self.quad.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
            for (unit, _) in inputs {
                gl.active_texture(glow::TEXTURE0 + unit);
                gl.bind_texture(glow::TEXTURE_2D, None);
            }
            gl.active_texture(glow::TEXTURE0);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }
}
