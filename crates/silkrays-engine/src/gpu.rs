//! The seam between the render session and the graphics API.
//!
//! [`RenderSession`](crate::session::RenderSession) never talks to OpenGL directly.
//! The production implementation is [`GlowBackend`](crate::gl::GlowBackend);
//! [`RecordingBackend`] keeps the session testable without a GPU.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::EngineError;
use crate::uniforms::UniformValue;

pub trait GpuBackend {
    type Program: Copy + Eq + Debug;
    type Target: Copy + Eq + Debug;

    fn compile_program(
        &mut self,
        label: &'static str,
        vertex: &str,
        fragment: &str,
    ) -> Result<Self::Program, EngineError>;

    fn delete_program(&mut self, program: Self::Program);

    /// Allocate an RGBA float color buffer usable both as a render target and as a texture.
    fn create_float_target(&mut self, width: i32, height: i32) -> Result<Self::Target, EngineError>;

    /// Reallocate storage for `target` at a new size. Contents are undefined afterwards.
    fn resize_target(&mut self, target: Self::Target, width: i32, height: i32);

    fn delete_target(&mut self, target: Self::Target);

    fn set_uniform(&mut self, program: Self::Program, name: &'static str, value: UniformValue);

    /// Draw one full-viewport primitive with `program`.
    ///
    /// `inputs` binds targets as textures on the given units. `output` of `None`
    /// means the visible surface.
    fn draw_fullscreen(
        &mut self,
        program: Self::Program,
        inputs: &[(u32, Self::Target)],
        output: Option<Self::Target>,
        width: i32,
        height: i32,
    );
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    Compile { label: &'static str, program: u32 },
    DeleteProgram(u32),
    CreateTarget { target: u32, width: i32, height: i32 },
    ResizeTarget { target: u32, width: i32, height: i32 },
    DeleteTarget(u32),
    Uniform { program: u32, name: &'static str, value: UniformValue },
    Draw { program: u32, inputs: Vec<(u32, u32)>, output: Option<u32>, width: i32, height: i32 },
}

/// Headless backend that records every call and tracks live objects.
///
/// Handles are plain integers, never reused. Failures can be injected to
/// exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub calls: Vec<GpuCall>,
    next_handle: u32,
    live_programs: BTreeMap<u32, &'static str>,
    live_targets: BTreeMap<u32, (i32, i32)>,
    /// Fail the compile of the program with this label.
    pub fail_compile: Option<&'static str>,
    /// Fail the n-th (0-based) target allocation.
    pub fail_target_at: Option<usize>,
    targets_created: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    pub fn live_targets(&self) -> usize {
        self.live_targets.len()
    }

    pub fn target_size(&self, target: u32) -> Option<(i32, i32)> {
        self.live_targets.get(&target).copied()
    }

    pub fn uniform_uploads(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, GpuCall::Uniform { .. })).count()
    }

    /// Every upload of `name`, in call order.
    pub fn uploads_of(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Uniform { name: n, value, .. } if *n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<&GpuCall> {
        self.calls.iter().filter(|c| matches!(c, GpuCall::Draw { .. })).collect()
    }

    pub fn allocations(&self) -> usize {
        self.targets_created
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GpuBackend for RecordingBackend {
    type Program = u32;
    type Target = u32;

    fn compile_program(
        &mut self,
        label: &'static str,
        _vertex: &str,
        _fragment: &str,
    ) -> Result<u32, EngineError> {
        if self.fail_compile == Some(label) {
            return Err(EngineError::FragmentCompile {
                program: label,
                log: "injected failure".into(),
            });
        }
        let program = self.handle();
        self.live_programs.insert(program, label);
        self.calls.push(GpuCall::Compile { label, program });
        Ok(program)
    }

    fn delete_program(&mut self, program: u32) {
        self.live_programs.remove(&program);
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn create_float_target(&mut self, width: i32, height: i32) -> Result<u32, EngineError> {
        let n = self.targets_created;
        self.targets_created += 1;
        if self.fail_target_at == Some(n) {
            return Err(EngineError::GlCreate("injected target failure".into()));
        }
        let target = self.handle();
        self.live_targets.insert(target, (width, height));
        self.calls.push(GpuCall::CreateTarget { target, width, height });
        Ok(target)
    }

    fn resize_target(&mut self, target: u32, width: i32, height: i32) {
        if let Some(size) = self.live_targets.get_mut(&target) {
            *size = (width, height);
        }
        self.calls.push(GpuCall::ResizeTarget { target, width, height });
    }

    fn delete_target(&mut self, target: u32) {
        self.live_targets.remove(&target);
        self.calls.push(GpuCall::DeleteTarget(target));
    }

    fn set_uniform(&mut self, program: u32, name: &'static str, value: UniformValue) {
        self.calls.push(GpuCall::Uniform { program, name, value });
    }

    fn draw_fullscreen(
        &mut self,
        program: u32,
        inputs: &[(u32, u32)],
        output: Option<u32>,
        width: i32,
        height: i32,
    ) {
        self.calls.push(GpuCall::Draw {
            program,
            inputs: inputs.to_vec(),
            output,
            width,
            height,
        });
    }
}
