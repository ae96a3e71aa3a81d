//! The render session: one live effect bound to one drawable surface.
//!
//! A session owns every GPU object its effect needs. Configuration changes patch
//! uniforms in place; nothing is recompiled until the session is replaced.
//! Dropping a session releases its programs and buffers.

use crate::effect::{EffectConfig, EffectKind, ParamChange, SilkParam};
use crate::error::EngineError;
use crate::gpu::GpuBackend;
use crate::pingpong::PingPong;
use crate::pointer::PointerState;
use crate::shaders::{Dialect, ProgramId};
use crate::uniforms::{
    self, god_rays_binding, silk_binding, SilkPass, UniformSet, UniformValue, DISPLAY_INPUT_UNIT,
    FLUID_INPUT_UNIT, I_FRAME, I_MOUSE, I_RESOLUTION, I_TIME,
};

/// Pseudo-time step per God Rays frame.
pub const GOD_RAYS_TIME_STEP: f32 = 0.01;

#[derive(Debug)]
struct ProgramSlot<P> {
    program: P,
    uniforms: UniformSet,
}

impl<P: Copy> ProgramSlot<P> {
    fn flush<B: GpuBackend<Program = P>>(&mut self, gpu: &mut B) -> usize {
        self.uniforms.flush(gpu, self.program)
    }
}

#[derive(Debug)]
enum Pipeline<P, T> {
    Silk {
        fluid: ProgramSlot<P>,
        display: ProgramSlot<P>,
        buffers: PingPong<T>,
        frame: u32,
    },
    GodRays {
        rays: ProgramSlot<P>,
        frame: u64,
    },
}

pub struct RenderSession<B: GpuBackend> {
    gpu: B,
    pipeline: Option<Pipeline<B::Program, B::Target>>,
    config: EffectConfig,
    pointer: PointerState,
    width: i32,
    height: i32,
}

impl<B: GpuBackend> RenderSession<B> {
    /// Compile the effect's programs, allocate its buffers and bind every uniform.
    ///
    /// On failure, anything already created is released before returning.
    pub fn create(mut gpu: B, config: EffectConfig, width: i32, height: i32) -> Result<Self, EngineError> {
        config.validate()?;
        let (width, height) = (width.max(1), height.max(1));

        let pipeline = build_pipeline(&mut gpu, &config, width, height)?;

        let mut session = Self {
            gpu,
            pipeline: Some(pipeline),
            config,
            pointer: PointerState::new(),
            width,
            height,
        };
        let uploaded = session.flush_all();
        logi!(
            "SESSION",
            "created {} session {}x{} ({} uniforms bound)",
            session.kind().name(),
            width,
            height,
            uploaded
        );
        Ok(session)
    }

    /// Tear down whatever session occupies `slot`, then create a new one in its place.
    ///
    /// If creation fails the slot is left empty.
    pub fn replace(
        slot: &mut Option<Self>,
        gpu: B,
        config: EffectConfig,
        width: i32,
        height: i32,
    ) -> Result<(), EngineError> {
        if let Some(mut old) = slot.take() {
            old.teardown();
        }
        *slot = Some(Self::create(gpu, config, width, height)?);
        Ok(())
    }

    pub fn kind(&self) -> EffectKind {
        self.config.kind()
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn gpu(&self) -> &B {
        &self.gpu
    }

    pub fn is_live(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Frames rendered since creation or the last resize (Silk) / since creation (God Rays).
    pub fn frame_count(&self) -> u64 {
        match &self.pipeline {
            Some(Pipeline::Silk { frame, .. }) => u64::from(*frame),
            Some(Pipeline::GodRays { frame, .. }) => *frame,
            None => 0,
        }
    }

    /// How many times the fluid buffers have swapped roles.
    pub fn buffer_swaps(&self) -> u64 {
        match &self.pipeline {
            Some(Pipeline::Silk { buffers, .. }) => buffers.swaps(),
            _ => 0,
        }
    }

    /// The two fluid buffers as (current, previous).
    pub fn fluid_buffers(&self) -> Option<(B::Target, B::Target)> {
        match &self.pipeline {
            Some(Pipeline::Silk { buffers, .. }) => Some((buffers.curr, buffers.prev)),
            _ => None,
        }
    }

    /// Apply one configuration change and push only its uniform to the GPU.
    ///
    /// Returns whether the configuration actually changed.
    pub fn apply(&mut self, change: &ParamChange) -> Result<bool, EngineError> {
        if !self.config.apply(change)? {
            return Ok(false);
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(true);
        };
        match (pipeline, change) {
            (Pipeline::Silk { fluid, display, .. }, ParamChange::Silk(p)) => {
                if let SilkParam::MouseDistortion(enabled) = p {
                    if !enabled {
                        self.pointer.deactivate();
                        fluid.uniforms.set(I_MOUSE, UniformValue::Vec4([0.0; 4]));
                        fluid.flush(&mut self.gpu);
                    }
                }
                if let Some((pass, name, value)) = silk_binding(p) {
                    let slot = match pass {
                        SilkPass::Fluid => fluid,
                        SilkPass::Display => display,
                    };
                    slot.uniforms.set(name, value);
                    slot.flush(&mut self.gpu);
                }
            }
            (Pipeline::GodRays { rays, .. }, ParamChange::GodRays(p)) => {
                let (name, value) = god_rays_binding(p);
                rays.uniforms.set(name, value);
                rays.flush(&mut self.gpu);
            }
            // config.apply already rejected mismatched changes
            _ => {}
        }
        Ok(true)
    }

    /// Apply a batch of changes, stopping at the first invalid one.
    pub fn apply_all(&mut self, changes: &[ParamChange]) -> Result<usize, EngineError> {
        let mut n = 0;
        for c in changes {
            if self.apply(c)? {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Render one frame. `now` is wall-clock seconds since the session started.
    ///
    /// Returns `false` once the session has been torn down.
    pub fn render_frame(&mut self, now: f64) -> bool {
        let (w, h) = (self.width, self.height);
        let mouse_on = matches!(&self.config, EffectConfig::Silk(c) if c.mouse_distortion_enabled);
        let Some(pipeline) = self.pipeline.as_mut() else {
            return false;
        };
        match pipeline {
            Pipeline::Silk {
                fluid,
                display,
                buffers,
                frame,
            } => {
                let t = UniformValue::Float(now as f32);
                fluid.uniforms.set(I_TIME, t);
                display.uniforms.set(I_TIME, t);
                fluid.uniforms.set(I_FRAME, UniformValue::Int(*frame as i32));
                if !mouse_on || self.pointer.is_stale(now) {
                    fluid.uniforms.set(I_MOUSE, UniformValue::Vec4([0.0; 4]));
                }

                fluid.flush(&mut self.gpu);
                self.gpu.draw_fullscreen(
                    fluid.program,
                    &[(FLUID_INPUT_UNIT, buffers.prev)],
                    Some(buffers.curr),
                    w,
                    h,
                );
                display.flush(&mut self.gpu);
                self.gpu
                    .draw_fullscreen(display.program, &[(DISPLAY_INPUT_UNIT, buffers.curr)], None, w, h);

                buffers.swap();
                *frame = frame.saturating_add(1);
            }
            Pipeline::GodRays { rays, frame } => {
                *frame += 1;
                rays.uniforms
                    .set(I_TIME, UniformValue::Float(*frame as f32 * GOD_RAYS_TIME_STEP));
                rays.flush(&mut self.gpu);
                self.gpu.draw_fullscreen(rays.program, &[], None, w, h);
            }
        }
        true
    }

    /// Resize the viewport. For Silk this also resizes both fluid buffers and
    /// restarts the simulation from its seed pattern.
    ///
    /// A resize that arrives after teardown is ignored.
    pub fn resize(&mut self, width: i32, height: i32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        let Some(pipeline) = self.pipeline.as_mut() else {
            logw!("SESSION", "resize to {}x{} after teardown ignored", width, height);
            return false;
        };
        self.width = width;
        self.height = height;
        let res = UniformValue::resolution(width, height);
        match pipeline {
            Pipeline::Silk {
                fluid,
                display,
                buffers,
                frame,
            } => {
                for t in buffers.both() {
                    self.gpu.resize_target(t, width, height);
                }
                fluid.uniforms.set(I_RESOLUTION, res);
                display.uniforms.set(I_RESOLUTION, res);
                fluid.flush(&mut self.gpu);
                display.flush(&mut self.gpu);
                *frame = 0;
            }
            Pipeline::GodRays { rays, .. } => {
                rays.uniforms.set(I_RESOLUTION, res);
                rays.flush(&mut self.gpu);
            }
        }
        true
    }

    /// Record a pointer move. `y_from_top` is in window convention and gets
    /// flipped to the bottom-origin convention the shaders use.
    pub fn pointer_move(&mut self, x: f32, y_from_top: f32, now: f64) {
        let enabled = matches!(&self.config, EffectConfig::Silk(c) if c.mouse_distortion_enabled);
        if !enabled {
            return;
        }
        if let Some(Pipeline::Silk { fluid, .. }) = self.pipeline.as_mut() {
            let y = self.height as f32 - y_from_top;
            let m = self.pointer.record_move(x, y, now);
            fluid.uniforms.set(I_MOUSE, UniformValue::Vec4(m));
        }
    }

    /// The pointer left the surface: the next frame zeroes the interaction uniform.
    pub fn pointer_leave(&mut self) {
        self.pointer.deactivate();
    }

    /// Release every GPU object. Safe to call more than once.
    pub fn teardown(&mut self) {
        let Some(pipeline) = self.pipeline.take() else {
            return;
        };
        match pipeline {
            Pipeline::Silk {
                fluid,
                display,
                buffers,
                ..
            } => {
                self.gpu.delete_program(fluid.program);
                self.gpu.delete_program(display.program);
                for t in buffers.both() {
                    self.gpu.delete_target(t);
                }
            }
            Pipeline::GodRays { rays, .. } => {
                self.gpu.delete_program(rays.program);
            }
        }
        logi!("SESSION", "{} session torn down", self.kind().name());
    }

    fn flush_all(&mut self) -> usize {
        match self.pipeline.as_mut() {
            Some(Pipeline::Silk { fluid, display, .. }) => fluid.flush(&mut self.gpu) + display.flush(&mut self.gpu),
            Some(Pipeline::GodRays { rays, .. }) => rays.flush(&mut self.gpu),
            None => 0,
        }
    }
}

impl<B: GpuBackend> Drop for RenderSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Compile and allocate everything one effect needs, releasing partial work on failure.
fn build_pipeline<B: GpuBackend>(
    gpu: &mut B,
    config: &EffectConfig,
    width: i32,
    height: i32,
) -> Result<Pipeline<B::Program, B::Target>, EngineError> {
    let pipeline = match config {
        EffectConfig::Silk(c) => {
            let fluid = compile(gpu, ProgramId::SilkFluid)?;
            let display = match compile(gpu, ProgramId::SilkDisplay) {
                Ok(p) => p,
                Err(e) => {
                    gpu.delete_program(fluid);
                    return Err(e);
                }
            };
            let buffers = match alloc_pair(gpu, width, height) {
                Ok(pp) => pp,
                Err(e) => {
                    gpu.delete_program(fluid);
                    gpu.delete_program(display);
                    return Err(e);
                }
            };
            Pipeline::Silk {
                fluid: ProgramSlot {
                    program: fluid,
                    uniforms: uniforms::silk_fluid_uniforms(c, width, height),
                },
                display: ProgramSlot {
                    program: display,
                    uniforms: uniforms::silk_display_uniforms(c, width, height),
                },
                buffers,
                frame: 0,
            }
        }
        EffectConfig::GodRays(c) => Pipeline::GodRays {
            rays: ProgramSlot {
                program: compile(gpu, ProgramId::GodRays)?,
                uniforms: uniforms::god_rays_uniforms(c, width, height),
            },
            frame: 0,
        },
    };
    Ok(pipeline)
}

fn compile<B: GpuBackend>(gpu: &mut B, id: ProgramId) -> Result<B::Program, EngineError> {
    let src = id.source(Dialect::Native);
    gpu.compile_program(src.label, &src.vertex, &src.fragment)
}

fn alloc_pair<B: GpuBackend>(gpu: &mut B, width: i32, height: i32) -> Result<PingPong<B::Target>, EngineError> {
    let a = gpu.create_float_target(width, height)?;
    match gpu.create_float_target(width, height) {
        Ok(b) => Ok(PingPong::new(a, b)),
        Err(e) => {
            gpu.delete_target(a);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::effect::{GodRaysParam, SilkConfig};
    use crate::gpu::{GpuCall, RecordingBackend};

    fn silk() -> RenderSession<RecordingBackend> {
        RenderSession::create(RecordingBackend::new(), EffectConfig::defaults(EffectKind::Silk), 200, 100)
            .unwrap()
    }

    fn rays() -> RenderSession<RecordingBackend> {
        RenderSession::create(RecordingBackend::new(), EffectConfig::defaults(EffectKind::GodRays), 64, 64)
            .unwrap()
    }

    #[test]
    fn creation_binds_every_uniform_once() {
        let s = silk();
        // 10 fluid + 10 display
        assert_eq!(s.gpu().uniform_uploads(), 20);
        assert_eq!(s.gpu().live_programs(), 2);
        assert_eq!(s.gpu().live_targets(), 2);

        let r = rays();
        assert_eq!(r.gpu().uniform_uploads(), 10);
        assert_eq!(r.gpu().live_targets(), 0);
    }

    #[test]
    fn brush_size_lower_bound_keeps_falloff_finite() {
        let mut s = silk();
        s.gpu.clear_calls();
        let size = EffectKind::Silk
            .controls()
            .iter()
            .find(|c| c.field == "brushSize")
            .unwrap();
        let change = size.nudge(s.config(), -1000).unwrap().unwrap();
        assert_eq!(change, ParamChange::Silk(SilkParam::BrushSize(10.0)));
        assert!(s.apply(&change).unwrap());
        let uploaded = s.gpu().uploads_of("uBrushSize");
        assert_eq!(uploaded, vec![UniformValue::Float(10.0)]);
        let UniformValue::Float(v) = uploaded[0] else { unreachable!() };
        assert!((1e-4 / v).is_finite());
    }

    #[test]
    fn zero_brush_size_never_reaches_the_gpu() {
        let mut s = silk();
        s.gpu.clear_calls();
        let err = s.apply(&ParamChange::Silk(SilkParam::BrushSize(0.0))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParam { field: "brushSize", .. }));
        assert!(s.gpu().uploads_of("uBrushSize").is_empty());
        assert_eq!(s.config().get("brushSize"), Some(crate::effect::ParamValue::Number(25.0)));

        let zeroed = EffectConfig::Silk(SilkConfig {
            brush_size: 0.0,
            ..SilkConfig::default()
        });
        assert!(RenderSession::create(RecordingBackend::new(), zeroed, 200, 100).is_err());
    }

    #[test]
    fn same_value_twice_uploads_once() {
        let mut s = silk();
        s.gpu.clear_calls();
        let c = ParamChange::Silk(SilkParam::BrushSize(40.0));
        assert!(s.apply(&c).unwrap());
        assert!(!s.apply(&c).unwrap());
        assert_eq!(s.gpu().uniform_uploads(), 1);
        assert_eq!(s.gpu().uploads_of("uBrushSize"), vec![UniformValue::Float(40.0)]);
    }

    #[test]
    fn change_touches_only_its_uniform() {
        let mut s = rays();
        s.gpu.clear_calls();
        let c = HexColor::parse("#ff0000").unwrap();
        s.apply(&ParamChange::GodRays(GodRaysParam::RayColor(c))).unwrap();
        assert_eq!(
            s.gpu().calls,
            vec![GpuCall::Uniform {
                program: 1,
                name: "uRayColor",
                value: UniformValue::Vec3([1.0, 0.0, 0.0]),
            }]
        );
    }

    #[test]
    fn mismatched_change_is_rejected_without_gpu_traffic() {
        let mut s = silk();
        s.gpu.clear_calls();
        let err = s.apply(&ParamChange::GodRays(GodRaysParam::RayCount(3.0))).unwrap_err();
        assert!(matches!(err, EngineError::EffectMismatch { .. }));
        assert!(s.gpu().calls.is_empty());
    }

    #[test]
    fn ping_pong_swaps_once_per_frame_without_reallocating() {
        let mut s = silk();
        let (a, b) = s.fluid_buffers().unwrap();
        for n in 1..=7u64 {
            s.render_frame(n as f64 / 60.0);
            assert_eq!(s.buffer_swaps(), n);
            let (curr, prev) = s.fluid_buffers().unwrap();
            if n % 2 == 0 {
                assert_eq!((curr, prev), (a, b));
            } else {
                assert_eq!((curr, prev), (b, a));
            }
        }
        assert_eq!(s.gpu().allocations(), 2);
    }

    #[test]
    fn fluid_pass_reads_previous_and_display_reads_current() {
        let mut s = silk();
        let (curr, prev) = s.fluid_buffers().unwrap();
        s.gpu.clear_calls();
        s.render_frame(0.5);
        let draws = s.gpu().draws();
        assert_eq!(draws.len(), 2);
        match (draws[0], draws[1]) {
            (
                GpuCall::Draw { inputs: i0, output: o0, .. },
                GpuCall::Draw { inputs: i1, output: o1, .. },
            ) => {
                assert_eq!(i0, &vec![(FLUID_INPUT_UNIT, prev)]);
                assert_eq!(*o0, Some(curr));
                assert_eq!(i1, &vec![(DISPLAY_INPUT_UNIT, curr)]);
                assert_eq!(*o1, None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn stale_pointer_zeroes_mouse_on_next_frame() {
        let mut s = silk();
        s.pointer_move(50.0, 30.0, 1.0);
        s.render_frame(1.05);
        assert_eq!(s.gpu().uploads_of(I_MOUSE).last(), Some(&UniformValue::Vec4([50.0, 70.0, 0.0, 0.0])));
        s.render_frame(1.2);
        assert_eq!(s.gpu().uploads_of(I_MOUSE).last(), Some(&UniformValue::Vec4([0.0; 4])));
    }

    #[test]
    fn pointer_is_ignored_when_distortion_disabled() {
        let mut s = silk();
        s.apply(&ParamChange::Silk(SilkParam::MouseDistortion(false))).unwrap();
        s.gpu.clear_calls();
        s.pointer_move(10.0, 10.0, 0.0);
        s.render_frame(0.01);
        assert!(s.gpu().uploads_of(I_MOUSE).is_empty());
    }

    #[test]
    fn resize_resets_frame_counter_and_resizes_buffers() {
        let mut s = silk();
        for i in 0..5 {
            s.render_frame(i as f64);
        }
        assert_eq!(s.frame_count(), 5);
        assert!(s.resize(320, 240));
        assert_eq!(s.frame_count(), 0);
        let (a, b) = s.fluid_buffers().unwrap();
        assert_eq!(s.gpu().target_size(a), Some((320, 240)));
        assert_eq!(s.gpu().target_size(b), Some((320, 240)));

        s.gpu.clear_calls();
        s.render_frame(6.0);
        assert_eq!(s.gpu().uploads_of(I_FRAME), vec![UniformValue::Int(0)]);
    }

    #[test]
    fn god_rays_time_follows_frame_count() {
        let mut s = rays();
        s.render_frame(100.0);
        s.render_frame(200.0);
        assert_eq!(
            s.gpu().uploads_of(I_TIME)[1..],
            [UniformValue::Float(0.01), UniformValue::Float(0.02)]
        );
    }

    #[test]
    fn teardown_releases_everything_and_guards_late_calls() {
        let mut s = silk();
        s.teardown();
        s.teardown();
        assert_eq!(s.gpu().live_programs(), 0);
        assert_eq!(s.gpu().live_targets(), 0);
        assert!(!s.resize(10, 10));
        assert!(!s.render_frame(1.0));
        assert!(!s.is_live());
    }

    #[test]
    fn failed_creation_leaks_nothing() {
        let cfg = EffectConfig::Silk(SilkConfig::default());

        let mut gpu = RecordingBackend::new();
        gpu.fail_target_at = Some(1);
        let err = build_pipeline(&mut gpu, &cfg, 8, 8).err().unwrap();
        assert!(matches!(err, EngineError::GlCreate(_)));
        assert_eq!(gpu.live_programs(), 0);
        assert_eq!(gpu.live_targets(), 0);

        let mut gpu = RecordingBackend::new();
        gpu.fail_compile = Some(ProgramId::SilkDisplay.label());
        let err = build_pipeline(&mut gpu, &cfg, 8, 8).err().unwrap();
        assert!(matches!(err, EngineError::FragmentCompile { .. }));
        assert_eq!(gpu.live_programs(), 0);
    }

    #[test]
    fn zero_sized_viewport_is_clamped() {
        let mut s = rays();
        s.resize(0, 0);
        assert_eq!(s.size(), (1, 1));
    }
}
