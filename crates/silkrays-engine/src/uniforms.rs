//! Configuration -> uniform binding.
//!
//! Each program keeps a CPU-side mirror of its uniforms ([`UniformSet`]). Writes
//! only mark a uniform dirty when its value actually changes, and a flush uploads
//! exactly the dirty entries. That gives the two binding times:
//! - construction: every uniform starts dirty and the first flush uploads them all
//! - reactive: one [`ParamChange`](crate::effect::ParamChange) touches one mirror
//!   entry, so the next flush uploads that uniform and nothing else

use std::collections::{BTreeMap, BTreeSet};

use crate::effect::{GodRaysConfig, GodRaysParam, SilkConfig, SilkParam};
use crate::gpu::GpuBackend;

/// Velocity decay per fluid step.
pub const FLUID_DECAY: f32 = 0.98;
/// Trail channel decay per fluid step.
pub const TRAIL_LENGTH: f32 = 0.8;
/// Damping applied near a slow-moving cursor.
pub const STOP_DECAY: f32 = 0.85;

/// Texture unit the fluid pass reads the previous frame from.
pub const FLUID_INPUT_UNIT: u32 = 0;
/// Texture unit the display pass reads the fluid buffer from.
pub const DISPLAY_INPUT_UNIT: u32 = 0;

pub const I_TIME: &str = "iTime";
pub const I_RESOLUTION: &str = "iResolution";
pub const I_MOUSE: &str = "iMouse";
pub const I_FRAME: &str = "iFrame";
pub const I_PREVIOUS_FRAME: &str = "iPreviousFrame";
pub const I_FLUID: &str = "iFluid";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    pub fn resolution(width: i32, height: i32) -> Self {
        UniformValue::Vec2([width as f32, height as f32])
    }
}

/// Mirror of one program's uniform state with change tracking.
#[derive(Debug, Clone, Default)]
pub struct UniformSet {
    values: BTreeMap<&'static str, UniformValue>,
    dirty: BTreeSet<&'static str>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. Returns `true` only if it differs from the mirrored one.
    pub fn set(&mut self, name: &'static str, value: UniformValue) -> bool {
        if self.values.get(name) == Some(&value) {
            return false;
        }
        self.values.insert(name, value);
        self.dirty.insert(name);
        true
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.dirty.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Upload every dirty uniform to `program`. Returns how many were uploaded.
    pub fn flush<B: GpuBackend>(&mut self, gpu: &mut B, program: B::Program) -> usize {
        let mut n = 0;
        for name in std::mem::take(&mut self.dirty) {
            if let Some(v) = self.values.get(name) {
                gpu.set_uniform(program, name, *v);
                n += 1;
            }
        }
        n
    }
}

/// Which Silk program a uniform lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilkPass {
    Fluid,
    Display,
}

pub fn silk_fluid_uniforms(cfg: &SilkConfig, width: i32, height: i32) -> UniformSet {
    let mut u = UniformSet::new();
    u.set(I_TIME, UniformValue::Float(0.0));
    u.set(I_RESOLUTION, UniformValue::resolution(width, height));
    u.set(I_MOUSE, UniformValue::Vec4([0.0; 4]));
    u.set(I_FRAME, UniformValue::Int(0));
    u.set(I_PREVIOUS_FRAME, UniformValue::Int(FLUID_INPUT_UNIT as i32));
    u.set("uBrushSize", UniformValue::Float(cfg.brush_size));
    u.set("uBrushStrength", UniformValue::Float(cfg.brush_strength));
    u.set("uFluidDecay", UniformValue::Float(FLUID_DECAY));
    u.set("uTrailLength", UniformValue::Float(TRAIL_LENGTH));
    u.set("uStopDecay", UniformValue::Float(STOP_DECAY));
    u
}

pub fn silk_display_uniforms(cfg: &SilkConfig, width: i32, height: i32) -> UniformSet {
    let mut u = UniformSet::new();
    u.set(I_TIME, UniformValue::Float(0.0));
    u.set(I_RESOLUTION, UniformValue::resolution(width, height));
    u.set(I_FLUID, UniformValue::Int(DISPLAY_INPUT_UNIT as i32));
    u.set("uDistortionAmount", UniformValue::Float(cfg.distortion_amount));
    u.set("uColor1", UniformValue::Vec3(cfg.color1.rgb().to_array()));
    u.set("uColor2", UniformValue::Vec3(cfg.color2.rgb().to_array()));
    u.set("uColor3", UniformValue::Vec3(cfg.color3.rgb().to_array()));
    u.set("uColor4", UniformValue::Vec3(cfg.color4.rgb().to_array()));
    u.set("uColorIntensity", UniformValue::Float(cfg.color_intensity_or_default()));
    u.set("uSoftness", UniformValue::Float(cfg.softness_or_default()));
    u
}

pub fn god_rays_uniforms(cfg: &GodRaysConfig, width: i32, height: i32) -> UniformSet {
    let mut u = UniformSet::new();
    u.set(I_TIME, UniformValue::Float(0.0));
    u.set(I_RESOLUTION, UniformValue::resolution(width, height));
    u.set("uRayIntensity", UniformValue::Float(cfg.ray_intensity));
    u.set("uAnimationSpeed", UniformValue::Float(cfg.animation_speed));
    u.set("uRayCount", UniformValue::Float(cfg.ray_count));
    u.set("uLightRadius", UniformValue::Float(cfg.light_radius));
    u.set("uBackgroundColor1", UniformValue::Vec3(cfg.background_color1.rgb().to_array()));
    u.set("uBackgroundColor2", UniformValue::Vec3(cfg.background_color2.rgb().to_array()));
    u.set("uRayColor", UniformValue::Vec3(cfg.ray_color.rgb().to_array()));
    u.set("uCloudDensity", UniformValue::Float(cfg.cloud_density));
    u
}

/// Uniform touched by a Silk change.
///
/// `MouseDistortion` has no uniform of its own: it gates writes to `iMouse`,
/// which the session handles.
pub fn silk_binding(p: &SilkParam) -> Option<(SilkPass, &'static str, UniformValue)> {
    use SilkPass::{Display, Fluid};
    let b = match p {
        SilkParam::BrushSize(v) => (Fluid, "uBrushSize", UniformValue::Float(*v)),
        SilkParam::BrushStrength(v) => (Fluid, "uBrushStrength", UniformValue::Float(*v)),
        SilkParam::DistortionAmount(v) => (Display, "uDistortionAmount", UniformValue::Float(*v)),
        SilkParam::Color1(c) => (Display, "uColor1", UniformValue::Vec3(c.rgb().to_array())),
        SilkParam::Color2(c) => (Display, "uColor2", UniformValue::Vec3(c.rgb().to_array())),
        SilkParam::Color3(c) => (Display, "uColor3", UniformValue::Vec3(c.rgb().to_array())),
        SilkParam::Color4(c) => (Display, "uColor4", UniformValue::Vec3(c.rgb().to_array())),
        SilkParam::ColorIntensity(v) => (Display, "uColorIntensity", UniformValue::Float(v.unwrap_or(1.0))),
        SilkParam::Softness(v) => (Display, "uSoftness", UniformValue::Float(v.unwrap_or(1.0))),
        SilkParam::MouseDistortion(_) => return None,
    };
    Some(b)
}

pub fn god_rays_binding(p: &GodRaysParam) -> (&'static str, UniformValue) {
    match p {
        GodRaysParam::RayIntensity(v) => ("uRayIntensity", UniformValue::Float(*v)),
        GodRaysParam::AnimationSpeed(v) => ("uAnimationSpeed", UniformValue::Float(*v)),
        GodRaysParam::RayCount(v) => ("uRayCount", UniformValue::Float(*v)),
        GodRaysParam::LightRadius(v) => ("uLightRadius", UniformValue::Float(*v)),
        GodRaysParam::CloudDensity(v) => ("uCloudDensity", UniformValue::Float(*v)),
        GodRaysParam::BackgroundColor1(c) => ("uBackgroundColor1", UniformValue::Vec3(c.rgb().to_array())),
        GodRaysParam::BackgroundColor2(c) => ("uBackgroundColor2", UniformValue::Vec3(c.rgb().to_array())),
        GodRaysParam::RayColor(c) => ("uRayColor", UniformValue::Vec3(c.rgb().to_array())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::shaders::{DISPLAY_FRAGMENT, FLUID_FRAGMENT, GOD_RAYS_FRAGMENT};

    fn declared(body: &str, name: &str) -> bool {
        body.lines()
            .any(|l| l.starts_with("uniform ") && l.trim_end_matches(';').ends_with(&format!(" {name}")))
    }

    #[test]
    fn every_bound_uniform_is_declared_by_its_program() {
        let silk = SilkConfig::default();
        let rays = GodRaysConfig::default();
        let sets = [
            (silk_fluid_uniforms(&silk, 8, 8), FLUID_FRAGMENT),
            (silk_display_uniforms(&silk, 8, 8), DISPLAY_FRAGMENT),
            (god_rays_uniforms(&rays, 8, 8), GOD_RAYS_FRAGMENT),
        ];
        for (set, body) in &sets {
            for name in set.dirty_names() {
                assert!(declared(body, name), "{name} not declared");
            }
        }
    }

    #[test]
    fn set_is_idempotent() {
        let mut u = UniformSet::new();
        assert!(u.set("uX", UniformValue::Float(1.0)));
        assert!(!u.set("uX", UniformValue::Float(1.0)));
        assert!(u.set("uX", UniformValue::Float(2.0)));
        assert_eq!(u.dirty_names().count(), 1);
    }

    #[test]
    fn absent_optional_fields_bind_as_one() {
        let u = silk_display_uniforms(&SilkConfig::default(), 4, 4);
        assert_eq!(u.get("uColorIntensity"), Some(UniformValue::Float(1.0)));
        assert_eq!(u.get("uSoftness"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn color_changes_bind_decoded_triples() {
        let c = HexColor::parse("#ff8000").unwrap();
        let (pass, name, value) = silk_binding(&SilkParam::Color3(c)).unwrap();
        assert_eq!(pass, SilkPass::Display);
        assert_eq!(name, "uColor3");
        assert_eq!(value, UniformValue::Vec3([1.0, 128.0 / 255.0, 0.0]));
        assert!(silk_binding(&SilkParam::MouseDistortion(false)).is_none());
    }
}
