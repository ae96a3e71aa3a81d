//! The control panel each effect publishes, and the effect carousel.

use crate::codegen;
use crate::effect::{EffectConfig, EffectKind, ParamChange, ParamValue};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlGroup {
    Settings,
    Colors,
    Effects,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Number { min: f32, max: f32, step: f32 },
    Color,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Configuration field this control writes.
    pub field: &'static str,
    pub label: &'static str,
    pub group: ControlGroup,
    pub kind: ControlKind,
}

const fn number(field: &'static str, label: &'static str, group: ControlGroup, min: f32, max: f32, step: f32) -> ControlSpec {
    ControlSpec {
        field,
        label,
        group,
        kind: ControlKind::Number { min, max, step },
    }
}

const fn color(field: &'static str, label: &'static str) -> ControlSpec {
    ControlSpec {
        field,
        label,
        group: ControlGroup::Colors,
        kind: ControlKind::Color,
    }
}

const SILK_CONTROLS: &[ControlSpec] = &[
    number("brushSize", "Size", ControlGroup::Settings, 10.0, 100.0, 1.0),
    number("brushStrength", "Strength", ControlGroup::Settings, 10.0, 100.0, 1.0),
    color("color1", "Color1"),
    color("color2", "Color2"),
    color("color3", "Color3"),
    color("color4", "Color4"),
    number("distortionAmount", "Distortion", ControlGroup::Effects, 0.5, 5.0, 0.1),
    ControlSpec {
        field: "mouseDistortionEnabled",
        label: "Mouse Distortion",
        group: ControlGroup::Pointer,
        kind: ControlKind::Toggle,
    },
];

const GOD_RAYS_CONTROLS: &[ControlSpec] = &[
    number("rayIntensity", "Intensity", ControlGroup::Settings, 0.0, 5.0, 0.1),
    number("rayCount", "Ray Count", ControlGroup::Settings, 1.0, 48.0, 1.0),
    number("lightRadius", "Light Radius", ControlGroup::Settings, 0.0, 3.0, 0.1),
    number("cloudDensity", "Cloud Density", ControlGroup::Settings, 0.0, 1.0, 0.05),
    color("backgroundColor1", "Background 1"),
    color("backgroundColor2", "Background 2"),
    color("rayColor", "Ray Color"),
    number("animationSpeed", "Animation Speed", ControlGroup::Effects, 0.5, 5.0, 0.1),
];

impl EffectKind {
    /// Heading of the settings group ("Brush Settings", "Rays Settings").
    pub fn settings_label(self) -> &'static str {
        match self {
            EffectKind::Silk => "Brush",
            EffectKind::GodRays => "Rays",
        }
    }

    pub fn has_pointer_toggle(self) -> bool {
        matches!(self, EffectKind::Silk)
    }

    pub fn component_name(self) -> &'static str {
        codegen::component_name(self)
    }

    pub fn controls(self) -> &'static [ControlSpec] {
        match self {
            EffectKind::Silk => SILK_CONTROLS,
            EffectKind::GodRays => GOD_RAYS_CONTROLS,
        }
    }

    /// Controls with a numeric range, in panel order.
    pub fn numeric_controls(self) -> impl Iterator<Item = &'static ControlSpec> {
        self.controls()
            .iter()
            .filter(|c| matches!(c.kind, ControlKind::Number { .. }))
    }

    pub fn next(self) -> Self {
        let i = self.index();
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = self.index();
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }
}

impl ControlSpec {
    /// Move a numeric control by `steps` increments, clamped to its range.
    ///
    /// Returns `None` for non-numeric controls or fields the configuration lacks.
    pub fn nudge(&self, config: &EffectConfig, steps: i32) -> Option<Result<ParamChange, EngineError>> {
        let ControlKind::Number { min, max, step } = self.kind else {
            return None;
        };
        let ParamValue::Number(current) = config.get(self.field)? else {
            return None;
        };
        let raw = (current + steps as f32 * step).clamp(min, max);
        let next = snap(raw, step);
        Some(ParamChange::parse(config.kind(), self.field, ParamValue::Number(next)))
    }
}

/// Round to the number of decimals the step has, so repeated nudges stay on clean values.
fn snap(v: f32, step: f32) -> f32 {
    let mut scale = 1.0f32;
    while (step * scale).fract().abs() > 1e-4 && scale < 1e4 {
        scale *= 10.0;
    }
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{GodRaysParam, SilkParam};

    fn control(kind: EffectKind, field: &str) -> ControlSpec {
        *kind.controls().iter().find(|c| c.field == field).unwrap()
    }

    #[test]
    fn carousel_wraps() {
        assert_eq!(EffectKind::Silk.next(), EffectKind::GodRays);
        assert_eq!(EffectKind::GodRays.next(), EffectKind::Silk);
        assert_eq!(EffectKind::Silk.prev(), EffectKind::GodRays);
    }

    #[test]
    fn every_control_names_a_real_field() {
        for kind in EffectKind::ALL {
            let cfg = EffectConfig::defaults(kind);
            for c in kind.controls() {
                assert!(cfg.get(c.field).is_some(), "{}", c.field);
            }
        }
        assert!(EffectKind::Silk.has_pointer_toggle());
        assert!(!EffectKind::GodRays.has_pointer_toggle());
    }

    #[test]
    fn nudge_steps_and_clamps() {
        let cfg = EffectConfig::defaults(EffectKind::Silk);
        let c = control(EffectKind::Silk, "distortionAmount");
        assert_eq!(
            c.nudge(&cfg, 1).unwrap().unwrap(),
            ParamChange::Silk(SilkParam::DistortionAmount(2.6))
        );
        assert_eq!(
            c.nudge(&cfg, 100).unwrap().unwrap(),
            ParamChange::Silk(SilkParam::DistortionAmount(5.0))
        );
        // default strength sits below the slider range
        let s = control(EffectKind::Silk, "brushStrength");
        assert_eq!(
            s.nudge(&cfg, 1).unwrap().unwrap(),
            ParamChange::Silk(SilkParam::BrushStrength(10.0))
        );
        assert!(control(EffectKind::Silk, "color1").nudge(&cfg, 1).is_none());
    }

    #[test]
    fn fine_steps_snap_to_two_decimals() {
        let cfg = EffectConfig::defaults(EffectKind::GodRays);
        let c = control(EffectKind::GodRays, "cloudDensity");
        assert_eq!(
            c.nudge(&cfg, -1).unwrap().unwrap(),
            ParamChange::GodRays(GodRaysParam::CloudDensity(0.25))
        );
    }
}
