//! Effect configurations and the parameter changes that mutate them.
//!
//! A configuration is a tagged union over exactly the two effect shapes, so
//! consumers match exhaustively instead of probing field names at runtime.
//! Every mutation after construction goes through a [`ParamChange`], which is
//! what the binding layer turns into targeted uniform updates.

use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    #[serde(rename = "silk")]
    Silk,
    #[serde(rename = "godrays", alias = "god_rays")]
    GodRays,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Silk, EffectKind::GodRays];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Silk => "Silk",
            EffectKind::GodRays => "God Rays",
        }
    }

    /// Stable id used for preset file names and OSC addresses.
    pub fn id(self) -> &'static str {
        match self {
            EffectKind::Silk => "silk",
            EffectKind::GodRays => "godrays",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "silk" => Some(EffectKind::Silk),
            "godrays" | "god_rays" | "god-rays" => Some(EffectKind::GodRays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SilkConfig {
    pub brush_size: f32,
    pub brush_strength: f32,
    pub distortion_amount: f32,
    pub color1: HexColor,
    pub color2: HexColor,
    pub color3: HexColor,
    pub color4: HexColor,
    #[serde(alias = "isMouseDistortionOn")]
    pub mouse_distortion_enabled: bool,
    /// Bound as 1.0 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_intensity: Option<f32>,
    /// Bound as 1.0 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub softness: Option<f32>,
}

impl Default for SilkConfig {
    fn default() -> Self {
        Self {
            brush_size: 25.0,
            brush_strength: 0.5,
            distortion_amount: 2.5,
            color1: HexColor::known("#b8fff7"),
            color2: HexColor::known("#6e3466"),
            color3: HexColor::known("#0133ff"),
            color4: HexColor::known("#66d1fe"),
            mouse_distortion_enabled: true,
            color_intensity: None,
            softness: None,
        }
    }
}

impl SilkConfig {
    pub fn color_intensity_or_default(&self) -> f32 {
        self.color_intensity.unwrap_or(1.0)
    }

    pub fn softness_or_default(&self) -> f32 {
        self.softness.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GodRaysConfig {
    pub ray_intensity: f32,
    pub animation_speed: f32,
    pub ray_count: f32,
    pub light_radius: f32,
    pub cloud_density: f32,
    pub background_color1: HexColor,
    pub background_color2: HexColor,
    pub ray_color: HexColor,
}

impl Default for GodRaysConfig {
    fn default() -> Self {
        Self {
            ray_intensity: 1.0,
            animation_speed: 1.0,
            ray_count: 12.0,
            light_radius: 1.5,
            cloud_density: 0.3,
            background_color1: HexColor::known("#0d1a33"),
            background_color2: HexColor::known("#334d80"),
            ray_color: HexColor::known("#fff9cc"),
        }
    }
}

/// The live configuration of one displayed canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect")]
pub enum EffectConfig {
    #[serde(rename = "silk")]
    Silk(SilkConfig),
    #[serde(rename = "godrays")]
    GodRays(GodRaysConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SilkParam {
    BrushSize(f32),
    BrushStrength(f32),
    DistortionAmount(f32),
    Color1(HexColor),
    Color2(HexColor),
    Color3(HexColor),
    Color4(HexColor),
    ColorIntensity(Option<f32>),
    Softness(Option<f32>),
    MouseDistortion(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GodRaysParam {
    RayIntensity(f32),
    AnimationSpeed(f32),
    RayCount(f32),
    LightRadius(f32),
    CloudDensity(f32),
    BackgroundColor1(HexColor),
    BackgroundColor2(HexColor),
    RayColor(HexColor),
}

/// A single-field mutation of a live configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamChange {
    Silk(SilkParam),
    GodRays(GodRaysParam),
}

/// Untyped field value as it arrives from a control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Text(String),
    Flag(bool),
}

pub const SILK_FIELDS: &[&str] = &[
    "brushSize",
    "brushStrength",
    "distortionAmount",
    "color1",
    "color2",
    "color3",
    "color4",
    "colorIntensity",
    "softness",
    "mouseDistortionEnabled",
];

pub const GOD_RAYS_FIELDS: &[&str] = &[
    "rayIntensity",
    "animationSpeed",
    "rayCount",
    "lightRadius",
    "cloudDensity",
    "backgroundColor1",
    "backgroundColor2",
    "rayColor",
];

fn check_number(field: &'static str, value: f32) -> Result<f32, EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidParam { field, value })
    }
}

/// Brush size divides the falloff in the fluid pass; zero would poison the feedback buffer.
fn check_positive(field: &'static str, value: f32) -> Result<f32, EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidParam { field, value })
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl SilkParam {
    pub fn field(&self) -> &'static str {
        match self {
            SilkParam::BrushSize(_) => "brushSize",
            SilkParam::BrushStrength(_) => "brushStrength",
            SilkParam::DistortionAmount(_) => "distortionAmount",
            SilkParam::Color1(_) => "color1",
            SilkParam::Color2(_) => "color2",
            SilkParam::Color3(_) => "color3",
            SilkParam::Color4(_) => "color4",
            SilkParam::ColorIntensity(_) => "colorIntensity",
            SilkParam::Softness(_) => "softness",
            SilkParam::MouseDistortion(_) => "mouseDistortionEnabled",
        }
    }

    fn parse(field: &str, value: ParamValue) -> Result<Self, EngineError> {
        let bad = || EngineError::InvalidConfig {
            path: "<param>".into(),
            msg: format!("silk field '{field}' does not accept {value:?}"),
        };
        let p = match (field, &value) {
            ("brushSize", ParamValue::Number(v)) => SilkParam::BrushSize(*v),
            ("brushStrength", ParamValue::Number(v)) => SilkParam::BrushStrength(*v),
            ("distortionAmount", ParamValue::Number(v)) => SilkParam::DistortionAmount(*v),
            ("color1", ParamValue::Text(s)) => SilkParam::Color1(HexColor::parse(s)?),
            ("color2", ParamValue::Text(s)) => SilkParam::Color2(HexColor::parse(s)?),
            ("color3", ParamValue::Text(s)) => SilkParam::Color3(HexColor::parse(s)?),
            ("color4", ParamValue::Text(s)) => SilkParam::Color4(HexColor::parse(s)?),
            ("colorIntensity", ParamValue::Number(v)) => SilkParam::ColorIntensity(Some(*v)),
            ("softness", ParamValue::Number(v)) => SilkParam::Softness(Some(*v)),
            ("mouseDistortionEnabled", ParamValue::Flag(b)) => SilkParam::MouseDistortion(*b),
            ("mouseDistortionEnabled", ParamValue::Number(v)) => SilkParam::MouseDistortion(*v > 0.5),
            _ => return Err(bad()),
        };
        Ok(p)
    }
}

impl GodRaysParam {
    pub fn field(&self) -> &'static str {
        match self {
            GodRaysParam::RayIntensity(_) => "rayIntensity",
            GodRaysParam::AnimationSpeed(_) => "animationSpeed",
            GodRaysParam::RayCount(_) => "rayCount",
            GodRaysParam::LightRadius(_) => "lightRadius",
            GodRaysParam::CloudDensity(_) => "cloudDensity",
            GodRaysParam::BackgroundColor1(_) => "backgroundColor1",
            GodRaysParam::BackgroundColor2(_) => "backgroundColor2",
            GodRaysParam::RayColor(_) => "rayColor",
        }
    }

    fn parse(field: &str, value: ParamValue) -> Result<Self, EngineError> {
        let bad = || EngineError::InvalidConfig {
            path: "<param>".into(),
            msg: format!("god rays field '{field}' does not accept {value:?}"),
        };
        let p = match (field, &value) {
            ("rayIntensity", ParamValue::Number(v)) => GodRaysParam::RayIntensity(*v),
            ("animationSpeed", ParamValue::Number(v)) => GodRaysParam::AnimationSpeed(*v),
            ("rayCount", ParamValue::Number(v)) => GodRaysParam::RayCount(*v),
            ("lightRadius", ParamValue::Number(v)) => GodRaysParam::LightRadius(*v),
            ("cloudDensity", ParamValue::Number(v)) => GodRaysParam::CloudDensity(*v),
            ("backgroundColor1", ParamValue::Text(s)) => GodRaysParam::BackgroundColor1(HexColor::parse(s)?),
            ("backgroundColor2", ParamValue::Text(s)) => GodRaysParam::BackgroundColor2(HexColor::parse(s)?),
            ("rayColor", ParamValue::Text(s)) => GodRaysParam::RayColor(HexColor::parse(s)?),
            _ => return Err(bad()),
        };
        Ok(p)
    }
}

impl ParamChange {
    pub fn kind(&self) -> EffectKind {
        match self {
            ParamChange::Silk(_) => EffectKind::Silk,
            ParamChange::GodRays(_) => EffectKind::GodRays,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ParamChange::Silk(p) => p.field(),
            ParamChange::GodRays(p) => p.field(),
        }
    }

    /// Build a change from a field id (camelCase, as in preset files) and a raw value.
    pub fn parse(kind: EffectKind, field: &str, value: ParamValue) -> Result<Self, EngineError> {
        match kind {
            EffectKind::Silk => SilkParam::parse(field, value).map(ParamChange::Silk),
            EffectKind::GodRays => GodRaysParam::parse(field, value).map(ParamChange::GodRays),
        }
    }
}

impl EffectConfig {
    pub fn defaults(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Silk => EffectConfig::Silk(SilkConfig::default()),
            EffectKind::GodRays => EffectConfig::GodRays(GodRaysConfig::default()),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectConfig::Silk(_) => EffectKind::Silk,
            EffectConfig::GodRays(_) => EffectKind::GodRays,
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            EffectConfig::Silk(_) => SILK_FIELDS,
            EffectConfig::GodRays(_) => GOD_RAYS_FIELDS,
        }
    }

    /// Every numeric field must be finite and non-negative; the Silk brush and
    /// distortion fields must be strictly positive.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            EffectConfig::Silk(c) => {
                check_positive("brushSize", c.brush_size)?;
                check_positive("brushStrength", c.brush_strength)?;
                check_positive("distortionAmount", c.distortion_amount)?;
                if let Some(v) = c.color_intensity {
                    check_number("colorIntensity", v)?;
                }
                if let Some(v) = c.softness {
                    check_number("softness", v)?;
                }
            }
            EffectConfig::GodRays(c) => {
                check_number("rayIntensity", c.ray_intensity)?;
                check_number("animationSpeed", c.animation_speed)?;
                check_number("rayCount", c.ray_count)?;
                check_number("lightRadius", c.light_radius)?;
                check_number("cloudDensity", c.cloud_density)?;
            }
        }
        Ok(())
    }

    /// Apply one change. Returns whether the stored value actually changed.
    pub fn apply(&mut self, change: &ParamChange) -> Result<bool, EngineError> {
        match (self, change) {
            (EffectConfig::Silk(c), ParamChange::Silk(p)) => {
                let changed = match p {
                    SilkParam::BrushSize(v) => replace(&mut c.brush_size, check_positive("brushSize", *v)?),
                    SilkParam::BrushStrength(v) => {
                        replace(&mut c.brush_strength, check_positive("brushStrength", *v)?)
                    }
                    SilkParam::DistortionAmount(v) => {
                        replace(&mut c.distortion_amount, check_positive("distortionAmount", *v)?)
                    }
                    SilkParam::Color1(h) => replace(&mut c.color1, h.clone()),
                    SilkParam::Color2(h) => replace(&mut c.color2, h.clone()),
                    SilkParam::Color3(h) => replace(&mut c.color3, h.clone()),
                    SilkParam::Color4(h) => replace(&mut c.color4, h.clone()),
                    SilkParam::ColorIntensity(v) => {
                        if let Some(x) = v {
                            check_number("colorIntensity", *x)?;
                        }
                        replace(&mut c.color_intensity, *v)
                    }
                    SilkParam::Softness(v) => {
                        if let Some(x) = v {
                            check_number("softness", *x)?;
                        }
                        replace(&mut c.softness, *v)
                    }
                    SilkParam::MouseDistortion(b) => replace(&mut c.mouse_distortion_enabled, *b),
                };
                Ok(changed)
            }
            (EffectConfig::GodRays(c), ParamChange::GodRays(p)) => {
                let changed = match p {
                    GodRaysParam::RayIntensity(v) => {
                        replace(&mut c.ray_intensity, check_number("rayIntensity", *v)?)
                    }
                    GodRaysParam::AnimationSpeed(v) => {
                        replace(&mut c.animation_speed, check_number("animationSpeed", *v)?)
                    }
                    GodRaysParam::RayCount(v) => replace(&mut c.ray_count, check_number("rayCount", *v)?),
                    GodRaysParam::LightRadius(v) => {
                        replace(&mut c.light_radius, check_number("lightRadius", *v)?)
                    }
                    GodRaysParam::CloudDensity(v) => {
                        replace(&mut c.cloud_density, check_number("cloudDensity", *v)?)
                    }
                    GodRaysParam::BackgroundColor1(h) => replace(&mut c.background_color1, h.clone()),
                    GodRaysParam::BackgroundColor2(h) => replace(&mut c.background_color2, h.clone()),
                    GodRaysParam::RayColor(h) => replace(&mut c.ray_color, h.clone()),
                };
                Ok(changed)
            }
            (cfg, change) => Err(EngineError::EffectMismatch {
                session: cfg.kind(),
                change: change.kind(),
            }),
        }
    }

    /// Current value of a field, by id.
    pub fn get(&self, field: &str) -> Option<ParamValue> {
        use ParamValue::{Flag, Number, Text};
        let v = match self {
            EffectConfig::Silk(c) => match field {
                "brushSize" => Number(c.brush_size),
                "brushStrength" => Number(c.brush_strength),
                "distortionAmount" => Number(c.distortion_amount),
                "color1" => Text(c.color1.to_string()),
                "color2" => Text(c.color2.to_string()),
                "color3" => Text(c.color3.to_string()),
                "color4" => Text(c.color4.to_string()),
                "colorIntensity" => Number(c.color_intensity_or_default()),
                "softness" => Number(c.softness_or_default()),
                "mouseDistortionEnabled" => Flag(c.mouse_distortion_enabled),
                _ => return None,
            },
            EffectConfig::GodRays(c) => match field {
                "rayIntensity" => Number(c.ray_intensity),
                "animationSpeed" => Number(c.animation_speed),
                "rayCount" => Number(c.ray_count),
                "lightRadius" => Number(c.light_radius),
                "cloudDensity" => Number(c.cloud_density),
                "backgroundColor1" => Text(c.background_color1.to_string()),
                "backgroundColor2" => Text(c.background_color2.to_string()),
                "rayColor" => Text(c.ray_color.to_string()),
                _ => return None,
            },
        };
        Some(v)
    }

    /// Field-by-field changes that turn `self` into `target`.
    ///
    /// Returns `None` when the two configurations describe different effects.
    pub fn diff(&self, target: &EffectConfig) -> Option<Vec<ParamChange>> {
        let mut out = Vec::new();
        match (self, target) {
            (EffectConfig::Silk(a), EffectConfig::Silk(b)) => {
                let mut push = |differs: bool, p: SilkParam| {
                    if differs {
                        out.push(ParamChange::Silk(p));
                    }
                };
                push(a.brush_size != b.brush_size, SilkParam::BrushSize(b.brush_size));
                push(a.brush_strength != b.brush_strength, SilkParam::BrushStrength(b.brush_strength));
                push(
                    a.distortion_amount != b.distortion_amount,
                    SilkParam::DistortionAmount(b.distortion_amount),
                );
                push(a.color1 != b.color1, SilkParam::Color1(b.color1.clone()));
                push(a.color2 != b.color2, SilkParam::Color2(b.color2.clone()));
                push(a.color3 != b.color3, SilkParam::Color3(b.color3.clone()));
                push(a.color4 != b.color4, SilkParam::Color4(b.color4.clone()));
                push(a.color_intensity != b.color_intensity, SilkParam::ColorIntensity(b.color_intensity));
                push(a.softness != b.softness, SilkParam::Softness(b.softness));
                push(
                    a.mouse_distortion_enabled != b.mouse_distortion_enabled,
                    SilkParam::MouseDistortion(b.mouse_distortion_enabled),
                );
            }
            (EffectConfig::GodRays(a), EffectConfig::GodRays(b)) => {
                let mut push = |differs: bool, p: GodRaysParam| {
                    if differs {
                        out.push(ParamChange::GodRays(p));
                    }
                };
                push(a.ray_intensity != b.ray_intensity, GodRaysParam::RayIntensity(b.ray_intensity));
                push(a.animation_speed != b.animation_speed, GodRaysParam::AnimationSpeed(b.animation_speed));
                push(a.ray_count != b.ray_count, GodRaysParam::RayCount(b.ray_count));
                push(a.light_radius != b.light_radius, GodRaysParam::LightRadius(b.light_radius));
                push(a.cloud_density != b.cloud_density, GodRaysParam::CloudDensity(b.cloud_density));
                push(
                    a.background_color1 != b.background_color1,
                    GodRaysParam::BackgroundColor1(b.background_color1.clone()),
                );
                push(
                    a.background_color2 != b.background_color2,
                    GodRaysParam::BackgroundColor2(b.background_color2.clone()),
                );
                push(a.ray_color != b.ray_color, GodRaysParam::RayColor(b.ray_color.clone()));
            }
            _ => return None,
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_reports_only_real_changes() {
        let mut cfg = EffectConfig::defaults(EffectKind::Silk);
        assert!(!cfg.apply(&ParamChange::Silk(SilkParam::BrushSize(25.0))).unwrap());
        assert!(cfg.apply(&ParamChange::Silk(SilkParam::BrushSize(40.0))).unwrap());
        assert_eq!(cfg.get("brushSize"), Some(ParamValue::Number(40.0)));
    }

    #[test]
    fn apply_rejects_other_effect_and_bad_numbers() {
        let mut cfg = EffectConfig::defaults(EffectKind::GodRays);
        let err = cfg
            .apply(&ParamChange::Silk(SilkParam::BrushSize(30.0)))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::EffectMismatch { session: EffectKind::GodRays, change: EffectKind::Silk }
        ));

        let err = cfg
            .apply(&ParamChange::GodRays(GodRaysParam::RayCount(f32::NAN)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParam { field: "rayCount", .. }));
        assert_eq!(cfg, EffectConfig::defaults(EffectKind::GodRays));
    }

    #[test]
    fn diff_lists_changed_fields_only() {
        let a = EffectConfig::defaults(EffectKind::GodRays);
        let mut b = a.clone();
        b.apply(&ParamChange::GodRays(GodRaysParam::RayCount(20.0))).unwrap();
        b.apply(&ParamChange::GodRays(GodRaysParam::RayColor(HexColor::parse("#ff0000").unwrap())))
            .unwrap();

        let changes = a.diff(&b).unwrap();
        let fields: Vec<_> = changes.iter().map(|c| c.field()).collect();
        assert_eq!(fields, ["rayCount", "rayColor"]);

        let mut patched = a.clone();
        for c in &changes {
            patched.apply(c).unwrap();
        }
        assert_eq!(patched, b);
        assert!(a.diff(&EffectConfig::defaults(EffectKind::Silk)).is_none());
    }

    #[test]
    fn brush_and_distortion_reject_zero() {
        let mut cfg = EffectConfig::defaults(EffectKind::Silk);
        for change in [
            SilkParam::BrushSize(0.0),
            SilkParam::BrushStrength(0.0),
            SilkParam::DistortionAmount(0.0),
        ] {
            let err = cfg.apply(&ParamChange::Silk(change)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidParam { value, .. } if value == 0.0));
        }
        assert_eq!(cfg, EffectConfig::defaults(EffectKind::Silk));

        let zeroed = SilkConfig {
            brush_size: 0.0,
            ..SilkConfig::default()
        };
        assert!(matches!(
            EffectConfig::Silk(zeroed).validate(),
            Err(EngineError::InvalidParam { field: "brushSize", .. })
        ));
    }

    #[test]
    fn parses_control_surface_values() {
        let c = ParamChange::parse(EffectKind::Silk, "color2", ParamValue::Text("#00FF00".into())).unwrap();
        assert_eq!(c, ParamChange::Silk(SilkParam::Color2(HexColor::parse("#00ff00").unwrap())));

        let c = ParamChange::parse(EffectKind::Silk, "mouseDistortionEnabled", ParamValue::Number(0.0)).unwrap();
        assert_eq!(c, ParamChange::Silk(SilkParam::MouseDistortion(false)));

        assert!(ParamChange::parse(EffectKind::GodRays, "brushSize", ParamValue::Number(1.0)).is_err());
        assert!(ParamChange::parse(EffectKind::GodRays, "rayColor", ParamValue::Text("red".into())).is_err());
    }

    #[test]
    fn silk_accepts_original_ui_field_names() {
        let json = r##"{ "brushSize": 40, "isMouseDistortionOn": false, "color1": "#000000" }"##;
        let cfg: SilkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.brush_size, 40.0);
        assert!(!cfg.mouse_distortion_enabled);
        assert_eq!(cfg.color1.as_str(), "#000000");
        assert_eq!(cfg.color2, SilkConfig::default().color2);
        assert_eq!(cfg.color_intensity_or_default(), 1.0);
    }

    #[test]
    fn tagged_union_round_trips_through_json() {
        let cfg = EffectConfig::defaults(EffectKind::GodRays);
        let s = serde_json::to_string(&cfg).unwrap();
        assert!(s.contains("\"effect\":\"godrays\""));
        let back: EffectConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }
}
