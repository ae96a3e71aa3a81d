//! Showcase and preset configuration.
//!
//! - `assets/showcase.json`: window, starting effect, export directory, OSC listener
//! - `assets/presets/<effect>.json`: initial configuration per effect
//!
//! Both are forward-compatible: unknown fields are ignored and missing fields take
//! defaults. Presets are read field by field so one bad value only resets that field.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::assets::{load_json_value, AssetsRoot};
use crate::effect::{EffectConfig, EffectKind, ParamChange, ParamValue};
use crate::error::EngineError;

pub const PRESET_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "silkrays".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub enabled: bool,
    pub bind: String,
    /// Address prefix without slashes, e.g. `silkrays` for `/silkrays/set/rayCount`.
    pub prefix: String,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "0.0.0.0:9000".to_string(),
            prefix: "silkrays".to_string(),
        }
    }
}

/// Typed view of `assets/showcase.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub version: u32,
    pub window: WindowConfig,
    pub start_effect: EffectKind,
    /// Relative paths resolve under `assets/`.
    pub export_dir: String,
    pub osc: OscConfig,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            version: 1,
            window: WindowConfig::default(),
            start_effect: EffectKind::Silk,
            export_dir: "../exports".to_string(),
            osc: OscConfig::default(),
        }
    }
}

/// Resolved file locations for one run.
#[derive(Debug, Clone)]
pub struct ShowcasePaths {
    pub assets: AssetsRoot,
    pub showcase_json: PathBuf,
    pub presets_dir: PathBuf,
}

impl ShowcasePaths {
    pub fn new(assets: AssetsRoot) -> Self {
        let showcase_json = assets.pick_platform_json("showcase");
        let presets_dir = assets.join("presets");
        Self {
            assets,
            showcase_json,
            presets_dir,
        }
    }

    pub fn preset(&self, kind: EffectKind) -> PathBuf {
        preset_path(&self.presets_dir, kind)
    }

    /// Which effect a changed file belongs to, if it is one of the presets.
    pub fn preset_kind(&self, path: &Path) -> Option<EffectKind> {
        let in_presets = path.parent().is_some_and(|d| d.ends_with("presets"));
        if !in_presets {
            return None;
        }
        EffectKind::ALL
            .into_iter()
            .find(|k| path.file_name() == self.preset(*k).file_name())
    }
}

pub fn preset_path(presets_dir: &Path, kind: EffectKind) -> PathBuf {
    presets_dir.join(format!("{}.json", kind.id()))
}

/// Load `showcase.json`, or defaults when the file does not exist.
pub fn load_showcase(path: &Path) -> Result<ShowcaseConfig, EngineError> {
    if !path.exists() {
        return Ok(ShowcaseConfig::default());
    }
    let value = load_json_value(path)?;
    serde_json::from_value(value).map_err(|e| EngineError::JsonValue {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A field of a preset that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedField {
    pub field: String,
    pub reason: String,
}

/// A preset after lenient loading.
#[derive(Debug, Clone)]
pub struct Preset {
    pub config: EffectConfig,
    pub version: u32,
    /// Fields present in the file but unknown for this effect.
    pub unknown: Vec<String>,
    /// Known fields whose values were rejected; these kept their defaults.
    pub rejected: Vec<RejectedField>,
}

/// Build a configuration from a preset JSON object, starting from the defaults.
pub fn preset_from_value(kind: EffectKind, path: &Path, value: &Value) -> Result<Preset, EngineError> {
    let obj = value.as_object().ok_or_else(|| EngineError::InvalidConfig {
        path: path.to_path_buf(),
        msg: "preset must be a JSON object".to_string(),
    })?;

    let mut config = EffectConfig::defaults(kind);
    let mut preset = Preset {
        config: config.clone(),
        version: PRESET_VERSION,
        unknown: Vec::new(),
        rejected: Vec::new(),
    };

    for (key, v) in obj {
        if key == "version" {
            preset.version = v.as_u64().map(|n| n as u32).unwrap_or(0);
            continue;
        }
        let field = match key.as_str() {
            // name used by the web UI state
            "isMouseDistortionOn" => "mouseDistortionEnabled",
            k => k,
        };
        if !config.fields().contains(&field) {
            preset.unknown.push(key.clone());
            continue;
        }
        let Some(pv) = param_value(v) else {
            preset.rejected.push(RejectedField {
                field: key.clone(),
                reason: format!("unsupported JSON value {v}"),
            });
            continue;
        };
        match ParamChange::parse(kind, field, pv).and_then(|c| config.apply(&c)) {
            Ok(_) => {}
            Err(e) => preset.rejected.push(RejectedField {
                field: key.clone(),
                reason: e.to_string(),
            }),
        }
    }

    preset.config = config;
    Ok(preset)
}

/// Load `presets/<effect>.json`. A missing file yields the built-in defaults.
pub fn load_preset(presets_dir: &Path, kind: EffectKind) -> Result<Preset, EngineError> {
    let path = preset_path(presets_dir, kind);
    if !path.exists() {
        return Ok(Preset {
            config: EffectConfig::defaults(kind),
            version: PRESET_VERSION,
            unknown: Vec::new(),
            rejected: Vec::new(),
        });
    }
    let value = load_json_value(&path)?;
    preset_from_value(kind, &path, &value)
}

fn param_value(v: &Value) -> Option<ParamValue> {
    match v {
        Value::Number(n) => n.as_f64().map(|f| ParamValue::Number(f as f32)),
        // numbers arrive as strings from the web UI's slider state
        Value::String(s) => match s.trim().parse::<f32>() {
            Ok(f) if !s.trim_start().starts_with('#') => Some(ParamValue::Number(f)),
            _ => Some(ParamValue::Text(s.clone())),
        },
        Value::Bool(b) => Some(ParamValue::Flag(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preset_overrides_defaults_and_reports_problems() {
        let v = json!({
            "version": 1,
            "rayCount": 24,
            "rayColor": "#FF0000",
            "backgroundColor1": "blue",
            "cloudDensity": -1.0,
            "sparkle": true
        });
        let p = preset_from_value(EffectKind::GodRays, Path::new("godrays.json"), &v).unwrap();
        assert_eq!(p.config.get("rayCount"), Some(ParamValue::Number(24.0)));
        assert_eq!(p.config.get("rayColor"), Some(ParamValue::Text("#ff0000".into())));
        assert_eq!(p.config.get("backgroundColor1"), Some(ParamValue::Text("#0d1a33".into())));
        assert_eq!(p.config.get("cloudDensity"), Some(ParamValue::Number(0.3)));
        assert_eq!(p.unknown, vec!["sparkle".to_string()]);
        let rejected: Vec<_> = p.rejected.iter().map(|r| r.field.as_str()).collect();
        assert!(rejected.contains(&"backgroundColor1"));
        assert!(rejected.contains(&"cloudDensity"));
    }

    #[test]
    fn string_numbers_and_ui_toggle_name_are_accepted() {
        let v = json!({ "brushSize": "40", "isMouseDistortionOn": false });
        let p = preset_from_value(EffectKind::Silk, Path::new("silk.json"), &v).unwrap();
        assert_eq!(p.config.get("brushSize"), Some(ParamValue::Number(40.0)));
        assert_eq!(p.config.get("mouseDistortionEnabled"), Some(ParamValue::Flag(false)));
        assert!(p.rejected.is_empty());
    }

    #[test]
    fn zero_brush_size_in_preset_keeps_default() {
        let v = json!({ "brushSize": 0, "distortionAmount": 3.0 });
        let p = preset_from_value(EffectKind::Silk, Path::new("silk.json"), &v).unwrap();
        assert_eq!(p.config.get("brushSize"), Some(ParamValue::Number(25.0)));
        assert_eq!(p.config.get("distortionAmount"), Some(ParamValue::Number(3.0)));
        assert_eq!(p.rejected.len(), 1);
        assert_eq!(p.rejected[0].field, "brushSize");
    }

    #[test]
    fn changed_file_maps_to_its_effect() {
        let paths = ShowcasePaths::new(AssetsRoot::at("/srv/assets"));
        assert_eq!(paths.preset_kind(Path::new("/srv/assets/presets/godrays.json")), Some(EffectKind::GodRays));
        assert_eq!(paths.preset_kind(Path::new("/srv/assets/presets/other.json")), None);
        assert_eq!(paths.preset_kind(Path::new("/srv/assets/silk.json")), None);
    }

    #[test]
    fn non_object_preset_is_an_error() {
        let err = preset_from_value(EffectKind::Silk, Path::new("silk.json"), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = load_preset(dir.path(), EffectKind::Silk).unwrap();
        assert_eq!(p.config, EffectConfig::defaults(EffectKind::Silk));
        let s = load_showcase(&dir.path().join("showcase.json")).unwrap();
        assert_eq!(s, ShowcaseConfig::default());
    }

    #[test]
    fn showcase_fields_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("showcase.json");
        std::fs::write(
            &path,
            r#"{ "start_effect": "godrays", "window": { "width": 640 }, "osc": { "enabled": true } }"#,
        )
        .unwrap();
        let s = load_showcase(&path).unwrap();
        assert_eq!(s.start_effect, EffectKind::GodRays);
        assert_eq!(s.window.width, 640);
        assert_eq!(s.window.height, 720);
        assert!(s.osc.enabled);
        assert_eq!(s.osc.prefix, "silkrays");
    }
}
