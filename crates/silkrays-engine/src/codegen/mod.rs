//! Export a live configuration as a standalone three.js React component.
//!
//! Generation is a pure function of the configuration: no I/O, no clock, and the
//! same snapshot always yields byte-identical text. Writing the result anywhere is
//! the caller's business.

mod god_rays;
pub mod literal;
mod silk;

use crate::effect::{EffectConfig, EffectKind};
use crate::error::EngineError;

/// Packages the generated component needs at runtime.
pub const INSTALL_COMMAND: &str = "npm i three @types/three";

/// Source text of the component reproducing `config`.
///
/// The configuration is validated first so a bad value surfaces as an error
/// instead of an unparseable literal.
pub fn generate_code(config: &EffectConfig) -> Result<String, EngineError> {
    config.validate()?;
    Ok(match config {
        EffectConfig::Silk(c) => silk::generate(c),
        EffectConfig::GodRays(c) => god_rays::generate(c),
    })
}

pub fn component_name(kind: EffectKind) -> &'static str {
    match kind {
        EffectKind::Silk => silk::COMPONENT_NAME,
        EffectKind::GodRays => god_rays::COMPONENT_NAME,
    }
}

/// Everything the export panel shows for one effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub kind: EffectKind,
    pub component_name: &'static str,
    pub install_command: &'static str,
    pub usage_snippet: String,
    pub source: String,
}

impl ExportBundle {
    pub fn new(config: &EffectConfig) -> Result<Self, EngineError> {
        let kind = config.kind();
        let component_name = component_name(kind);
        Ok(Self {
            kind,
            component_name,
            install_command: INSTALL_COMMAND,
            usage_snippet: format!("<{component_name} />"),
            source: generate_code(config)?,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.tsx", self.component_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SilkConfig;

    #[test]
    fn invalid_config_is_rejected_before_templating() {
        let cfg = EffectConfig::Silk(SilkConfig {
            brush_size: f32::NAN,
            ..SilkConfig::default()
        });
        assert!(matches!(generate_code(&cfg), Err(EngineError::InvalidParam { field: "brushSize", .. })));
    }

    #[test]
    fn bundle_names_follow_component() {
        let b = ExportBundle::new(&EffectConfig::defaults(EffectKind::GodRays)).unwrap();
        assert_eq!(b.usage_snippet, "<GodRaysComponent />");
        assert_eq!(b.file_name(), "GodRaysComponent.tsx");
        assert_eq!(b.install_command, "npm i three @types/three");

        let b = ExportBundle::new(&EffectConfig::defaults(EffectKind::Silk)).unwrap();
        assert_eq!(b.file_name(), "BgComponent.tsx");
        assert!(b.source.contains("export function BgComponent()"));
    }
}
