//! Config + preset validation (friendly errors)
//!
//! Purpose:
//! - Catch common misconfigurations early
//! - Explain *what* is wrong, *where* it lives, and *what to do*
//! - Keep the showcase running by falling back to defaults

use std::net::SocketAddr;

use silkrays_engine::config::{Preset, ShowcaseConfig, PRESET_VERSION};
use silkrays_engine::{loge, logi, logw};

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    Warn,
    Error,
}

impl ValidationIssue {
    pub fn warn(path: impl Into<String>, message: impl Into<String>, hint: Option<String>) -> Self {
        Self { level: IssueLevel::Warn, path: path.into(), message: message.into(), hint }
    }
    pub fn error(path: impl Into<String>, message: impl Into<String>, hint: Option<String>) -> Self {
        Self { level: IssueLevel::Error, path: path.into(), message: message.into(), hint }
    }
}

pub fn emit_issues(tag: &str, issues: &[ValidationIssue]) {
    for it in issues {
        let hint = it.hint.as_deref().map(|h| format!(" (hint: {h})")).unwrap_or_default();
        match it.level {
            IssueLevel::Warn => logw!(tag, "{}: {}{hint}", it.path, it.message),
            IssueLevel::Error => loge!(tag, "{}: {}{hint}", it.path, it.message),
        }
    }
}

/// Emit a one-line summary even when there are zero issues.
pub fn emit_summary(tag: &str, label: &str, issues: &[ValidationIssue]) {
    let warns = issues.iter().filter(|i| i.level == IssueLevel::Warn).count();
    let errs = issues.iter().filter(|i| i.level == IssueLevel::Error).count();
    if errs == 0 && warns == 0 {
        logi!(tag, "validation: {label} OK (0 issues)");
    } else {
        logw!(tag, "validation: {label} issues found (errors={errs} warnings={warns})");
    }
}

/// Problems found while loading a preset. Rejected fields already fell back to defaults.
pub fn validate_preset(label: &str, preset: &Preset) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if preset.version != PRESET_VERSION {
        issues.push(ValidationIssue::warn(
            format!("{label}:/version"),
            format!("version {} (expected {PRESET_VERSION})", preset.version),
            Some("fields are still read, but may not mean what you expect".into()),
        ));
    }
    for name in &preset.unknown {
        let fields = preset.config.fields().join(", ");
        issues.push(ValidationIssue::warn(
            format!("{label}:/{name}"),
            format!("unknown field for {}", preset.config.kind().name()),
            Some(format!("known fields: {fields}")),
        ));
    }
    for r in &preset.rejected {
        issues.push(ValidationIssue::error(
            format!("{label}:/{}", r.field),
            r.reason.clone(),
            Some("using the built-in default for this field".into()),
        ));
    }

    issues
}

pub fn validate_showcase(label: &str, cfg: &ShowcaseConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if cfg.version != 1 {
        issues.push(ValidationIssue::warn(
            format!("{label}:/version"),
            format!("version {} (expected 1)", cfg.version),
            None,
        ));
    }
    if cfg.window.width == 0 || cfg.window.height == 0 {
        issues.push(ValidationIssue::error(
            format!("{label}:/window"),
            format!("window size {}x{} has a zero dimension", cfg.window.width, cfg.window.height),
            Some("render targets are clamped to at least 1x1".into()),
        ));
    }
    if cfg.osc.bind.parse::<SocketAddr>().is_err() {
        let level = if cfg.osc.enabled { IssueLevel::Error } else { IssueLevel::Warn };
        issues.push(ValidationIssue {
            level,
            path: format!("{label}:/osc/bind"),
            message: format!("'{}' is not a socket address", cfg.osc.bind),
            hint: Some("use host:port, e.g. 0.0.0.0:9000".into()),
        });
    }
    let prefix = cfg.osc.prefix.trim_matches('/');
    if prefix.is_empty() || prefix.contains('/') {
        issues.push(ValidationIssue::error(
            format!("{label}:/osc/prefix"),
            format!("'{}' must be a single address segment", cfg.osc.prefix),
            Some("e.g. \"silkrays\" for /silkrays/set/<field>".into()),
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use silkrays_engine::config::preset_from_value;
    use silkrays_engine::EffectKind;
    use std::path::Path;

    #[test]
    fn preset_problems_become_issues() {
        let v = serde_json::json!({ "version": 2, "brushSize": "fast", "glitter": 1 });
        let p = preset_from_value(EffectKind::Silk, Path::new("silk.json"), &v).unwrap();
        let issues = validate_preset("silk.json", &p);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.level == IssueLevel::Error && i.path == "silk.json:/brushSize"));
        assert!(issues.iter().any(|i| i.level == IssueLevel::Warn && i.path == "silk.json:/glitter"));
        assert!(issues.iter().any(|i| i.path == "silk.json:/version"));
    }

    #[test]
    fn default_showcase_is_clean() {
        assert!(validate_showcase("showcase.json", &ShowcaseConfig::default()).is_empty());
    }

    #[test]
    fn bad_bind_is_an_error_only_when_osc_is_enabled() {
        let mut cfg = ShowcaseConfig::default();
        cfg.osc.bind = "nowhere".into();
        assert_eq!(validate_showcase("s", &cfg)[0].level, IssueLevel::Warn);
        cfg.osc.enabled = true;
        assert_eq!(validate_showcase("s", &cfg)[0].level, IssueLevel::Error);
    }

    #[test]
    fn nested_prefix_is_rejected() {
        let mut cfg = ShowcaseConfig::default();
        cfg.osc.prefix = "a/b".into();
        let issues = validate_showcase("s", &cfg);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "s:/osc/prefix");
    }
}
