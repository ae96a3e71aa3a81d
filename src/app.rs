//! Showcase state owned by the render thread.
//!
//! Everything that mutates the live session goes through [`App`]: keyboard
//! actions, OSC commands, preset reloads, window events. Other threads only
//! read the published configuration snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use silkrays_engine::controls::ControlSpec;
use silkrays_engine::effect::SilkParam;
use silkrays_engine::gpu::GpuBackend;
use silkrays_engine::{
    loge, logi, logw, EffectConfig, EffectKind, EngineError, ExportBundle, ParamChange, ParamValue, RenderSession,
};

use crate::controls::Action;
use crate::export;

/// Latest live configuration, readable from the OSC thread.
pub type Snapshot = Arc<RwLock<EffectConfig>>;

pub struct App<B: GpuBackend + Clone> {
    backend: B,
    session: Option<RenderSession<B>>,
    live: EffectKind,
    /// Configurations of effects that are not on screen, kept across switches.
    parked: HashMap<EffectKind, EffectConfig>,
    presets: HashMap<EffectKind, EffectConfig>,
    selected: usize,
    size: (i32, i32),
    /// App clock value at which the current session started.
    epoch: f64,
    export_dir: PathBuf,
    snapshot: Snapshot,
    last_error: Option<String>,
}

impl<B: GpuBackend + Clone> App<B> {
    pub fn new(
        backend: B,
        presets: HashMap<EffectKind, EffectConfig>,
        start: EffectKind,
        size: (i32, i32),
        export_dir: PathBuf,
        now: f64,
    ) -> Self {
        let initial = preset_or_default(&presets, start);
        let mut app = Self {
            backend,
            session: None,
            live: start,
            parked: presets.clone(),
            presets,
            selected: 0,
            size,
            epoch: now,
            export_dir,
            snapshot: Arc::new(RwLock::new(initial)),
            last_error: None,
        };
        app.mount(start, now);
        app
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot)
    }

    pub fn session(&self) -> Option<&RenderSession<B>> {
        self.session.as_ref()
    }

    pub fn live_kind(&self) -> EffectKind {
        self.live
    }

    pub fn live_config(&self) -> EffectConfig {
        match &self.session {
            Some(s) => s.config().clone(),
            None => preset_or_default(&self.parked, self.live),
        }
    }

    pub fn selected_control(&self) -> Option<&'static ControlSpec> {
        self.live.numeric_controls().nth(self.selected)
    }

    pub fn set_export_dir(&mut self, dir: PathBuf) {
        self.export_dir = dir;
    }

    /// Window title: effect, selected control and its value, or the last render error.
    pub fn title(&self) -> String {
        if let Some(e) = &self.last_error {
            return format!("silkrays - {} - render error: {e}", self.live.name());
        }
        let control = match self.selected_control() {
            Some(c) => match self.live_config().get(c.field) {
                Some(ParamValue::Number(v)) => format!("{} Settings / {} = {v}", self.live.settings_label(), c.label),
                _ => c.label.to_string(),
            },
            None => String::new(),
        };
        format!("silkrays - {} - {control}", self.live.name())
    }

    fn mount(&mut self, kind: EffectKind, now: f64) {
        let cfg = preset_or_default(&self.parked, kind);
        let (w, h) = self.size;
        self.live = kind;
        self.selected = 0;
        self.epoch = now;
        match RenderSession::replace(&mut self.session, self.backend.clone(), cfg, w, h) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                loge!("SESSION", "failed to start {}: {e}", kind.name());
                self.last_error = Some(e.to_string());
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let cfg = self.live_config();
        if let Ok(mut g) = self.snapshot.write() {
            *g = cfg;
        }
    }

    /// Tear down the current session and start `kind`, keeping the old effect's edits.
    pub fn switch_to(&mut self, kind: EffectKind, now: f64) {
        if let Some(s) = &self.session {
            self.parked.insert(self.live, s.config().clone());
        }
        logi!("SESSION", "switching {} -> {}", self.live.name(), kind.name());
        self.mount(kind, now);
    }

    pub fn apply(&mut self, change: &ParamChange) -> Result<bool, EngineError> {
        let Some(s) = self.session.as_mut() else {
            return Ok(false);
        };
        let changed = s.apply(change)?;
        if changed {
            self.publish();
        }
        Ok(changed)
    }

    /// Set a field by id, as received from a control surface.
    pub fn set_field(&mut self, field: &str, value: ParamValue) -> Result<bool, EngineError> {
        let change = ParamChange::parse(self.live, field, value)?;
        self.apply(&change)
    }

    /// Bring the live effect back to its preset, touching only fields that differ.
    pub fn reset(&mut self) -> Result<usize, EngineError> {
        let target = preset_or_default(&self.presets, self.live);
        self.apply_diff(&target)
    }

    /// A preset file changed on disk.
    pub fn preset_changed(&mut self, kind: EffectKind, preset: EffectConfig) -> Result<usize, EngineError> {
        self.presets.insert(kind, preset.clone());
        if kind != self.live {
            self.parked.insert(kind, preset);
            return Ok(0);
        }
        self.apply_diff(&preset)
    }

    fn apply_diff(&mut self, target: &EffectConfig) -> Result<usize, EngineError> {
        let Some(changes) = self.live_config().diff(target) else {
            return Ok(0);
        };
        let Some(s) = self.session.as_mut() else {
            return Ok(0);
        };
        let result = s.apply_all(&changes);
        // earlier fields stay applied when a later one is rejected
        if !matches!(result, Ok(0)) {
            self.publish();
        }
        result
    }

    pub fn export(&self) -> anyhow::Result<PathBuf> {
        let bundle = ExportBundle::new(&self.live_config())?;
        export::write_bundle(&self.export_dir, &bundle)
    }

    pub fn handle_action(&mut self, action: Action, now: f64) {
        match action {
            Action::NextEffect => self.switch_to(self.live.next(), now),
            Action::PrevEffect => self.switch_to(self.live.prev(), now),
            Action::SelectNext | Action::SelectPrev => {
                let n = self.live.numeric_controls().count();
                if n > 0 {
                    self.selected = if action == Action::SelectNext {
                        (self.selected + 1) % n
                    } else {
                        (self.selected + n - 1) % n
                    };
                }
                if let Some(c) = self.selected_control() {
                    logi!("CONTROLS", "selected {}", c.label);
                }
            }
            Action::Nudge(steps) => {
                let cfg = self.live_config();
                let Some(c) = self.selected_control() else {
                    return;
                };
                match c.nudge(&cfg, steps) {
                    Some(Ok(change)) => {
                        let r = self.apply(&change);
                        self.report("CONTROLS", &change, r);
                    }
                    Some(Err(e)) => logw!("CONTROLS", "{}: {e}", c.label),
                    None => {}
                }
            }
            Action::TogglePointer => {
                if let EffectConfig::Silk(c) = self.live_config() {
                    let change = ParamChange::Silk(SilkParam::MouseDistortion(!c.mouse_distortion_enabled));
                    let r = self.apply(&change);
                    self.report("CONTROLS", &change, r);
                } else {
                    logi!("CONTROLS", "{} has no pointer interaction", self.live.name());
                }
            }
            Action::Export => {
                if let Err(e) = self.export() {
                    loge!("EXPORT", "{e:#}");
                }
            }
            Action::Reset => match self.reset() {
                Ok(n) => logi!("PRESET", "reset {} ({n} fields changed)", self.live.name()),
                Err(e) => loge!("PRESET", "reset failed: {e}"),
            },
        }
    }

    pub fn report(&self, tag: &str, change: &ParamChange, result: Result<bool, EngineError>) {
        match result {
            Ok(true) => logi!(tag, "{} = {:?}", change.field(), self.live_config().get(change.field())),
            Ok(false) => {}
            Err(e) => logw!(tag, "{} rejected: {e}", change.field()),
        }
    }

    /// Render one frame at app time `now` (seconds).
    pub fn render(&mut self, now: f64) -> bool {
        let t = now - self.epoch;
        self.session.as_mut().map(|s| s.render_frame(t)).unwrap_or(false)
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.size = (width.max(1), height.max(1));
        if let Some(s) = self.session.as_mut() {
            s.resize(width, height);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y_from_top: f32, now: f64) {
        let t = now - self.epoch;
        if let Some(s) = self.session.as_mut() {
            s.pointer_move(x, y_from_top, t);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.pointer_leave();
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut s) = self.session.take() {
            s.teardown();
        }
    }
}

fn preset_or_default(map: &HashMap<EffectKind, EffectConfig>, kind: EffectKind) -> EffectConfig {
    map.get(&kind).cloned().unwrap_or_else(|| EffectConfig::defaults(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use silkrays_engine::gpu::RecordingBackend;

    fn app(dir: PathBuf) -> App<RecordingBackend> {
        App::new(RecordingBackend::new(), HashMap::new(), EffectKind::Silk, (320, 200), dir, 0.0)
    }

    #[test]
    fn rejected_preset_field_still_publishes_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path().to_path_buf());
        let bad = EffectConfig::Silk(silkrays_engine::SilkConfig {
            brush_size: 40.0,
            distortion_amount: 0.0,
            ..Default::default()
        });
        assert!(a.preset_changed(EffectKind::Silk, bad).is_err());

        assert_eq!(a.live_config().get("brushSize"), Some(ParamValue::Number(40.0)));
        let snap = a.snapshot();
        assert_eq!(snap.read().unwrap().get("brushSize"), Some(ParamValue::Number(40.0)));
        assert_eq!(snap.read().unwrap().get("distortionAmount"), Some(ParamValue::Number(2.5)));
    }

    #[test]
    fn switching_keeps_edits_per_effect() {
        let mut a = app(PathBuf::from("."));
        a.set_field("brushSize", ParamValue::Number(70.0)).unwrap();
        a.handle_action(Action::NextEffect, 1.0);
        assert_eq!(a.live_kind(), EffectKind::GodRays);
        assert_eq!(a.snapshot().read().unwrap().kind(), EffectKind::GodRays);

        a.handle_action(Action::PrevEffect, 2.0);
        assert_eq!(a.live_config().get("brushSize"), Some(ParamValue::Number(70.0)));
    }

    #[test]
    fn nudge_targets_selected_control() {
        let mut a = app(PathBuf::from("."));
        a.handle_action(Action::SelectPrev, 0.0);
        assert_eq!(a.selected_control().map(|c| c.field), Some("distortionAmount"));
        a.handle_action(Action::Nudge(-5), 0.0);
        assert_eq!(a.live_config().get("distortionAmount"), Some(ParamValue::Number(2.0)));
    }

    #[test]
    fn reset_and_preset_reload_apply_only_differences() {
        let mut a = app(PathBuf::from("."));
        a.set_field("color1", ParamValue::Text("#000000".into())).unwrap();
        assert_eq!(a.reset().unwrap(), 1);
        assert_eq!(a.live_config(), EffectConfig::defaults(EffectKind::Silk));

        let mut edited = EffectConfig::defaults(EffectKind::Silk);
        edited.apply(&ParamChange::Silk(SilkParam::BrushSize(90.0))).unwrap();
        assert_eq!(a.preset_changed(EffectKind::Silk, edited.clone()).unwrap(), 1);
        assert_eq!(a.live_config(), edited);

        let other = EffectConfig::defaults(EffectKind::GodRays);
        assert_eq!(a.preset_changed(EffectKind::GodRays, other).unwrap(), 0);
    }

    #[test]
    fn toggle_pointer_flips_flag() {
        let mut a = app(PathBuf::from("."));
        a.handle_action(Action::TogglePointer, 0.0);
        assert_eq!(a.live_config().get("mouseDistortionEnabled"), Some(ParamValue::Flag(false)));
    }

    #[test]
    fn export_writes_live_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path().to_path_buf());
        a.switch_to(EffectKind::GodRays, 0.0);
        a.set_field("rayCount", ParamValue::Number(7.0)).unwrap();
        let path = a.export().unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("uRayCount: { value: 7 },"));
    }

    #[test]
    fn failed_session_shows_in_title() {
        let mut gpu = RecordingBackend::new();
        gpu.fail_compile = Some("godrays");
        let a = App::new(gpu, HashMap::new(), EffectKind::GodRays, (10, 10), PathBuf::from("."), 0.0);
        assert!(a.session().is_none());
        assert!(a.title().contains("render error"));
    }
}
