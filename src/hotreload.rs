//! Preset hot-reload watcher
//!
//! We watch **directories** (not individual files) because file replacement on save is often implemented as:
//! write temp → rename/replace → delete old. Directory watching is the most reliable cross-platform approach.
//!
//! The watcher thread only classifies paths and sends events; the render thread
//! re-reads the file and applies the differences to the live session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use notify::{Config, Event, EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use silkrays_engine::config::ShowcasePaths;
use silkrays_engine::EffectKind;

#[derive(Debug, Clone, PartialEq)]
pub enum HotEvent {
    /// `presets/<effect>.json` was written
    PresetChanged(EffectKind, PathBuf),
    /// `showcase.json` was written
    ShowcaseChanged(PathBuf),
}

pub struct HotReload {
    _watcher: RecommendedWatcher,
    rx: Receiver<HotEvent>,
}

impl HotReload {
    pub fn rx(&self) -> &Receiver<HotEvent> {
        &self.rx
    }

    pub fn new(paths: &ShowcasePaths) -> anyhow::Result<Self> {
        let (tx, rx) = unbounded::<HotEvent>();
        let classify_paths = paths.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let Ok(ev) = res else { return };
                if matches!(ev.kind, FsEventKind::Access(_) | FsEventKind::Remove(_)) {
                    return;
                }
                for p in ev.paths {
                    if let Some(hot) = classify(&classify_paths, &p) {
                        let _ = tx.send(hot);
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_millis(250)),
        )?;

        // Watch parent dirs so we catch atomic-save (rename) events reliably
        if paths.presets_dir.is_dir() {
            watcher.watch(&paths.presets_dir, RecursiveMode::NonRecursive)?;
        }
        watch_parent(&mut watcher, &paths.showcase_json)?;

        Ok(Self { _watcher: watcher, rx })
    }
}

/// Map a changed path to the event it means, ignoring everything else in the watched dirs.
pub fn classify(paths: &ShowcasePaths, p: &Path) -> Option<HotEvent> {
    if p.extension().and_then(|s| s.to_str()) != Some("json") {
        return None;
    }
    if let Some(kind) = paths.preset_kind(p) {
        return Some(HotEvent::PresetChanged(kind, p.to_path_buf()));
    }
    if p.file_name() == paths.showcase_json.file_name() {
        return Some(HotEvent::ShowcaseChanged(p.to_path_buf()));
    }
    None
}

fn watch_parent(w: &mut RecommendedWatcher, file: &Path) -> anyhow::Result<()> {
    let parent = file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    w.watch(&parent, RecursiveMode::NonRecursive)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use silkrays_engine::assets::AssetsRoot;

    #[test]
    fn classifies_presets_and_showcase() {
        let paths = ShowcasePaths::new(AssetsRoot::at("/srv/assets"));
        assert_eq!(
            classify(&paths, Path::new("/srv/assets/presets/silk.json")),
            Some(HotEvent::PresetChanged(EffectKind::Silk, PathBuf::from("/srv/assets/presets/silk.json")))
        );
        assert_eq!(
            classify(&paths, Path::new("/srv/assets/showcase.json")),
            Some(HotEvent::ShowcaseChanged(PathBuf::from("/srv/assets/showcase.json")))
        );
        assert_eq!(classify(&paths, Path::new("/srv/assets/presets/silk.json~")), None);
        assert_eq!(classify(&paths, Path::new("/srv/assets/notes.json")), None);
    }
}
