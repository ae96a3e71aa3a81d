//! Writes code exports to disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use silkrays_engine::{logi, ExportBundle};

/// Write `bundle` as `<dir>/<ComponentName>.tsx`, replacing any previous export.
pub fn write_bundle(dir: &Path, bundle: &ExportBundle) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating export dir {}", dir.display()))?;
    let path = dir.join(bundle.file_name());
    std::fs::write(&path, &bundle.source).with_context(|| format!("writing {}", path.display()))?;

    logi!("EXPORT", "{} -> {} ({} bytes)", bundle.kind.name(), path.display(), bundle.source.len());
    logi!("EXPORT", "install: {}", bundle.install_command);
    logi!("EXPORT", "usage:   {}", bundle.usage_snippet);
    Ok(path)
}
