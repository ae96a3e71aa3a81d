use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Environment variable that overrides `assets/` discovery.
pub const ASSETS_ENV: &str = "SILKRAYS_ASSETS";

/// A located `assets/` directory holding `showcase.json` and `presets/`.
#[derive(Debug, Clone)]
pub struct AssetsRoot {
    path: PathBuf,
}

impl AssetsRoot {
    /// Locate the `assets/` directory.
    ///
    /// Resolution order:
    /// 1) `SILKRAYS_ASSETS` env var (if set and the directory exists)
    /// 2) Search upward from `start_dir` for a folder named `assets`
    pub fn discover(start_dir: &Path) -> Result<Self, EngineError> {
        if let Ok(p) = std::env::var(ASSETS_ENV) {
            let pb = PathBuf::from(p);
            if pb.is_dir() {
                return Ok(Self { path: pb });
            }
        }
        Self::search_upward(start_dir)
    }

    /// Upward search only, ignoring the environment.
    pub fn search_upward(start_dir: &Path) -> Result<Self, EngineError> {
        let mut cur = start_dir.to_path_buf();
        loop {
            let cand = cur.join("assets");
            if cand.is_dir() {
                return Ok(Self { path: cand });
            }
            if !cur.pop() {
                break;
            }
        }

        Err(EngineError::AssetsNotFound {
            start_dir: start_dir.to_path_buf(),
        })
    }

    /// Use `path` as-is (tests and explicit overrides).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }

    /// Choose OS-specific JSON config if present, otherwise fall back to `<stem>.json`.
    ///
    /// Example: `showcase.macos.json` overrides `showcase.json` on macOS.
    pub fn pick_platform_json(&self, stem: &str) -> PathBuf {
        let os = if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "macos") {
            "macos"
        } else if cfg!(target_os = "linux") {
            "linux"
        } else {
            "other"
        };

        let platform = self.path.join(format!("{stem}.{os}.json"));
        if platform.exists() {
            platform
        } else {
            self.path.join(format!("{stem}.json"))
        }
    }

    /// Resolve a JSON-provided path relative to the assets directory unless it is already absolute.
    pub fn resolve(&self, s: &str) -> PathBuf {
        let p = PathBuf::from(s);
        if p.is_absolute() {
            p
        } else {
            self.path.join(p)
        }
    }
}

/// Read a UTF-8 file into a String.
pub fn read_to_string(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse a JSON file without imposing a shape.
pub fn load_json_value(path: &Path) -> Result<serde_json::Value, EngineError> {
    let s = read_to_string(path)?;
    serde_json::from_str(&s).map_err(|e| EngineError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_assets_in_an_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let root = AssetsRoot::search_upward(&nested).unwrap();
        assert_eq!(root.path(), dir.path().join("assets"));
    }

    #[test]
    fn relative_paths_resolve_under_assets() {
        let root = AssetsRoot::at("/srv/assets");
        assert_eq!(root.resolve("exports"), PathBuf::from("/srv/assets/exports"));
        assert_eq!(root.resolve("/tmp/out"), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn platform_json_falls_back_to_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = AssetsRoot::at(dir.path());
        assert_eq!(root.pick_platform_json("showcase"), dir.path().join("showcase.json"));
    }
}
