use std::{fmt, path::PathBuf};

use crate::effect::EffectKind;

#[derive(Debug)]
pub enum EngineError {
    /// The `assets/` folder could not be found or was invalid.
    AssetsNotFound { start_dir: PathBuf },
    /// I/O error reading a file.
    Io { path: PathBuf, source: std::io::Error },
    /// JSON parse error for a file.
    Json { path: PathBuf, source: serde_json::Error },
    /// JSON-to-typed deserialization error (when the JSON is already parsed).
    JsonValue { path: PathBuf, source: serde_json::Error },
    /// Config is syntactically valid but semantically invalid.
    InvalidConfig { path: PathBuf, msg: String },

    /// A color string that is not `#RRGGBB`.
    MalformedColor { input: String },
    /// A numeric parameter that is NaN, infinite or negative.
    InvalidParam { field: &'static str, value: f32 },
    /// A parameter change addressed to the other effect.
    EffectMismatch { session: EffectKind, change: EffectKind },

    /// The drawable surface could not provide a usable rendering context.
    UnsupportedContext(String),
    /// A GL object (texture, framebuffer, program, ...) could not be created.
    GlCreate(String),
    VertexCompile { program: &'static str, log: String },
    FragmentCompile { program: &'static str, log: String },
    Link { program: &'static str, log: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AssetsNotFound { start_dir } => {
                write!(f, "Could not locate assets/ starting from {}", start_dir.display())
            }
            EngineError::Io { path, source } => {
                write!(f, "I/O error for {}: {}", path.display(), source)
            }
            EngineError::Json { path, source } => {
                write!(f, "JSON parse error for {}: {}", path.display(), source)
            }
            EngineError::JsonValue { path, source } => {
                write!(f, "JSON deserialize error for {}: {}", path.display(), source)
            }
            EngineError::InvalidConfig { path, msg } => {
                write!(f, "Invalid config {}: {}", path.display(), msg)
            }
            EngineError::MalformedColor { input } => {
                write!(f, "malformed color {input:?} (expected #RRGGBB)")
            }
            EngineError::InvalidParam { field, value } => {
                write!(f, "invalid value {value} for {field} (must be finite and non-negative)")
            }
            EngineError::EffectMismatch { session, change } => {
                write!(f, "{} parameter sent to a {} session", change.name(), session.name())
            }
            EngineError::UnsupportedContext(msg) => {
                write!(f, "unsupported rendering context: {msg}")
            }
            EngineError::GlCreate(msg) => write!(f, "GL object creation failed: {msg}"),
            EngineError::VertexCompile { program, log } => {
                write!(f, "vertex shader compile error ({program}):\n{log}")
            }
            EngineError::FragmentCompile { program, log } => {
                write!(f, "fragment shader compile error ({program}):\n{log}")
            }
            EngineError::Link { program, log } => {
                write!(f, "program link error ({program}):\n{log}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io { source, .. } => Some(source),
            EngineError::Json { source, .. } => Some(source),
            EngineError::JsonValue { source, .. } => Some(source),
            _ => None,
        }
    }
}
