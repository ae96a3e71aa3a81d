//! Engine for the silkrays shader showcase.
//!
//! Headless by construction: everything GPU-facing goes through [`gpu::GpuBackend`],
//! with [`gl::GlowBackend`] as the OpenGL implementation.

#[macro_use]
pub mod logging;

pub mod assets;
pub mod codegen;
pub mod color;
pub mod config;
pub mod controls;
pub mod effect;
pub mod error;
pub mod gl;
pub mod gpu;
pub mod pingpong;
pub mod pointer;
pub mod session;
pub mod shaders;
pub mod uniforms;

pub use codegen::{generate_code, ExportBundle};
pub use effect::{EffectConfig, EffectKind, GodRaysConfig, ParamChange, ParamValue, SilkConfig};
pub use error::EngineError;
pub use session::RenderSession;
