// src/error.rs
//! Error types shared across the sandbox
//!
//! Startup code wraps these in `anyhow`; the per-frame path logs them and
//! moves on to the next object.

use std::path::PathBuf;

use crate::gfx::rendering::commands::{MeshHandle, ProgramKind};

/// Invalid input to a procedural mesh generator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LightingError {
    #[error("unknown attenuation preset {index} (table has {available} entries)")]
    UnknownAttenuationPreset { index: usize, available: usize },
}

/// Shader source could not be read or did not compile
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program:?} program failed to compile: {message}")]
    Compile { program: ProgramKind, message: String },
}

/// An external asset (model or texture) could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import model {path}: {message}")]
    Import { path: PathBuf, message: String },
    #[error("failed to load texture {path}: {message}")]
    Texture { path: PathBuf, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A render command referenced a resource the backend cannot honor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown mesh {0:?}")]
    UnknownMesh(MeshHandle),
    #[error("mesh {0:?} was already released")]
    ReleasedMesh(MeshHandle),
    #[error("{0:?} program is not available")]
    ProgramUnavailable(ProgramKind),
}
