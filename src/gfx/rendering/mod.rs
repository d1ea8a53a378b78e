// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The scene talks to a [`RenderBackend`] through [`RenderCommand`]s.
//! [`RenderEngine`] executes them with wgpu; [`HeadlessBackend`] records them
//! without a GPU.

pub mod commands;
pub mod headless;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use commands::{
    DrawCall, MeshHandle, PolygonMode, ProgramKind, RenderBackend, RenderCommand, TextureBinding,
    TextureHandle,
};
pub use headless::HeadlessBackend;
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::{EngineSettings, FrameOverlay, FramePlan, OverlayTarget, RenderEngine};
