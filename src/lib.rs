// src/lib.rs
//! Phong Sandbox
//!
//! An interactive Phong-lighting sandbox built on wgpu, winit and Dear ImGui:
//! a fly camera, procedurally generated cubes and spheres, imported OBJ models
//! and a live-tunable light set with shader hot reload.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::SandboxApp;
pub use config::SandboxConfig;

