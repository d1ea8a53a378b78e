//! # Graphics Module
//!
//! Everything between the window and the GPU: the fly camera, procedural
//! geometry, Phong lights, the lit scene and the wgpu backend that draws it.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - Euler-angle fly camera and its input controller
//! - **Geometry** ([`geometry`]) - Cube, UV sphere, axes and grid generators
//! - **Lighting** ([`lighting`]) - Directional, point and spot lights
//! - **Scene** ([`scene`]) - Renderables and the per-frame tick
//! - **Rendering** ([`rendering`]) - Command stream, wgpu engine, headless backend
//! - **Resources** ([`resources`]) - Uniform blocks, bind groups and textures
//!
//! The scene only ever submits [`rendering::RenderCommand`]s, so the same
//! frame loop runs against [`RenderEngine`] in the app and against
//! [`rendering::HeadlessBackend`] in tests.

pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
