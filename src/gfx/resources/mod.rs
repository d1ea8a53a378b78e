// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Uniform blocks, bind groups and textures for rendering.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{FrameUniform, GlobalBindings, LightsUniform};
pub use material::{InstanceUniform, Material, MaterialUniform, TextureRole};
pub use texture_resource::TextureResource;
