//! # Procedural Geometry Generation
//!
//! Pure functions producing the sandbox's built-in meshes, so no model files
//! are needed for the basic shapes.
//!
//! ## Supported Primitives
//!
//! - **Cube**: unit cube with per-face colors, UVs and normals
//! - **Sphere**: latitude/longitude (UV) sphere with configurable resolution
//! - **Axes**: three colored line segments for the coordinate gizmo
//! - **Grid**: the ground quad used by the debug grid shader
//!
//! ## Usage
//!
//! ```rust
//! use phong_sandbox::gfx::geometry::{generate_cube, generate_sphere};
//!
//! let cube = generate_cube();
//! assert_eq!(cube.vertex_count(), 24);
//!
//! let sphere = generate_sphere(0.5, 36, 18).unwrap();
//! assert_eq!(sphere.triangle_count(), 36 * (2 * 18 - 2));
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::{LineVertex, Vertex3D};

/// Generated geometry ready for GPU upload, stored as parallel attribute arrays
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Per-vertex colors (r, g, b)
    pub colors: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding); empty for line geometry
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves the attribute arrays into lit vertices.
    ///
    /// Missing attributes fall back to white, (0, 0) and +Y respectively.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                color: self.colors.get(i).copied().unwrap_or([1.0, 1.0, 1.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }

    pub fn to_line_vertices(&self) -> Vec<LineVertex> {
        (0..self.vertices.len())
            .map(|i| LineVertex {
                position: self.vertices[i],
                color: self.colors.get(i).copied().unwrap_or([1.0, 1.0, 1.0]),
            })
            .collect()
    }
}
