//! # Vertex Data Structures
//!
//! GPU-compatible vertex formats for the sandbox meshes. Each format builds its
//! own [`wgpu::VertexBufferLayout`] from the struct's field offsets, so the
//! layout and the struct cannot drift apart.

use std::mem::{offset_of, size_of};

/// A lit-mesh vertex: position, per-vertex color, texture coordinates and normal.
///
/// Used by the cube, sphere, grid and imported model meshes.
///
/// # Memory Layout
///
/// `#[repr(C)]`, 11 tightly packed floats (44 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex3D, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex3D, color) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex3D, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex3D, normal) as wgpu::BufferAddress,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x3,
        },
    ];

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Location 0: position (Float32x3)
    /// - Location 1: color (Float32x3)
    /// - Location 2: tex_coords (Float32x2)
    /// - Location 3: normal (Float32x3)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A colored line vertex for the axes gizmo.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            offset: offset_of!(LineVertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(LineVertex, color) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex data handed to a backend for upload.
#[derive(Debug, Clone, Copy)]
pub enum VertexData<'a> {
    Lit(&'a [Vertex3D]),
    Lines(&'a [LineVertex]),
}

impl VertexData<'_> {
    pub fn len(&self) -> usize {
        match self {
            VertexData::Lit(vertices) => vertices.len(),
            VertexData::Lines(vertices) => vertices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexData::Lit(vertices) => bytemuck::cast_slice(vertices),
            VertexData::Lines(vertices) => bytemuck::cast_slice(vertices),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex3d_layout_matches_struct() {
        let layout = Vertex3D::desc();
        assert_eq!(layout.array_stride, 44);
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32]);
        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset + last.format.size(), layout.array_stride);
    }

    #[test]
    fn test_line_vertex_layout_matches_struct() {
        let layout = LineVertex::desc();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes[1].offset, 12);
    }

    #[test]
    fn test_vertex_data_bytes() {
        let vertices = [Vertex3D::default(); 3];
        let data = VertexData::Lit(&vertices);
        assert_eq!(data.len(), 3);
        assert_eq!(data.as_bytes().len(), 3 * 44);
    }
}
