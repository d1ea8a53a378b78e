//! Phong materials and per-instance uniforms
//!
//! A [`Material`] is the CPU-side ambient/diffuse/specular/shininess set an
//! object owns. Each draw uploads it inside an [`InstanceUniform`] together
//! with the instance's model matrix. The wgpu side binds instances at group 1
//! ([`InstanceBindings`]) and material maps at group 2 ([`MaterialBindings`]).

use cgmath::{Matrix4, Vector3};
use wgpu::Device;

use crate::{
    gfx::{camera::camera_utils::convert_matrix4_to_array, lighting::light::phong_terms},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::DynamicUniformBuffer,
    },
};

/// Semantic type of a material texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Diffuse,
    Specular,
    Emission,
    Normal,
    Height,
}

impl TextureRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TextureRole::Diffuse => "diffuse",
            TextureRole::Specular => "specular",
            TextureRole::Emission => "emission",
            TextureRole::Normal => "normal",
            TextureRole::Height => "height",
        }
    }

    /// Sampler slot in the material bind group, if the lit shader samples it
    pub fn slot(self) -> Option<usize> {
        match self {
            TextureRole::Diffuse => Some(0),
            TextureRole::Specular => Some(1),
            TextureRole::Emission => Some(2),
            TextureRole::Normal => Some(3),
            TextureRole::Height => None,
        }
    }
}

pub const MATERIAL_TEXTURE_SLOTS: usize = 4;

/// GPU material block (`material.*` in the lit shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    pub use_diffuse_map: u32,
    pub use_specular_map: u32,
    pub use_emission_map: u32,
}

/// Everything that changes per draw call
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceUniform {
    pub model: [[f32; 4]; 4],
    pub material: MaterialUniform,
}
// Total: 64 + 64 = 128 bytes

impl InstanceUniform {
    pub fn new(model: Matrix4<f32>, material: MaterialUniform) -> Self {
        Self {
            model: convert_matrix4_to_array(model),
            material,
        }
    }
}

/// Which material maps are bound for a draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialMaps {
    pub diffuse: bool,
    pub specular: bool,
    pub emission: bool,
}

/// Phong material owned by a renderable object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::from_color(Vector3::new(1.0, 1.0, 1.0), Vector3::new(0.5, 0.5, 0.5), 32.0)
    }
}

impl Material {
    /// Derives ambient and diffuse from a base color the same way lights do
    pub fn from_color(color: Vector3<f32>, specular: Vector3<f32>, shininess: f32) -> Self {
        let (ambient, diffuse) = phong_terms(color);
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        let (ambient, diffuse) = phong_terms(color);
        self.ambient = ambient;
        self.diffuse = diffuse;
    }

    pub fn to_uniform(&self, maps: MaterialMaps) -> MaterialUniform {
        MaterialUniform {
            ambient: self.ambient.extend(1.0).into(),
            diffuse: self.diffuse.extend(1.0).into(),
            specular: self.specular.extend(1.0).into(),
            shininess: self.shininess,
            use_diffuse_map: maps.diffuse as u32,
            use_specular_map: maps.specular as u32,
            use_emission_map: maps.emission as u32,
        }
    }
}

pub type InstanceUBO = DynamicUniformBuffer<InstanceUniform>;

/// Group 1 binding: the per-draw instance block with a dynamic offset
pub struct InstanceBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl InstanceBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic::<InstanceUniform>())
            .create(device, "Instance Bind Group");

        InstanceBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &Device, ubo: &InstanceUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Instance Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

/// Group 2 layout: diffuse, specular, emission and normal maps plus one sampler
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group");

        MaterialBindings { bind_group_layout }
    }

    /// Builds a bind group over one view per slot (in [`TextureRole::slot`] order)
    pub fn create_bind_group(
        &self,
        device: &Device,
        views: [&wgpu::TextureView; MATERIAL_TEXTURE_SLOTS],
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        let mut builder = BindGroupBuilder::new(&self.bind_group_layout);
        for view in views {
            builder = builder.texture(view);
        }
        builder.sampler(sampler).create(device, "Material Bind Group")
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_derives_terms_from_color() {
        let material =
            Material::from_color(Vector3::new(1.0, 0.5, 0.0), Vector3::new(0.5, 0.5, 0.5), 32.0);
        assert_eq!(material.diffuse, Vector3::new(0.5, 0.25, 0.0));
        assert!((material.ambient.x - 0.1).abs() < 1e-6);
        assert!((material.ambient.y - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_material_uniform_flags() {
        let uniform = Material::default().to_uniform(MaterialMaps {
            diffuse: true,
            specular: false,
            emission: true,
        });
        assert_eq!(uniform.use_diffuse_map, 1);
        assert_eq!(uniform.use_specular_map, 0);
        assert_eq!(uniform.use_emission_map, 1);
        assert_eq!(uniform.shininess, 32.0);
        assert_eq!(std::mem::size_of::<InstanceUniform>(), 128);
    }

    #[test]
    fn test_texture_role_slots() {
        assert_eq!(TextureRole::Diffuse.slot(), Some(0));
        assert_eq!(TextureRole::Normal.slot(), Some(3));
        assert_eq!(TextureRole::Height.slot(), None);
    }
}
