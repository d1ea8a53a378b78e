//! Per-frame uniform blocks shared by every object in a frame
//!
//! [`FrameUniform`] carries the camera and timing values, [`LightsUniform`]
//! the full light set. Both MUST match the `Frame` and `Lights` structs in
//! `shaders/*.wgsl` exactly. [`GlobalBindings`] binds them at group 0 with
//! dynamic offsets, so one buffer serves every program switch in a frame.

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::DynamicUniformBuffer,
};

/// Camera and timing values (`view`, `projection`, `viewPos`, `iTime`, `iResolution`)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Camera position (homogeneous, w = 1)
    pub view_pos: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub _padding: f32,
}
// Total: 64 + 64 + 16 + 8 + 4 + 4 = 160 bytes

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub _padding: f32,
}
// Total: 64 + 16 = 80 bytes, a valid uniform array stride

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Cosine of the inner cone angle
    pub cutoff: f32,
    /// Cosine of the outer cone angle
    pub outer_cutoff: f32,
    pub _padding: [f32; 3],
}
// Total: 80 + 16 + 16 = 112 bytes

pub const MAX_POINT_LIGHTS: usize = 4;

/// The whole light set as the lit shader consumes it
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// The ad-hoc main light (a point light)
    pub light: PointLightUniform,
    pub dir_light: DirLightUniform,
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub spot_light: SpotLightUniform,
}
// Total: 80 + 64 + 320 + 112 = 576 bytes

pub type FrameUBO = DynamicUniformBuffer<FrameUniform>;
pub type LightsUBO = DynamicUniformBuffer<LightsUniform>;

/// Group 0 bindings: frame uniforms (binding 0) and lights (binding 1)
///
/// Both use dynamic offsets; the bind group has to be recreated whenever
/// either buffer grows.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic::<FrameUniform>())
            .next_binding_fragment(binding_types::uniform_dynamic::<LightsUniform>())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(
        &mut self,
        device: &wgpu::Device,
        frame: &FrameUBO,
        lights: &LightsUBO,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(frame.binding_resource())
                .resource(lights.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// `None` until [`Self::create_bind_group`] has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}
